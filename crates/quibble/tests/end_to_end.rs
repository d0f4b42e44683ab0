use approx::assert_abs_diff_eq;
use quibble::{Expr, Problem, QuibbleError, Solver};
use quibble_nlp::NlpError;

#[test]
fn test_lower_constraint_becomes_active() {
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", 0.0, 10.0, None).unwrap();
    problem.add_constraint(&x, 3.0, f64::INFINITY, Some("floor"), None).unwrap();
    problem.add_objective(&x, None, None);

    let mut solver = Solver::new("auglag").unwrap().with_seed(3).with_problem(&mut problem);
    let report = solver.start(1, None).unwrap();
    assert!(report.is_solved());
    drop(solver);

    let result = problem.result().unwrap();
    assert_abs_diff_eq!(result.optimal_decision_variables(None)[0], 3.0, epsilon = 1e-6);
    assert_eq!(result.active_lower_bounds_constraints(None), vec![true]);
    assert_eq!(result.active_upper_bounds_constraints(None), vec![false]);
    assert_eq!(result.active_lower_bounds_decision_variables(None), vec![false]);
    assert!(result.active_lower_bounds_constraints_by_name(None)["floor"]);
}

#[test]
fn test_objective_sum_matches_engine_objective() {
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", -5.0, 5.0, Some("plant")).unwrap();
    let y = problem.add_decision_variable("y", -5.0, 5.0, Some("plant")).unwrap();
    problem.add_objective((&x - 1.0).powi(2), Some("fit_x"), Some("fit"));
    problem.add_objective((&y - 2.0).powi(2), Some("fit_y"), Some("fit"));
    problem.add_constraint(&x + &y, f64::NEG_INFINITY, 2.0, Some("budget"), None).unwrap();

    let mut solver = Solver::new("auglag").unwrap().with_seed(5).with_problem(&mut problem);
    solver.start(2, None).unwrap();
    let engine_objective = solver.solution().unwrap().f;
    let lam_g = solver.solution().unwrap().lam_g.clone();
    drop(solver);

    let result = problem.result().unwrap();
    let sum: f64 = result.optimal_objective_values(None).iter().sum();
    assert_abs_diff_eq!(sum, result.optimal_objective_sum(None), epsilon = 1e-9);
    assert_abs_diff_eq!(result.optimal_objective_sum(None), engine_objective, epsilon = 1e-9);
    assert_abs_diff_eq!(result.optimal_objective_sum(Some("fit")), 0.5, epsilon = 1e-5);

    let vars = result.optimal_decision_variables_by_name(Some("plant"));
    assert_abs_diff_eq!(vars["x"], 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(vars["y"], 1.5, epsilon = 1e-5);
    assert_eq!(result.active_upper_bounds_constraints(None), vec![true]);
    // Upper side of the budget is active, so its multiplier is positive
    assert_abs_diff_eq!(lam_g[0], 1.0, epsilon = 1e-4);
}

#[test]
fn test_nonlinear_constraint() {
    // min x^2 + y^2 subject to x * y >= 1
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", 0.1, 10.0, None).unwrap();
    let y = problem.add_decision_variable("y", 0.1, 10.0, None).unwrap();
    problem.add_objective(Expr::symbol(&x).powi(2) + Expr::symbol(&y).powi(2), None, None);
    problem.add_constraint(&x * &y, 1.0, f64::INFINITY, Some("area"), None).unwrap();

    let mut solver = Solver::new("auglag").unwrap().with_seed(17).with_problem(&mut problem);
    let report = solver.start(2, Some(&[2.0, 0.7][..])).unwrap();
    assert!(report.is_solved());
    drop(solver);

    let result = problem.result().unwrap();
    let values = result.optimal_decision_variables(None);
    assert_abs_diff_eq!(values[0], 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(values[1], 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(result.optimal_objective_sum(None), 2.0, epsilon = 1e-5);
    assert_eq!(result.active_lower_bounds_constraints(None), vec![true]);
}

#[test]
fn test_problem_solve_convenience() {
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", f64::NEG_INFINITY, f64::INFINITY, None).unwrap();
    let e = problem.parse("(x - 4) ^ 2 + 1").unwrap();
    problem.add_objective(e, None, None);
    problem.add_constraint(&x, f64::NEG_INFINITY, 10.0, None, None).unwrap();

    let result = problem.solve(3, Some(&[0.0][..])).unwrap().unwrap();
    assert_abs_diff_eq!(result.optimal_decision_variables(None)[0], 4.0, epsilon = 1e-5);
    assert_abs_diff_eq!(result.optimal_objective_sum(None), 1.0, epsilon = 1e-8);
    assert!(problem.is_solved());
}

#[test]
fn test_infeasible_problem_is_reported_not_raised() {
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", f64::NEG_INFINITY, f64::INFINITY, None).unwrap();
    problem.add_constraint(&x, f64::NEG_INFINITY, 1.0, None, None).unwrap();
    problem.add_constraint(&x, 5.0, f64::INFINITY, None, None).unwrap();
    problem.add_objective(&x, None, None);

    let outcome = problem.solve(2, Some(&[0.0][..])).unwrap();
    assert!(outcome.is_none());
    assert!(!problem.is_solved());
}

#[test]
fn test_unknown_solver_name() {
    let mut problem = Problem::default();
    problem.add_decision_variable("x", 0.0, 1.0, None).unwrap();
    problem.set_solver_name("ipopt");
    assert!(matches!(
        problem.solve(1, None),
        Err(QuibbleError::NotSupported(ref name)) if name == "ipopt"
    ));
}

#[test]
fn test_rejected_option_surfaces_as_engine_error() {
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", 0.0, 1.0, None).unwrap();
    problem.add_objective(&x, None, None);
    problem.add_solver_options(Some("auglag"), [("linear_solver", "mumps")]);
    assert!(matches!(
        problem.solve(1, None),
        Err(QuibbleError::Engine(NlpError::InvalidOption { .. }))
    ));
}

#[test]
fn test_options_reach_the_engine() {
    let mut problem = Problem::default();
    let x = problem.add_decision_variable("x", 0.0, 10.0, None).unwrap();
    problem.add_constraint(&x, 3.0, f64::INFINITY, None, None).unwrap();
    problem.add_objective(&x, None, None);
    // One outer iteration cannot close the penalty gap
    problem.add_solver_options(Some("auglag"), [("max_iter", 1)]);

    let mut solver = Solver::new("auglag").unwrap().with_seed(1).with_problem(&mut problem);
    let report = solver.start(1, None).unwrap();
    assert!(!report.is_solved());
    assert_eq!(report.outcomes[0].iterations, 1);
}

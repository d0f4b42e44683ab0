use std::time::Instant;

use log::{debug, info, trace};
use quibble_expr::Function;

use crate::engine::{Engine, EngineHandle, NlpError};
use crate::options::{OptionKey, OptionValue, SolverOptions};
use crate::problem::{InvokeArgs, Nlp};
use crate::projected::{self, Bounds, Smooth, StepStrategy, Termination};
use crate::solution::{EngineOutput, ReturnStatus};

/// Option namespace of the augmented Lagrangian engine.
pub const PREFIX: &str = "auglag";

/// Tunables of [`AugLagSolver`], read from `auglag.*` options plus the bare
/// `print_time` flag.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AugLagSettings {
    /// Outer (multiplier update) iterations
    pub max_iter: usize,
    /// Projected gradient iterations per subproblem
    pub inner_max_iter: usize,
    /// Stationarity and complementarity tolerance
    pub tol: f64,
    pub constr_viol_tol: f64,
    pub acceptable_tol: f64,
    pub acceptable_constr_viol_tol: f64,
    /// Initial penalty parameter
    pub mu_init: f64,
    pub mu_max: f64,
    /// Penalty growth factor when the violation does not halve
    pub mu_growth: f64,
    /// 0 is silent; 5 logs outer iterations, 8 and above logs inner iterations
    pub print_level: i64,
    pub suppress_all_output: bool,
    pub print_time: bool,
    pub step_strategy: StepStrategy,
}

impl Default for AugLagSettings {
    fn default() -> Self {
        Self {
            max_iter: 100,
            inner_max_iter: 3000,
            tol: 1e-8,
            constr_viol_tol: 1e-8,
            acceptable_tol: 1e-6,
            acceptable_constr_viol_tol: 1e-6,
            mu_init: 10.0,
            mu_max: 1e12,
            mu_growth: 10.0,
            print_level: 0,
            suppress_all_output: false,
            print_time: false,
            step_strategy: StepStrategy::BarzilaiBorwein,
        }
    }
}

fn invalid(key: &OptionKey, reason: impl Into<String>) -> NlpError {
    NlpError::InvalidOption {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn expect_real(key: &OptionKey, value: &OptionValue) -> Result<f64, NlpError> {
    value
        .as_real()
        .ok_or_else(|| invalid(key, format!("expected a number, found {}", value.type_name())))
}

fn expect_positive(key: &OptionKey, value: &OptionValue) -> Result<f64, NlpError> {
    match expect_real(key, value)? {
        v if v > 0.0 => Ok(v),
        v => Err(invalid(key, format!("must be positive, found {v}"))),
    }
}

fn expect_count(key: &OptionKey, value: &OptionValue) -> Result<usize, NlpError> {
    let i = value
        .as_int()
        .ok_or_else(|| invalid(key, format!("expected an integer, found {}", value.type_name())))?;
    usize::try_from(i).map_err(|_| invalid(key, format!("must be non-negative, found {i}")))
}

/// Accepts a bool or the strings `yes` / `no`.
fn expect_flag(key: &OptionKey, value: &OptionValue) -> Result<bool, NlpError> {
    match value {
        OptionValue::Bool(b) => Ok(*b),
        OptionValue::Text(s) if s == "yes" => Ok(true),
        OptionValue::Text(s) if s == "no" => Ok(false),
        other => Err(invalid(key, format!("expected 'yes', 'no' or a bool, found {other}"))),
    }
}

impl AugLagSettings {
    /// Apply `options` over the defaults.
    ///
    /// Unknown keys, keys under a foreign prefix, and values of the wrong type
    /// are rejected.
    pub fn from_options(options: &SolverOptions) -> Result<Self, NlpError> {
        let mut settings = Self::default();
        for (key, value) in options.iter() {
            match (key.prefix(), key.name()) {
                (None, "print_time") => {
                    settings.print_time = value
                        .as_bool()
                        .ok_or_else(|| invalid(key, "expected a bool"))?;
                }
                (Some(PREFIX), "max_iter") => settings.max_iter = expect_count(key, value)?,
                (Some(PREFIX), "inner_max_iter") => {
                    settings.inner_max_iter = expect_count(key, value)?
                }
                (Some(PREFIX), "tol") => settings.tol = expect_positive(key, value)?,
                (Some(PREFIX), "constr_viol_tol") => {
                    settings.constr_viol_tol = expect_positive(key, value)?
                }
                (Some(PREFIX), "acceptable_tol") => {
                    settings.acceptable_tol = expect_positive(key, value)?
                }
                (Some(PREFIX), "acceptable_constr_viol_tol") => {
                    settings.acceptable_constr_viol_tol = expect_positive(key, value)?
                }
                (Some(PREFIX), "mu_init") => settings.mu_init = expect_positive(key, value)?,
                (Some(PREFIX), "mu_max") => settings.mu_max = expect_positive(key, value)?,
                (Some(PREFIX), "mu_growth") => match expect_real(key, value)? {
                    g if g > 1.0 => settings.mu_growth = g,
                    g => return Err(invalid(key, format!("must exceed 1, found {g}"))),
                },
                (Some(PREFIX), "print_level") => match value.as_int() {
                    Some(level @ 0..=12) => settings.print_level = level,
                    _ => return Err(invalid(key, format!("expected an integer in 0..=12, found {value}"))),
                },
                (Some(PREFIX), "suppress_all_output") => {
                    settings.suppress_all_output = expect_flag(key, value)?
                }
                (Some(PREFIX), "step_strategy") => {
                    settings.step_strategy = value
                        .as_text()
                        .and_then(StepStrategy::from_name)
                        .ok_or_else(|| {
                            invalid(key, format!("expected 'barzilai_borwein' or 'fixed', found {value}"))
                        })?;
                }
                _ => return Err(invalid(key, "unknown option")),
            }
        }
        if settings.mu_init > settings.mu_max {
            return Err(NlpError::InvalidOption {
                key: format!("{PREFIX}.mu_init"),
                reason: format!("exceeds {PREFIX}.mu_max ({})", settings.mu_max),
            });
        }
        Ok(settings)
    }

    fn logs_summary(&self) -> bool {
        !self.suppress_all_output && self.print_level >= 1
    }

    fn logs_outer(&self) -> bool {
        !self.suppress_all_output && self.print_level >= 5
    }

    fn logs_inner(&self) -> bool {
        !self.suppress_all_output && self.print_level >= 8
    }
}

/// The augmented Lagrangian engine family, registered as `auglag`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AugLag;

impl Engine for AugLag {
    fn name(&self) -> &str {
        PREFIX
    }

    fn instantiate(
        &self,
        nlp: &Nlp,
        options: &SolverOptions,
    ) -> Result<Box<dyn EngineHandle>, NlpError> {
        let settings = AugLagSettings::from_options(options)?;
        Ok(Box::new(AugLagSolver::new(nlp)?.with_settings(settings)))
    }
}

/// Augmented Lagrangian solver for general NLPs with box and two-sided
/// constraint bounds.
///
/// Each outer iteration minimizes the Powell-Hestenes-Rockafellar augmented
/// Lagrangian over the variable box with projected gradient descent, then
/// updates one multiplier per finite constraint side. The penalty grows
/// whenever the violation fails to halve.
///
/// Derivatives are exact: the gradient of the objective and the nonzero
/// entries of the constraint Jacobian are differentiated symbolically and
/// compiled once at construction.
pub struct AugLagSolver {
    settings: AugLagSettings,
    n: usize,
    objective: Function,
    gradient: Vec<Function>,
    constraints: Vec<Function>,
    /// Per constraint, the variables it depends on with their partials
    jacobian: Vec<Vec<(usize, Function)>>,
}

impl AugLagSolver {
    pub fn new(nlp: &Nlp) -> Result<Self, NlpError> {
        let x = &nlp.x;
        let objective = Function::new(x, &nlp.f)?;
        let gradient = nlp
            .f
            .gradient(x)
            .iter()
            .map(|d| Function::new(x, d))
            .collect::<Result<Vec<_>, _>>()?;
        let constraints = nlp
            .g
            .iter()
            .map(|g| Function::new(x, g))
            .collect::<Result<Vec<_>, _>>()?;
        let jacobian = nlp
            .g
            .iter()
            .map(|g| {
                x.iter()
                    .enumerate()
                    .filter(|(_, s)| g.depends_on(s))
                    .map(|(i, s)| Ok((i, Function::new(x, &g.diff(s))?)))
                    .collect::<Result<Vec<_>, NlpError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            settings: AugLagSettings::default(),
            n: x.len(),
            objective,
            gradient,
            constraints,
            jacobian,
        })
    }

    pub fn with_settings(mut self, settings: AugLagSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.settings.max_iter = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.settings.tol = tol;
        self
    }

    pub fn settings(&self) -> &AugLagSettings {
        &self.settings
    }

    fn m(&self) -> usize {
        self.constraints.len()
    }

    fn objective_value(&self, x: &[f64]) -> f64 {
        call(&self.objective, x)
    }

    fn constraint_values(&self, x: &[f64]) -> Vec<f64> {
        self.constraints.iter().map(|c| call(c, x)).collect()
    }

    /// `grad f(x) + J(x)' w`
    fn lagrangian_gradient(&self, x: &[f64], w: &[f64]) -> Vec<f64> {
        let mut grad: Vec<f64> = self.gradient.iter().map(|d| call(d, x)).collect();
        for (row, wj) in self.jacobian.iter().zip(w) {
            if *wj == 0.0 {
                continue;
            }
            for (i, d) in row {
                grad[*i] += wj * call(d, x);
            }
        }
        grad
    }

    /// Solve from `args.x0`.
    pub fn solve(&self, args: &InvokeArgs<'_>) -> EngineOutput {
        let started = Instant::now();
        let output = self.run(args);
        if self.settings.logs_summary() {
            info!(
                "auglag: {} after {} iterations, f = {:.8e}",
                output.status, output.iterations, output.f
            );
        }
        if self.settings.print_time {
            info!("auglag: solve time {:.3?}", started.elapsed());
        }
        output
    }

    fn run(&self, args: &InvokeArgs<'_>) -> EngineOutput {
        let (n, m) = (self.n, self.m());
        if let Err(reason) = args.validate(n, m) {
            if !self.settings.suppress_all_output {
                debug!("auglag: rejected invocation: {reason}");
            }
            return EngineOutput::rejected(args.x0, n, m);
        }

        let s = &self.settings;
        let bounds = Bounds {
            lower: args.lbx,
            upper: args.ubx,
        };
        let inner = projected::Settings {
            max_iter: s.inner_max_iter,
            tol: s.tol,
            strategy: s.step_strategy,
        };

        // Non-finite guess entries restart from the origin, then the box
        let mut x: Vec<f64> = args
            .x0
            .iter()
            .map(|v| if v.is_finite() { *v } else { 0.0 })
            .collect();
        bounds.project(&mut x);

        let mut mu_upper = vec![0.0; m];
        let mut mu_lower = vec![0.0; m];
        let mut rho = s.mu_init;
        let mut previous_violation = f64::INFINITY;
        let mut last = Measures::unconverged();

        for iteration in 1..=s.max_iter {
            let subproblem = Subproblem {
                solver: self,
                lbg: args.lbg,
                ubg: args.ubg,
                mu_upper: &mu_upper,
                mu_lower: &mu_lower,
                rho,
            };
            let outcome = projected::minimize(&subproblem, &bounds, x, &inner);
            x = outcome.x;

            if self.settings.logs_inner() {
                trace!(
                    "auglag: subproblem {:?} after {} steps, stationarity {:.3e}",
                    outcome.termination, outcome.iterations, outcome.stationarity
                );
            }

            let g = self.constraint_values(&x);
            if outcome.termination == Termination::NonFinite || g.iter().any(|c| !c.is_finite()) {
                return self.finish(x, g, vec![0.0; m], ReturnStatus::InvalidNumberDetected, iteration);
            }

            for j in 0..m {
                let (c, l, u) = (g[j], args.lbg[j], args.ubg[j]);
                if u.is_finite() {
                    mu_upper[j] = (mu_upper[j] + rho * (c - u)).max(0.0);
                }
                if l.is_finite() {
                    mu_lower[j] = (mu_lower[j] + rho * (l - c)).max(0.0);
                }
            }

            let measures = Measures::at(&g, args.lbg, args.ubg, &mu_upper, &mu_lower, outcome.stationarity);

            if self.settings.logs_outer() {
                debug!(
                    "auglag: iter {:>3}  f = {:>14.8e}  viol = {:.3e}  stat = {:.3e}  compl = {:.3e}  rho = {:.1e}",
                    iteration,
                    self.objective_value(&x),
                    measures.violation,
                    measures.stationarity,
                    measures.complementarity,
                    rho
                );
            }

            let lam_g: Vec<f64> = mu_upper.iter().zip(&mu_lower).map(|(u, l)| u - l).collect();

            if measures.within(s.tol, s.constr_viol_tol) {
                return self.finish(x, g, lam_g, ReturnStatus::SolveSucceeded, iteration);
            }

            if measures.violation > s.constr_viol_tol {
                let stalled = measures.violation > 0.5 * previous_violation;
                if stalled && rho >= s.mu_max {
                    let status = if measures.within(s.acceptable_tol, s.acceptable_constr_viol_tol) {
                        ReturnStatus::SolvedToAcceptableLevel
                    } else {
                        ReturnStatus::InfeasibleProblemDetected
                    };
                    return self.finish(x, g, lam_g, status, iteration);
                }
                if stalled {
                    rho = (rho * s.mu_growth).min(s.mu_max);
                }
            }
            previous_violation = measures.violation;
            last = measures;
        }

        let g = self.constraint_values(&x);
        let lam_g: Vec<f64> = mu_upper.iter().zip(&mu_lower).map(|(u, l)| u - l).collect();
        let status = if last.within(s.acceptable_tol, s.acceptable_constr_viol_tol) {
            ReturnStatus::SolvedToAcceptableLevel
        } else {
            ReturnStatus::MaximumIterationsExceeded
        };
        self.finish(x, g, lam_g, status, s.max_iter)
    }

    /// Assemble the output; bound multipliers follow from stationarity of the
    /// Lagrangian, `lam_x = -(grad f + J' lam_g)`.
    fn finish(
        &self,
        x: Vec<f64>,
        g: Vec<f64>,
        lam_g: Vec<f64>,
        status: ReturnStatus,
        iterations: usize,
    ) -> EngineOutput {
        let lam_x: Vec<f64> = self
            .lagrangian_gradient(&x, &lam_g)
            .into_iter()
            .map(|v| if v.is_finite() { -v } else { 0.0 })
            .collect();
        EngineOutput {
            f: self.objective_value(&x),
            x,
            lam_x,
            lam_g,
            g,
            success: status.is_success(),
            status,
            iterations,
        }
    }
}

impl EngineHandle for AugLagSolver {
    fn invoke(&mut self, args: &InvokeArgs<'_>) -> EngineOutput {
        self.solve(args)
    }
}

/// The arity of every compiled function equals the variable count, which
/// `InvokeArgs::validate` has already checked.
fn call(f: &Function, x: &[f64]) -> f64 {
    f.call(x).unwrap_or(f64::NAN)
}

/// Convergence measures after a multiplier update
struct Measures {
    violation: f64,
    stationarity: f64,
    complementarity: f64,
}

impl Measures {
    fn unconverged() -> Self {
        Self {
            violation: f64::INFINITY,
            stationarity: f64::INFINITY,
            complementarity: f64::INFINITY,
        }
    }

    fn at(
        g: &[f64],
        lbg: &[f64],
        ubg: &[f64],
        mu_upper: &[f64],
        mu_lower: &[f64],
        stationarity: f64,
    ) -> Self {
        let mut violation = 0.0_f64;
        let mut complementarity = 0.0_f64;
        for j in 0..g.len() {
            let (c, l, u) = (g[j], lbg[j], ubg[j]);
            violation = violation.max(c - u).max(l - c);
            if u.is_finite() {
                complementarity = complementarity.max(mu_upper[j].min((u - c).max(0.0)));
            }
            if l.is_finite() {
                complementarity = complementarity.max(mu_lower[j].min((c - l).max(0.0)));
            }
        }
        Self {
            violation,
            stationarity,
            complementarity,
        }
    }

    fn within(&self, tol: f64, constr_viol_tol: f64) -> bool {
        self.violation <= constr_viol_tol && self.stationarity <= tol && self.complementarity <= tol
    }
}

/// Augmented Lagrangian with the multipliers and penalty held fixed
struct Subproblem<'a> {
    solver: &'a AugLagSolver,
    lbg: &'a [f64],
    ubg: &'a [f64],
    mu_upper: &'a [f64],
    mu_lower: &'a [f64],
    rho: f64,
}

impl Subproblem<'_> {
    /// Shifted violations `max(0, c - u + mu_u / rho)` and `max(0, l - c + mu_l / rho)`.
    fn shifts(&self, j: usize, c: f64) -> (f64, f64) {
        let (l, u) = (self.lbg[j], self.ubg[j]);
        let upper = if u.is_finite() {
            (c - u + self.mu_upper[j] / self.rho).max(0.0)
        } else {
            0.0
        };
        let lower = if l.is_finite() {
            (l - c + self.mu_lower[j] / self.rho).max(0.0)
        } else {
            0.0
        };
        (upper, lower)
    }

    fn penalty(&self, g: &[f64]) -> f64 {
        let rho = self.rho;
        g.iter()
            .enumerate()
            .map(|(j, c)| {
                let (upper, lower) = self.shifts(j, *c);
                let mu2 = self.mu_upper[j].powi(2) + self.mu_lower[j].powi(2);
                0.5 * rho * (upper * upper + lower * lower) - mu2 / (2.0 * rho)
            })
            .sum()
    }
}

impl Smooth for Subproblem<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        let g = self.solver.constraint_values(x);
        self.solver.objective_value(x) + self.penalty(&g)
    }

    fn value_and_gradient(&self, x: &[f64]) -> (f64, Vec<f64>) {
        let g = self.solver.constraint_values(x);
        let value = self.solver.objective_value(x) + self.penalty(&g);
        let w: Vec<f64> = g
            .iter()
            .enumerate()
            .map(|(j, c)| {
                let (upper, lower) = self.shifts(j, *c);
                self.rho * (upper - lower)
            })
            .collect();
        (value, self.solver.lagrangian_gradient(x, &w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use quibble_expr::{Expr, Symbol};

    const INF: f64 = f64::INFINITY;

    fn solve(nlp: &Nlp, x0: &[f64], lbx: &[f64], ubx: &[f64], lbg: &[f64], ubg: &[f64]) -> EngineOutput {
        let solver = AugLagSolver::new(nlp).unwrap();
        solver.solve(&InvokeArgs { x0, lbx, ubx, lbg, ubg })
    }

    #[test]
    fn test_lower_constraint_active() {
        // min x  s.t.  x >= 3,  0 <= x <= 10
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], Expr::symbol(&x), vec![Expr::symbol(&x)]);
        let out = solve(&nlp, &[7.0], &[0.0], &[10.0], &[3.0], &[INF]);

        assert!(out.success, "status {}", out.status);
        assert_abs_diff_eq!(out.x[0], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.f, 3.0, epsilon = 1e-6);
        // Lower side active: negative constraint multiplier, bound inactive
        assert_abs_diff_eq!(out.lam_g[0], -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out.lam_x[0], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_variable_bound_active() {
        // min (x - 5)^2  s.t.  x <= 2
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], (&x - 5.0).powi(2), vec![]);
        let out = solve(&nlp, &[0.0], &[-INF], &[2.0], &[], &[]);

        assert!(out.success);
        assert_abs_diff_eq!(out.x[0], 2.0, epsilon = 1e-9);
        // Upper bound active: positive bound multiplier
        assert_abs_diff_eq!(out.lam_x[0], 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equality_constrained_quadratic() {
        // min x^2 + y^2  s.t.  x + y = 2
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let nlp = Nlp::new(
            vec![x.clone(), y.clone()],
            Expr::symbol(&x).powi(2) + Expr::symbol(&y).powi(2),
            vec![&x + &y],
        );
        let out = solve(&nlp, &[5.0, -3.0], &[-INF, -INF], &[INF, INF], &[2.0], &[2.0]);

        assert!(out.success, "status {}", out.status);
        assert_abs_diff_eq!(out.x[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.x[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.g[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.lam_g[0], -2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_nonlinear_constraint() {
        // min x + y  s.t.  x^2 + y^2 <= 2  ->  x = y = -1
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let nlp = Nlp::new(
            vec![x.clone(), y.clone()],
            &x + &y,
            vec![Expr::symbol(&x).powi(2) + Expr::symbol(&y).powi(2)],
        );
        let out = solve(&nlp, &[0.5, 0.0], &[-INF, -INF], &[INF, INF], &[-INF], &[2.0]);

        assert!(out.success, "status {}", out.status);
        assert_abs_diff_eq!(out.x[0], -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out.x[1], -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out.lam_g[0], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_infeasible_constraints() {
        // x <= 1 and x >= 5 at once
        let x = Symbol::new("x");
        let nlp = Nlp::new(
            vec![x.clone()],
            Expr::Constant(0.0),
            vec![Expr::symbol(&x), Expr::symbol(&x)],
        );
        let out = solve(&nlp, &[0.0], &[-INF], &[INF], &[-INF, 5.0], &[1.0, INF]);

        assert!(!out.success);
        assert_eq!(out.status, ReturnStatus::InfeasibleProblemDetected);
        assert!(out.lam_x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_invalid_input() {
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], Expr::symbol(&x), vec![]);
        let out = solve(&nlp, &[0.0, 1.0], &[0.0], &[1.0], &[], &[]);
        assert!(!out.success);
        assert_eq!(out.status, ReturnStatus::InvalidInput);
        assert_eq!(out.lam_x.len(), 1);
    }

    #[test]
    fn test_invalid_number() {
        // ln(x) is undefined on the whole box
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], Expr::symbol(&x).ln(), vec![]);
        let out = solve(&nlp, &[-2.0], &[-3.0], &[-1.0], &[], &[]);
        assert!(!out.success);
        assert_eq!(out.status, ReturnStatus::InvalidNumberDetected);
    }

    #[test]
    fn test_iteration_limit() {
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], Expr::symbol(&x), vec![Expr::symbol(&x)]);
        let solver = AugLagSolver::new(&nlp).unwrap().with_max_iterations(1);
        let out = solver.solve(&InvokeArgs {
            x0: &[7.0],
            lbx: &[0.0],
            ubx: &[10.0],
            lbg: &[3.0],
            ubg: &[INF],
        });
        assert_eq!(out.status, ReturnStatus::MaximumIterationsExceeded);
        assert_eq!(out.iterations, 1);
    }

    #[test]
    fn test_loose_tolerance() {
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], (&x - 5.0).powi(2), vec![]);
        let solver = AugLagSolver::new(&nlp).unwrap().with_tolerance(1e-4);
        assert_eq!(solver.settings().tol, 1e-4);

        let out = solver.solve(&InvokeArgs {
            x0: &[-1.0],
            lbx: &[-INF],
            ubx: &[2.0],
            lbg: &[],
            ubg: &[],
        });
        assert!(out.success, "status {}", out.status);
        assert_abs_diff_eq!(out.x[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_settings_from_options() {
        let mut options = SolverOptions::new();
        options.set(None, "print_time", true);
        options.set(Some(PREFIX), "max_iter", 20);
        options.set(Some(PREFIX), "tol", 1e-6);
        options.set(Some(PREFIX), "mu_init", 100);
        options.set(Some(PREFIX), "suppress_all_output", "yes");
        options.set(Some(PREFIX), "step_strategy", "fixed");

        let settings = AugLagSettings::from_options(&options).unwrap();
        assert!(settings.print_time);
        assert_eq!(settings.max_iter, 20);
        assert_eq!(settings.tol, 1e-6);
        assert_eq!(settings.mu_init, 100.0);
        assert!(settings.suppress_all_output);
        assert_eq!(settings.step_strategy, StepStrategy::Fixed);
    }

    #[test]
    fn test_settings_reject_bad_options() {
        let cases: Vec<(Option<&str>, &str, OptionValue)> = vec![
            (Some(PREFIX), "linear_solver", "mumps".into()),
            (Some("ipopt"), "tol", 1e-6.into()),
            (None, "tol", 1e-6.into()),
            (Some(PREFIX), "max_iter", 2.5.into()),
            (Some(PREFIX), "max_iter", (-1).into()),
            (Some(PREFIX), "tol", 0.0.into()),
            (Some(PREFIX), "mu_growth", 1.0.into()),
            (Some(PREFIX), "print_level", 13.into()),
            (Some(PREFIX), "suppress_all_output", "maybe".into()),
            (Some(PREFIX), "step_strategy", "newton".into()),
            (None, "print_time", "no".into()),
        ];
        for (prefix, name, value) in cases {
            let mut options = SolverOptions::new();
            options.set(prefix, name, value.clone());
            assert!(
                matches!(
                    AugLagSettings::from_options(&options),
                    Err(NlpError::InvalidOption { .. })
                ),
                "{prefix:?}.{name} = {value} should be rejected"
            );
        }
    }

    #[test]
    fn test_engine_instantiate() {
        let x = Symbol::new("x");
        let nlp = Nlp::new(vec![x.clone()], (&x - 1.0).powi(2), vec![]);
        let mut options = SolverOptions::new();
        options.set(Some(PREFIX), "print_level", 0);

        let mut handle = AugLag.instantiate(&nlp, &options).unwrap();
        let out = handle.invoke(&InvokeArgs {
            x0: &[4.0],
            lbx: &[-INF],
            ubx: &[INF],
            lbg: &[],
            ubg: &[],
        });
        assert!(out.success);
        assert_abs_diff_eq!(out.x[0], 1.0, epsilon = 1e-8);
        assert_eq!(AugLag.name(), "auglag");
    }

    #[test]
    fn test_unbound_symbol_fails_instantiation() {
        let x = Symbol::new("x");
        let stray = Symbol::new("stray");
        let nlp = Nlp::new(vec![x.clone()], &x + &stray, vec![]);
        assert!(matches!(
            AugLag.instantiate(&nlp, &SolverOptions::new()),
            Err(NlpError::Expression(_))
        ));
    }
}

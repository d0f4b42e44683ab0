use log::{debug, info, warn};
use quibble_expr::Function;
use quibble_nlp::{Engine, EngineOutput, InvokeArgs, ReturnStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::component::Component;
use crate::error::QuibbleError;
use crate::family::SolverFamily;
use crate::problem::Problem;
use crate::result::{OptimizationResult, ResultComponent};

/// A bound counts as active when the value lies strictly closer than this.
pub const ACTIVE_TOLERANCE: f64 = 1e-5;

/// Stand-in for infinite bounds when sampling an initial guess.
pub const SAMPLING_LIMIT: f64 = 1e10;

/// Outcome of one engine invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    /// Zero-based position in the trial sequence
    pub trial: usize,
    pub success: bool,
    pub status: ReturnStatus,
    pub objective: f64,
    pub iterations: usize,
}

/// Record of a full `start` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialReport {
    pub outcomes: Vec<TrialOutcome>,
    /// Trial whose solution was written to the problem
    pub best: Option<usize>,
}

impl TrialReport {
    pub fn successful(&self) -> impl Iterator<Item = &TrialOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TrialOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn is_solved(&self) -> bool {
        self.best.is_some()
    }
}

/// Runs a problem through repeated warm-started engine invocations.
///
/// ```text
/// guess -> engine -> success?  yes: next guess = primal x
///                              no:  next guess = bound multipliers lam_x
/// ```
///
/// After the last trial the successful solution with the lowest objective is
/// evaluated against every component and written back to the problem.
pub struct Solver<'p> {
    family: SolverFamily,
    engine: Box<dyn Engine>,
    problem: Option<&'p mut Problem>,
    rng: StdRng,
    solution: Option<EngineOutput>,
}

impl<'p> Solver<'p> {
    /// Orchestrator for the engine family called `name`.
    pub fn new(name: &str) -> Result<Self, QuibbleError> {
        let family =
            SolverFamily::from_name(name).ok_or_else(|| QuibbleError::NotSupported(name.to_string()))?;
        Ok(Self {
            family,
            engine: family.engine(),
            problem: None,
            rng: StdRng::from_entropy(),
            solution: None,
        })
    }

    pub fn with_problem(mut self, problem: &'p mut Problem) -> Self {
        self.problem = Some(problem);
        self
    }

    pub fn attach(&mut self, problem: &'p mut Problem) {
        self.problem = Some(problem);
    }

    /// Replace the family's engine, e.g. with an instrumented one.
    pub fn with_engine(mut self, engine: impl Engine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Make guess sampling reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn family(&self) -> SolverFamily {
        self.family
    }

    /// Raw engine output of the selected trial of the last `start`.
    pub fn solution(&self) -> Option<&EngineOutput> {
        self.solution.as_ref()
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_deref()
    }

    /// Run `trials` invocations and write the best solution to the problem.
    ///
    /// Trials that fail are recorded, not raised; when every trial fails the
    /// problem is left unsolved and the report has no `best`.
    pub fn start(
        &mut self,
        trials: usize,
        initial_guess: Option<&[f64]>,
    ) -> Result<TrialReport, QuibbleError> {
        if trials == 0 {
            return Err(QuibbleError::InvalidTrialCount);
        }
        let problem = self
            .problem
            .as_deref_mut()
            .ok_or_else(|| QuibbleError::State("no problem attached to the solver".to_string()))?;

        let nlp = problem.nlp();
        let n = nlp.num_variables();
        let lbx = problem.lower_bounds_decision_variables();
        let ubx = problem.upper_bounds_decision_variables();
        let lbg = problem.lower_bounds_constraints();
        let ubg = problem.upper_bounds_constraints();

        let mut guess = match initial_guess {
            Some(g) if g.len() != n => {
                return Err(QuibbleError::GuessLength {
                    expected: n,
                    found: g.len(),
                });
            }
            Some(g) => g.to_vec(),
            None => sample_guess(&mut self.rng, &lbx, &ubx),
        };

        let mut handle = self.engine.instantiate(&nlp, problem.solver_options())?;

        problem.mark_unsolved();
        self.solution = None;

        let mut report = TrialReport::default();
        let mut best: Option<(usize, EngineOutput)> = None;

        // Every trial runs even after a success: later trials start from the
        // previous solution and may still lower the objective.
        for trial in 0..trials {
            let output = handle.invoke(&InvokeArgs {
                x0: &guess,
                lbx: &lbx,
                ubx: &ubx,
                lbg: &lbg,
                ubg: &ubg,
            });

            info!(
                "Trial {}/{}: {} ({}), f = {}",
                trial + 1,
                trials,
                if output.success { "success" } else { "failure" },
                output.status,
                output.f
            );
            report.outcomes.push(TrialOutcome {
                trial,
                success: output.success,
                status: output.status,
                objective: output.f,
                iterations: output.iterations,
            });

            if output.success {
                debug!("Next guess: primal solution of trial {}", trial + 1);
                guess.clone_from(&output.x);
                if best.as_ref().is_none_or(|(_, b)| output.f < b.f) {
                    best = Some((trial, output));
                }
            } else {
                debug!("Next guess: bound multipliers of trial {}", trial + 1);
                // One entry per decision variable, whatever length the engine returned
                guess = (0..n)
                    .map(|i| output.lam_x.get(i).copied().unwrap_or(0.0))
                    .collect();
            }
        }

        let Some((trial, output)) = best else {
            warn!("All {trials} trials failed, problem left unsolved");
            return Ok(report);
        };

        debug!("Selected trial {} with f = {}", trial + 1, output.f);
        let result = extract_result(problem, &output.x)?;
        problem.mark_solved(result);
        report.best = Some(trial);
        self.solution = Some(output);
        Ok(report)
    }
}

fn replace_inf(value: f64) -> f64 {
    if value == f64::INFINITY {
        SAMPLING_LIMIT
    } else if value == f64::NEG_INFINITY {
        -SAMPLING_LIMIT
    } else {
        value
    }
}

/// One uniform draw per variable within its bounds.
///
/// The draw interpolates between the substituted bounds and is then clamped
/// into the true ones, so a finite bound beyond the sampling limit or a span
/// wider than `f64::MAX` still yields a finite value inside the box.
fn sample_guess(rng: &mut impl Rng, lower: &[f64], upper: &[f64]) -> Vec<f64> {
    lower
        .iter()
        .zip(upper)
        .map(|(&l, &u)| {
            let t: f64 = rng.gen_range(0.0..=1.0);
            let value = replace_inf(l) * (1.0 - t) + replace_inf(u) * t;
            let value = if value.is_finite() { value } else { 0.0 };
            value.max(l).min(u)
        })
        .collect()
}

fn is_active(value: f64, bound: f64) -> bool {
    (bound - value).abs() < ACTIVE_TOLERANCE
}

fn result_entry(component: &Component, value: f64) -> ResultComponent {
    ResultComponent {
        optimal_value: Some(value),
        lower_bound_active: is_active(value, component.lower_bound()),
        upper_bound_active: is_active(value, component.upper_bound()),
        ..component.to_result_component()
    }
}

/// Evaluate every component at `x`.
fn extract_result(problem: &Problem, x: &[f64]) -> Result<OptimizationResult, QuibbleError> {
    let symbols = problem.symbols();
    let evaluate = |component: &Component| -> Result<f64, QuibbleError> {
        Ok(Function::new(&symbols, component.expression())?.call(x)?)
    };

    let decision_variables = problem
        .decision_variables()
        .iter()
        .zip(x)
        .map(|(c, value)| result_entry(c, *value))
        .collect();
    let constraints = problem
        .constraints()
        .iter()
        .map(|c| Ok(result_entry(c, evaluate(c)?)))
        .collect::<Result<Vec<_>, QuibbleError>>()?;
    let objectives = problem
        .objectives()
        .iter()
        .map(|c| {
            Ok(ResultComponent {
                optimal_value: Some(evaluate(c)?),
                ..c.to_result_component()
            })
        })
        .collect::<Result<Vec<_>, QuibbleError>>()?;

    Ok(OptimizationResult {
        decision_variables,
        constraints,
        objectives,
    })
}

//! Projected gradient descent on a box, used for the bound-constrained
//! subproblems of the augmented Lagrangian method.

const ARMIJO: f64 = 1e-4;
/// Relative slack on the sufficient decrease test, so steps whose true
/// decrease is below the rounding of `f` are still accepted
const ROUNDOFF: f64 = 1e-14;
const MAX_BACKTRACKS: usize = 60;
const STEP_MIN: f64 = 1e-12;
const STEP_MAX: f64 = 1e12;

/// Step length rule between accepted iterates
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStrategy {
    /// Spectral step `s's / s'y` from the last two iterates
    #[default]
    BarzilaiBorwein,
    /// Unit trial step, backtracked by halving
    Fixed,
}

impl StepStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "barzilai_borwein" => Some(StepStrategy::BarzilaiBorwein),
            "fixed" => Some(StepStrategy::Fixed),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StepStrategy::BarzilaiBorwein => "barzilai_borwein",
            StepStrategy::Fixed => "fixed",
        }
    }
}

pub(crate) trait Smooth {
    fn value(&self, x: &[f64]) -> f64;
    fn value_and_gradient(&self, x: &[f64]) -> (f64, Vec<f64>);
}

pub(crate) struct Bounds<'a> {
    pub lower: &'a [f64],
    pub upper: &'a [f64],
}

impl Bounds<'_> {
    pub fn project(&self, x: &mut [f64]) {
        for ((xi, l), u) in x.iter_mut().zip(self.lower).zip(self.upper) {
            *xi = xi.max(*l).min(*u);
        }
    }

    fn step(&self, x: &[f64], gradient: &[f64], alpha: f64) -> Vec<f64> {
        let mut trial: Vec<f64> = x.iter().zip(gradient).map(|(xi, gi)| xi - alpha * gi).collect();
        self.project(&mut trial);
        trial
    }

    /// Infinity norm of `P(x - g) - x`; zero exactly at box-stationary points.
    pub fn stationarity(&self, x: &[f64], gradient: &[f64]) -> f64 {
        self.step(x, gradient, 1.0)
            .iter()
            .zip(x)
            .map(|(p, xi)| (p - xi).abs())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    Converged,
    IterationLimit,
    /// No step along the projected path decreased the objective
    Stalled,
    NonFinite,
}

#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub x: Vec<f64>,
    pub stationarity: f64,
    pub iterations: usize,
    pub termination: Termination,
}

pub(crate) struct Settings {
    pub max_iter: usize,
    pub tol: f64,
    pub strategy: StepStrategy,
}

fn all_finite(value: f64, gradient: &[f64]) -> bool {
    value.is_finite() && gradient.iter().all(|g| g.is_finite())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn minimize<S: Smooth>(
    objective: &S,
    bounds: &Bounds<'_>,
    mut x: Vec<f64>,
    settings: &Settings,
) -> Outcome {
    bounds.project(&mut x);
    let (mut fx, mut gx) = objective.value_and_gradient(&x);
    if !all_finite(fx, &gx) {
        return Outcome {
            x,
            stationarity: f64::NAN,
            iterations: 0,
            termination: Termination::NonFinite,
        };
    }

    let mut alpha = 1.0 / gx.iter().fold(1.0_f64, |m, g| m.max(g.abs()));

    for iteration in 0..settings.max_iter {
        let stationarity = bounds.stationarity(&x, &gx);
        if stationarity <= settings.tol {
            return Outcome {
                x,
                stationarity,
                iterations: iteration,
                termination: Termination::Converged,
            };
        }

        let slack = ROUNDOFF * fx.abs();
        let mut step = alpha;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let trial = bounds.step(&x, &gx, step);
            let direction: Vec<f64> = trial.iter().zip(&x).map(|(t, xi)| t - xi).collect();
            let value = objective.value(&trial);
            if value.is_finite() && value <= fx + ARMIJO * dot(&gx, &direction) + slack {
                accepted = Some(trial);
                break;
            }
            step *= 0.5;
        }

        let Some(trial) = accepted else {
            return Outcome {
                x,
                stationarity,
                iterations: iteration,
                termination: Termination::Stalled,
            };
        };

        let (ft, gt) = objective.value_and_gradient(&trial);
        if !all_finite(ft, &gt) {
            return Outcome {
                x: trial,
                stationarity: f64::NAN,
                iterations: iteration + 1,
                termination: Termination::NonFinite,
            };
        }

        alpha = match settings.strategy {
            StepStrategy::BarzilaiBorwein => {
                let s: Vec<f64> = trial.iter().zip(&x).map(|(a, b)| a - b).collect();
                let y: Vec<f64> = gt.iter().zip(&gx).map(|(a, b)| a - b).collect();
                let sy = dot(&s, &y);
                if sy > 0.0 {
                    (dot(&s, &s) / sy).clamp(STEP_MIN, STEP_MAX)
                } else {
                    // Non-positive curvature along s; lengthen the step instead
                    (step * 2.0).min(STEP_MAX)
                }
            }
            StepStrategy::Fixed => 1.0,
        };

        x = trial;
        fx = ft;
        gx = gt;
    }

    let stationarity = bounds.stationarity(&x, &gx);
    let termination = if stationarity <= settings.tol {
        Termination::Converged
    } else {
        Termination::IterationLimit
    };
    Outcome {
        x,
        stationarity,
        iterations: settings.max_iter,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// (x0 - 1)^2 + 10 (x1 + 2)^2
    struct Bowl;

    impl Smooth for Bowl {
        fn value(&self, x: &[f64]) -> f64 {
            (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2)
        }

        fn value_and_gradient(&self, x: &[f64]) -> (f64, Vec<f64>) {
            (
                self.value(x),
                vec![2.0 * (x[0] - 1.0), 20.0 * (x[1] + 2.0)],
            )
        }
    }

    fn settings(strategy: StepStrategy) -> Settings {
        Settings {
            max_iter: 5000,
            tol: 1e-10,
            strategy,
        }
    }

    #[test]
    fn test_unconstrained_minimum() {
        let inf = [f64::INFINITY; 2];
        let neg = [f64::NEG_INFINITY; 2];
        let bounds = Bounds { lower: &neg, upper: &inf };
        for strategy in [StepStrategy::BarzilaiBorwein, StepStrategy::Fixed] {
            let out = minimize(&Bowl, &bounds, vec![5.0, 5.0], &settings(strategy));
            assert_eq!(out.termination, Termination::Converged);
            assert_abs_diff_eq!(out.x[0], 1.0, epsilon = 1e-8);
            assert_abs_diff_eq!(out.x[1], -2.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_active_box() {
        let lower = [2.0, -1.0];
        let upper = [4.0, 3.0];
        let bounds = Bounds { lower: &lower, upper: &upper };
        let out = minimize(&Bowl, &bounds, vec![3.0, 0.0], &settings(StepStrategy::BarzilaiBorwein));
        assert_eq!(out.termination, Termination::Converged);
        assert_abs_diff_eq!(out.x[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.x[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_guess_is_projected() {
        let lower = [0.0, 0.0];
        let upper = [0.5, 0.5];
        let bounds = Bounds { lower: &lower, upper: &upper };
        let out = minimize(&Bowl, &bounds, vec![-7.0, 9.0], &settings(StepStrategy::Fixed));
        assert_abs_diff_eq!(out.x[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out.x[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_strategy_names() {
        for s in [StepStrategy::BarzilaiBorwein, StepStrategy::Fixed] {
            assert_eq!(StepStrategy::from_name(s.name()), Some(s));
        }
        assert_eq!(StepStrategy::from_name("newton"), None);
    }
}

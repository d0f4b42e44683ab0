use quibble_nlp::auglag::{self, AugLag};
use quibble_nlp::{Engine, SolverOptions};

/// Engine families the orchestrator can drive.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverFamily {
    /// Augmented Lagrangian with projected gradient subproblems
    AugLag,
}

impl SolverFamily {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            auglag::PREFIX => Some(SolverFamily::AugLag),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolverFamily::AugLag => auglag::PREFIX,
        }
    }

    pub fn engine(self) -> Box<dyn Engine> {
        match self {
            SolverFamily::AugLag => Box::new(AugLag),
        }
    }

    /// Options a problem starts with for this family.
    pub fn default_options(self, verbose: bool) -> SolverOptions {
        let mut options = SolverOptions::new();
        options.set(None, "print_time", verbose);
        match self {
            SolverFamily::AugLag => {
                let prefix = Some(auglag::PREFIX);
                options.set(prefix, "suppress_all_output", if verbose { "no" } else { "yes" });
                options.set(prefix, "step_strategy", "barzilai_borwein");
                options.set(prefix, "print_level", 4);
            }
        }
        options
    }
}

/// Defaults for a solver name; an unknown name only gets `print_time`.
pub fn default_options(solver_name: &str, verbose: bool) -> SolverOptions {
    match SolverFamily::from_name(solver_name) {
        Some(family) => family.default_options(verbose),
        None => {
            let mut options = SolverOptions::new();
            options.set(None, "print_time", verbose);
            options
        }
    }
}

use std::fmt;

/// Raw output of one engine invocation
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// Primal point
    pub x: Vec<f64>,
    /// Multipliers on the variable bounds; negative when a lower bound is active
    pub lam_x: Vec<f64>,
    /// Multipliers on the constraint bounds; positive when an upper bound is active
    pub lam_g: Vec<f64>,
    /// Objective value at `x`
    pub f: f64,
    /// Constraint values at `x`
    pub g: Vec<f64>,
    pub success: bool,
    pub status: ReturnStatus,
    /// Outer iterations performed
    pub iterations: usize,
}

impl EngineOutput {
    /// Output for an invocation rejected before any iteration ran.
    ///
    /// `x` echoes the guess when it has the right length; multipliers are zero.
    pub fn rejected(x0: &[f64], n: usize, m: usize) -> Self {
        let x = if x0.len() == n {
            x0.to_vec()
        } else {
            vec![0.0; n]
        };
        Self {
            x,
            lam_x: vec![0.0; n],
            lam_g: vec![0.0; m],
            f: f64::NAN,
            g: vec![f64::NAN; m],
            success: false,
            status: ReturnStatus::InvalidInput,
            iterations: 0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    /// Converged to the requested tolerances
    SolveSucceeded,
    /// Converged only to the acceptable tolerances
    SolvedToAcceptableLevel,
    /// Constraint violation stopped decreasing at the penalty cap
    InfeasibleProblemDetected,
    MaximumIterationsExceeded,
    /// A function value or derivative evaluated to NaN or infinity
    InvalidNumberDetected,
    /// Dimensions or bounds of the invocation were inconsistent
    InvalidInput,
}

impl ReturnStatus {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            ReturnStatus::SolveSucceeded | ReturnStatus::SolvedToAcceptableLevel
        )
    }

    pub fn code(self) -> &'static str {
        match self {
            ReturnStatus::SolveSucceeded => "Solve_Succeeded",
            ReturnStatus::SolvedToAcceptableLevel => "Solved_To_Acceptable_Level",
            ReturnStatus::InfeasibleProblemDetected => "Infeasible_Problem_Detected",
            ReturnStatus::MaximumIterationsExceeded => "Maximum_Iterations_Exceeded",
            ReturnStatus::InvalidNumberDetected => "Invalid_Number_Detected",
            ReturnStatus::InvalidInput => "Invalid_Input",
        }
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

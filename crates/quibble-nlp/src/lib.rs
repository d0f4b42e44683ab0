pub mod auglag;
pub mod engine;
pub mod options;
pub mod problem;
mod projected;
pub mod solution;

pub use auglag::{AugLag, AugLagSettings, AugLagSolver};
pub use engine::{Engine, EngineHandle, NlpError};
pub use options::{OptionKey, OptionValue, SolverOptions};
pub use problem::{InvokeArgs, Nlp};
pub use projected::StepStrategy;
pub use solution::{EngineOutput, ReturnStatus};

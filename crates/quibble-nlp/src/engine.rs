use quibble_expr::ExprError;
use thiserror::Error;

use crate::options::SolverOptions;
use crate::problem::{InvokeArgs, Nlp};
use crate::solution::EngineOutput;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NlpError {
    #[error("Invalid solver option {key}: {reason}")]
    InvalidOption { key: String, reason: String },
    #[error("Cannot build solver functions: {0}")]
    Expression(#[from] ExprError),
}

/// A family of NLP solvers.
///
/// Instantiation compiles the symbolic program once; the returned handle is
/// invoked once per trial with fresh bounds and guesses.
pub trait Engine {
    fn name(&self) -> &str;

    fn instantiate(
        &self,
        nlp: &Nlp,
        options: &SolverOptions,
    ) -> Result<Box<dyn EngineHandle>, NlpError>;
}

/// An instantiated solver bound to one program.
pub trait EngineHandle {
    /// Run the solver from `args.x0`.
    ///
    /// Numerical failure is reported through [`EngineOutput::success`] and
    /// [`EngineOutput::status`], never as a panic.
    fn invoke(&mut self, args: &InvokeArgs<'_>) -> EngineOutput;
}

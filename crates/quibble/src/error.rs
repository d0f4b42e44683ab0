use quibble_expr::{ExprError, ParseError};
use quibble_nlp::NlpError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuibbleError {
    #[error("Invalid bounds for {name}: upper bound {upper} is below lower bound {lower}")]
    Configuration { name: String, lower: f64, upper: f64 },
    #[error("Solver '{0}' is not supported")]
    NotSupported(String),
    #[error("Invalid state: {0}")]
    State(String),
    #[error("At least one trial is required")]
    InvalidTrialCount,
    #[error("Initial guess has {found} entries, expected one per decision variable ({expected})")]
    GuessLength { expected: usize, found: usize },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Expression(#[from] ExprError),
    #[error(transparent)]
    Engine(#[from] NlpError),
}

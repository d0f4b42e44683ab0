//! Multi-trial, warm-started nonlinear optimization over symbolic components.
//!
//! Build a [`Problem`] from decision variables, constraints and objectives,
//! then run it through a [`Solver`]: the engine is invoked a fixed number of
//! times, each trial starting from the previous trial's primal solution (or
//! its bound multipliers after a failure), and the best successful trial is
//! written back as an [`OptimizationResult`].

pub mod component;
pub mod error;
pub mod family;
pub mod problem;
pub mod result;
pub mod solver;

pub use component::{Component, ComponentKind};
pub use error::QuibbleError;
pub use family::SolverFamily;
pub use problem::Problem;
pub use result::{OptimizationResult, ResultComponent};
pub use solver::{Solver, TrialOutcome, TrialReport};

pub use quibble_expr::{Expr, Symbol};
pub use quibble_nlp::{OptionKey, OptionValue, SolverOptions};

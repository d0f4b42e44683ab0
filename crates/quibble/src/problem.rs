use log::{debug, info, warn};
use quibble_expr::{Expr, Function, Parser, Scope, Symbol};
use quibble_nlp::{Nlp, OptionValue, SolverOptions};

use crate::component::{Component, ComponentKind};
use crate::error::QuibbleError;
use crate::family;
use crate::result::OptimizationResult;
use crate::solver::Solver;

/// An optimization problem under construction.
///
/// Components are appended in registration order and never removed; that order
/// is the order of every bound vector, name list and result list.
#[derive(Debug, Clone)]
pub struct Problem {
    decision_variables: Vec<Component>,
    constraints: Vec<Component>,
    objectives: Vec<Component>,
    solved: bool,
    result: Option<OptimizationResult>,
    solver_name: String,
    verbose: bool,
    solver_options: SolverOptions,
}

impl Default for Problem {
    fn default() -> Self {
        Self::new(quibble_nlp::auglag::PREFIX, false)
    }
}

impl Problem {
    /// An empty problem whose options start at the defaults of `solver_name`.
    pub fn new(solver_name: &str, verbose: bool) -> Self {
        Self {
            decision_variables: Vec::new(),
            constraints: Vec::new(),
            objectives: Vec::new(),
            solved: false,
            result: None,
            solver_name: solver_name.to_string(),
            verbose,
            solver_options: family::default_options(solver_name, verbose),
        }
    }

    /// Register a continuous decision variable and return its symbol.
    pub fn add_decision_variable(
        &mut self,
        name: &str,
        lower_bound: f64,
        upper_bound: f64,
        group: Option<&str>,
    ) -> Result<Symbol, QuibbleError> {
        self.push_decision_variable(name, lower_bound, upper_bound, group, false)
    }

    /// Like [`Problem::add_decision_variable`], flagged as integer-valued.
    ///
    /// The flag is informational; the continuous engines treat the variable
    /// as real.
    pub fn add_discrete_decision_variable(
        &mut self,
        name: &str,
        lower_bound: f64,
        upper_bound: f64,
        group: Option<&str>,
    ) -> Result<Symbol, QuibbleError> {
        self.push_decision_variable(name, lower_bound, upper_bound, group, true)
    }

    fn push_decision_variable(
        &mut self,
        name: &str,
        lower_bound: f64,
        upper_bound: f64,
        group: Option<&str>,
        is_discrete: bool,
    ) -> Result<Symbol, QuibbleError> {
        let symbol = Symbol::new(name);
        let component = Component::new(
            ComponentKind::DecisionVariable { is_discrete },
            Expr::symbol(&symbol),
            lower_bound,
            upper_bound,
            Some(name.to_string()),
            group.map(String::from),
        )?;
        if self.verbose {
            debug!("Added decision variable {component} to problem");
        }
        self.decision_variables.push(component);
        Ok(symbol)
    }

    /// Register a constraint `lower_bound <= expression <= upper_bound`.
    ///
    /// Unnamed constraints are called `Constraint_<k>`, `k` counting from 1.
    pub fn add_constraint(
        &mut self,
        expression: impl Into<Expr>,
        lower_bound: f64,
        upper_bound: f64,
        name: Option<&str>,
        group: Option<&str>,
    ) -> Result<(), QuibbleError> {
        let name = name
            .map(String::from)
            .unwrap_or_else(|| format!("Constraint_{}", self.constraints.len() + 1));
        let component = Component::new(
            ComponentKind::Constraint,
            expression.into(),
            lower_bound,
            upper_bound,
            Some(name),
            group.map(String::from),
        )?;
        if self.verbose {
            debug!("Added constraint {component} to problem");
        }
        self.constraints.push(component);
        Ok(())
    }

    /// Register an objective; unnamed objectives are called `Objective_<k>`.
    pub fn add_objective(&mut self, expression: impl Into<Expr>, name: Option<&str>, group: Option<&str>) {
        let name = name
            .map(String::from)
            .unwrap_or_else(|| format!("Objective_{}", self.objectives.len() + 1));
        let component = Component::objective(expression.into(), Some(name), group.map(String::from));
        if self.verbose {
            debug!("Added objective {component} to problem");
        }
        self.objectives.push(component);
    }

    /// Merge options under `prefix` (`prefix.key`), or as bare keys without
    /// one. Later values overwrite earlier ones.
    pub fn add_solver_options<K, V, I>(&mut self, prefix: Option<&str>, options: I)
    where
        K: Into<String>,
        V: Into<OptionValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.solver_options.merge(prefix, options);
        if self.verbose {
            debug!("Solver options are now {}", self.solver_options);
        }
    }

    /// Restore the defaults of the current solver family, or clear every
    /// option when `delete_all` is set.
    pub fn reset_solver_options(&mut self, delete_all: bool) {
        if delete_all {
            self.solver_options.clear();
            if self.verbose {
                debug!("Deleted all solver options");
            }
        } else {
            self.solver_options = family::default_options(&self.solver_name, self.verbose);
        }
    }

    /// Switch the solver family; options return to that family's defaults.
    pub fn set_solver_name(&mut self, name: &str) {
        self.solver_name = name.to_string();
        self.reset_solver_options(false);
    }

    pub fn solver_name(&self) -> &str {
        &self.solver_name
    }

    pub fn solver_options(&self) -> &SolverOptions {
        &self.solver_options
    }

    pub fn set_solver_options(&mut self, options: SolverOptions) {
        self.solver_options = options;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn decision_variables(&self) -> &[Component] {
        &self.decision_variables
    }

    pub fn constraints(&self) -> &[Component] {
        &self.constraints
    }

    pub fn objectives(&self) -> &[Component] {
        &self.objectives
    }

    pub fn lower_bounds_constraints(&self) -> Vec<f64> {
        self.constraints.iter().map(Component::lower_bound).collect()
    }

    pub fn upper_bounds_constraints(&self) -> Vec<f64> {
        self.constraints.iter().map(Component::upper_bound).collect()
    }

    pub fn names_constraints(&self) -> Vec<&str> {
        self.constraints.iter().map(|c| c.name().unwrap_or_default()).collect()
    }

    pub fn lower_bounds_decision_variables(&self) -> Vec<f64> {
        self.decision_variables.iter().map(Component::lower_bound).collect()
    }

    pub fn upper_bounds_decision_variables(&self) -> Vec<f64> {
        self.decision_variables.iter().map(Component::upper_bound).collect()
    }

    pub fn names_decision_variables(&self) -> Vec<&str> {
        self.decision_variables
            .iter()
            .map(|c| c.name().unwrap_or_default())
            .collect()
    }

    /// Decision-variable symbols in registration order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.decision_variables
            .iter()
            .filter_map(Component::symbol)
            .cloned()
            .collect()
    }

    /// Decision variables by name, for parsing expressions.
    pub fn scope(&self) -> Scope {
        self.symbols().into_iter().collect()
    }

    /// Parse an infix expression over this problem's decision variables.
    pub fn parse(&self, source: &str) -> Result<Expr, QuibbleError> {
        Ok(Parser::parse(source, &self.scope())?)
    }

    /// The program handed to the engine: decision variables, the sum of all
    /// objectives, and the constraint expressions.
    pub fn nlp(&self) -> Nlp {
        Nlp::new(
            self.symbols(),
            self.objectives.iter().map(Component::expression).sum(),
            self.constraints
                .iter()
                .map(|c| c.expression().clone())
                .collect(),
        )
    }

    /// Evaluate every constraint at `candidate`.
    ///
    /// Returns the values when all lie within their bounds, `None` when any
    /// is violated.
    pub fn check_constraints(&self, candidate: &[f64]) -> Result<Option<Vec<f64>>, QuibbleError> {
        let symbols = self.symbols();
        if candidate.len() != symbols.len() {
            return Err(QuibbleError::GuessLength {
                expected: symbols.len(),
                found: candidate.len(),
            });
        }
        let mut values = Vec::with_capacity(self.constraints.len());
        for c in &self.constraints {
            let value = Function::new(&symbols, c.expression())?.call(candidate)?;
            if !(c.lower_bound() <= value && value <= c.upper_bound()) {
                return Ok(None);
            }
            values.push(value);
        }
        Ok(Some(values))
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// The result of the last successful solve, `None` while unsolved.
    pub fn result(&self) -> Option<&OptimizationResult> {
        self.result.as_ref()
    }

    pub(crate) fn mark_unsolved(&mut self) {
        self.solved = false;
        self.result = None;
    }

    pub(crate) fn mark_solved(&mut self, result: OptimizationResult) {
        self.solved = true;
        self.result = Some(result);
    }

    /// Solve with the configured solver family over `trials` warm-started
    /// trials.
    ///
    /// An infeasible outcome is not an error: it returns `Ok(None)`.
    pub fn solve(
        &mut self,
        trials: usize,
        initial_guess: Option<&[f64]>,
    ) -> Result<Option<&OptimizationResult>, QuibbleError> {
        if self.verbose {
            debug!("Using {} solver, options: {}", self.solver_name, self.solver_options);
        }

        let solver_name = self.solver_name.clone();
        let mut solver = Solver::new(&solver_name)?.with_problem(self);
        solver.start(trials, initial_guess)?;
        drop(solver);

        match &self.result {
            Some(result) => {
                info!("Solve succeeded");
                if self.verbose {
                    debug!("Results:\n{result}");
                }
            }
            None => warn!("Problem seems infeasible"),
        }
        Ok(self.result.as_ref())
    }
}

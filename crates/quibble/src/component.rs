use std::fmt;

use quibble_expr::{Expr, Symbol};

use crate::error::QuibbleError;
use crate::result::ResultComponent;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A free variable of the problem; `is_discrete` is recorded but the
    /// continuous engine does not enforce it
    DecisionVariable { is_discrete: bool },
    /// An expression kept within `[lower_bound, upper_bound]`
    Constraint,
    /// An expression to minimize; all objectives are summed
    Objective,
}

/// One building block of an optimization problem
#[derive(Debug, Clone)]
pub struct Component {
    kind: ComponentKind,
    expression: Expr,
    lower_bound: f64,
    upper_bound: f64,
    name: Option<String>,
    group: Option<String>,
}

impl Component {
    /// Create a component, checking that the bounds are ordered.
    ///
    /// Equal bounds are legal and pin the component to a single value.
    pub fn new(
        kind: ComponentKind,
        expression: Expr,
        lower_bound: f64,
        upper_bound: f64,
        name: Option<String>,
        group: Option<String>,
    ) -> Result<Self, QuibbleError> {
        if lower_bound.is_nan() || upper_bound.is_nan() || upper_bound < lower_bound {
            return Err(QuibbleError::Configuration {
                name: name.clone().unwrap_or_else(|| expression.to_string()),
                lower: lower_bound,
                upper: upper_bound,
            });
        }
        Ok(Self {
            kind,
            expression,
            lower_bound,
            upper_bound,
            name,
            group,
        })
    }

    /// Objectives carry no bounds.
    pub fn objective(expression: Expr, name: Option<String>, group: Option<String>) -> Self {
        Self {
            kind: ComponentKind::Objective,
            expression,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            name,
            group,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, ComponentKind::DecisionVariable { is_discrete: true })
    }

    /// The variable behind a decision-variable component.
    pub fn symbol(&self) -> Option<&Symbol> {
        match (&self.kind, &self.expression) {
            (ComponentKind::DecisionVariable { .. }, Expr::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    pub fn to_result_component(&self) -> ResultComponent {
        ResultComponent::new(self.name.clone(), self.group.clone())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("unnamed");
        match self.kind {
            ComponentKind::Objective => write!(f, "{}: {}", name, self.expression),
            ComponentKind::DecisionVariable { is_discrete } => {
                write!(
                    f,
                    "{}: {} <= {} <= {}",
                    name, self.lower_bound, self.expression, self.upper_bound
                )?;
                if is_discrete {
                    write!(f, " (discrete)")?;
                }
                Ok(())
            }
            ComponentKind::Constraint => write!(
                f,
                "{}: {} <= {} <= {}",
                name, self.lower_bound, self.expression, self.upper_bound
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(lower: f64, upper: f64) -> Result<Component, QuibbleError> {
        let x = Symbol::new("x");
        Component::new(
            ComponentKind::Constraint,
            2.0 * &x,
            lower,
            upper,
            Some("double".to_string()),
            None,
        )
    }

    #[test]
    fn test_bound_ordering() {
        assert!(constraint(0.0, 1.0).is_ok());
        assert!(constraint(1.0, 1.0).is_ok());
        assert!(constraint(f64::NEG_INFINITY, f64::INFINITY).is_ok());
        assert!(matches!(
            constraint(2.0, 1.0),
            Err(QuibbleError::Configuration { ref name, .. }) if name == "double"
        ));
        assert!(constraint(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_objective_is_unbounded() {
        let x = Symbol::new("x");
        let objective = Component::objective(Expr::symbol(&x).powi(2), None, Some("cost".into()));
        assert_eq!(objective.lower_bound(), f64::NEG_INFINITY);
        assert_eq!(objective.upper_bound(), f64::INFINITY);
        assert_eq!(objective.group(), Some("cost"));
        assert!(objective.symbol().is_none());
    }

    #[test]
    fn test_decision_variable_symbol() {
        let x = Symbol::new("x");
        let var = Component::new(
            ComponentKind::DecisionVariable { is_discrete: true },
            Expr::symbol(&x),
            0.0,
            3.0,
            Some("x".into()),
            None,
        )
        .unwrap();
        assert_eq!(var.symbol(), Some(&x));
        assert!(var.is_discrete());
        assert_eq!(var.to_string(), "x: 0 <= x <= 3 (discrete)");
    }

    #[test]
    fn test_display() {
        assert_eq!(constraint(0.0, 1.0).unwrap().to_string(), "double: 0 <= 2 * x <= 1");
        let x = Symbol::new("x");
        let objective = Component::objective(&x + 1.0, Some("cost".into()), None);
        assert_eq!(objective.to_string(), "cost: x + 1");
    }

    #[test]
    fn test_to_result_component() {
        let x = Symbol::new("x");
        let c = Component::new(
            ComponentKind::Constraint,
            Expr::symbol(&x),
            0.0,
            1.0,
            Some("c".into()),
            Some("g".into()),
        )
        .unwrap();
        let r = c.to_result_component();
        assert_eq!(r.name.as_deref(), Some("c"));
        assert_eq!(r.group.as_deref(), Some("g"));
        assert_eq!(r.optimal_value, None);
        assert!(!r.lower_bound_active && !r.upper_bound_active);
    }
}

use std::collections::HashMap;

use thiserror::Error;

use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::symbol::Symbol;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Symbol '{0}' is not an input of the function")]
    UnboundSymbol(String),
    #[error("Function takes {expected} inputs but {found} values were given")]
    ArityMismatch { expected: usize, found: usize },
}

/// Expression tree with symbols resolved to input positions
#[derive(Debug, Clone)]
enum Node {
    Constant(f64),
    Input(usize),
    Unary(UnaryOp, Box<Node>),
    Binary(Box<Node>, BinaryOp, Box<Node>),
}

impl Node {
    fn eval(&self, values: &[f64]) -> f64 {
        match self {
            Node::Constant(v) => *v,
            Node::Input(i) => values[*i],
            Node::Unary(op, arg) => op.apply(arg.eval(values)),
            Node::Binary(left, op, right) => op.apply(left.eval(values), right.eval(values)),
        }
    }
}

/// A scalar expression compiled against an ordered list of input symbols.
///
/// Resolution happens once in [`Function::new`]; [`Function::call`] only walks
/// the resolved tree.
#[derive(Debug, Clone)]
pub struct Function {
    inputs: Vec<Symbol>,
    root: Node,
}

impl Function {
    pub fn new(inputs: &[Symbol], expr: &Expr) -> Result<Self, ExprError> {
        let mut positions = HashMap::with_capacity(inputs.len());
        for (i, s) in inputs.iter().enumerate() {
            positions.entry(s.id()).or_insert(i);
        }
        let root = resolve(expr, &positions)?;
        Ok(Self {
            inputs: inputs.to_vec(),
            root,
        })
    }

    pub fn inputs(&self) -> &[Symbol] {
        &self.inputs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn call(&self, values: &[f64]) -> Result<f64, ExprError> {
        if values.len() != self.inputs.len() {
            return Err(ExprError::ArityMismatch {
                expected: self.inputs.len(),
                found: values.len(),
            });
        }
        Ok(self.root.eval(values))
    }
}

fn resolve(expr: &Expr, positions: &HashMap<u64, usize>) -> Result<Node, ExprError> {
    Ok(match expr {
        Expr::Constant(v) => Node::Constant(*v),
        Expr::Symbol(s) => match positions.get(&s.id()) {
            Some(&i) => Node::Input(i),
            None => return Err(ExprError::UnboundSymbol(s.name().to_string())),
        },
        Expr::Unary { op, arg } => Node::Unary(*op, Box::new(resolve(arg, positions)?)),
        Expr::Binary { left, op, right } => Node::Binary(
            Box::new(resolve(left, positions)?),
            *op,
            Box::new(resolve(right, positions)?),
        ),
    })
}

/// Evaluate `expr` once with `values[i]` bound to `inputs[i]`.
pub fn evaluate(expr: &Expr, inputs: &[Symbol], values: &[f64]) -> Result<f64, ExprError> {
    Function::new(inputs, expr)?.call(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_evaluate() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let e = &x * &y + Expr::symbol(&x).powi(2);
        let value = evaluate(&e, &[x, y], &[3.0, 2.0]).unwrap();
        assert_relative_eq!(value, 15.0);
    }

    #[test]
    fn test_input_order() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let f = Function::new(&[y.clone(), x.clone()], &(&x - &y)).unwrap();
        assert_eq!(f.num_inputs(), 2);
        assert_relative_eq!(f.call(&[1.0, 5.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_unused_inputs_allowed() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let f = Function::new(&[x, y], &Expr::Constant(2.5)).unwrap();
        assert_relative_eq!(f.call(&[0.0, 0.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_unbound_symbol() {
        let x = Symbol::new("x");
        let z = Symbol::new("z");
        let err = Function::new(&[x.clone()], &(&x + &z)).unwrap_err();
        assert_eq!(err, ExprError::UnboundSymbol("z".to_string()));
    }

    #[test]
    fn test_arity_mismatch() {
        let x = Symbol::new("x");
        let f = Function::new(&[x.clone()], &Expr::symbol(&x)).unwrap();
        assert_eq!(
            f.call(&[1.0, 2.0]),
            Err(ExprError::ArityMismatch { expected: 1, found: 2 })
        );
    }
}

use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::symbol::Symbol;

impl Expr {
    /// Symbolic partial derivative with respect to `var`.
    ///
    /// The result is built through the folding constructors, so derivatives of
    /// polynomial terms stay compact. `abs` differentiates to `sign` and `sign`
    /// to zero.
    pub fn diff(&self, var: &Symbol) -> Expr {
        match self {
            Expr::Constant(_) => Expr::Constant(0.0),
            Expr::Symbol(s) => Expr::Constant(if s == var { 1.0 } else { 0.0 }),
            Expr::Unary { op, arg } => {
                let darg = arg.diff(var);
                if darg.as_constant() == Some(0.0) {
                    return Expr::Constant(0.0);
                }
                let a = (**arg).clone();
                match op {
                    UnaryOp::Neg => -darg,
                    UnaryOp::Sin => a.cos() * darg,
                    UnaryOp::Cos => -(a.sin()) * darg,
                    UnaryOp::Tan => darg / a.cos().powi(2),
                    UnaryOp::Exp => a.exp() * darg,
                    UnaryOp::Ln => darg / a,
                    UnaryOp::Sqrt => darg / (2.0 * a.sqrt()),
                    UnaryOp::Abs => a.sign() * darg,
                    UnaryOp::Sign => Expr::Constant(0.0),
                }
            }
            Expr::Binary { left, op, right } => {
                let dl = left.diff(var);
                let dr = right.diff(var);
                let l = (**left).clone();
                let r = (**right).clone();
                match op {
                    BinaryOp::Add => dl + dr,
                    BinaryOp::Sub => dl - dr,
                    BinaryOp::Mul => dl * &r + l * dr,
                    BinaryOp::Div => dl / &r - l * dr / r.powi(2),
                    BinaryOp::Pow => match r.as_constant() {
                        Some(c) => c * l.pow(c - 1.0) * dl,
                        None => {
                            let power = self.clone();
                            power * (dr * l.clone().ln() + r * dl / l)
                        }
                    },
                }
            }
        }
    }

    /// Gradient with respect to `vars`, one entry per variable.
    pub fn gradient(&self, vars: &[Symbol]) -> Vec<Expr> {
        vars.iter().map(|v| self.diff(v)).collect()
    }
}

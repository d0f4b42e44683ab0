use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::symbol::Symbol;

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Symbol(Symbol),
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
    Abs,
    Sign,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl UnaryOp {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            UnaryOp::Neg => -value,
            UnaryOp::Sin => value.sin(),
            UnaryOp::Cos => value.cos(),
            UnaryOp::Tan => value.tan(),
            UnaryOp::Exp => value.exp(),
            UnaryOp::Ln => value.ln(),
            UnaryOp::Sqrt => value.sqrt(),
            UnaryOp::Abs => value.abs(),
            UnaryOp::Sign => {
                if value > 0.0 {
                    1.0
                } else if value < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Function name used by the parser and by `Display` (`None` for negation).
    pub fn function_name(self) -> Option<&'static str> {
        match self {
            UnaryOp::Neg => None,
            UnaryOp::Sin => Some("sin"),
            UnaryOp::Cos => Some("cos"),
            UnaryOp::Tan => Some("tan"),
            UnaryOp::Exp => Some("exp"),
            UnaryOp::Ln => Some("ln"),
            UnaryOp::Sqrt => Some("sqrt"),
            UnaryOp::Abs => Some("abs"),
            UnaryOp::Sign => Some("sign"),
        }
    }

    pub fn from_function_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(UnaryOp::Sin),
            "cos" => Some(UnaryOp::Cos),
            "tan" => Some(UnaryOp::Tan),
            "exp" => Some(UnaryOp::Exp),
            "ln" | "log" => Some(UnaryOp::Ln),
            "sqrt" => Some(UnaryOp::Sqrt),
            "abs" => Some(UnaryOp::Abs),
            "sign" => Some(UnaryOp::Sign),
            _ => None,
        }
    }
}

impl BinaryOp {
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
            BinaryOp::Pow => left.powf(right),
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Pow => write!(f, "^"),
        }
    }
}

const NEG_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 5;

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr::Constant(value)
    }

    pub fn symbol(symbol: &Symbol) -> Self {
        Expr::Symbol(symbol.clone())
    }

    /// Build a unary node, folding constant arguments and double negation.
    pub fn unary(op: UnaryOp, arg: Expr) -> Self {
        match (op, arg) {
            (op, Expr::Constant(v)) => Expr::Constant(op.apply(v)),
            (
                UnaryOp::Neg,
                Expr::Unary {
                    op: UnaryOp::Neg,
                    arg,
                },
            ) => *arg,
            (op, arg) => Expr::Unary {
                op,
                arg: Box::new(arg),
            },
        }
    }

    /// Build a binary node, folding constants and arithmetic identities.
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        match (left.as_constant(), right.as_constant()) {
            (Some(l), Some(r)) => return Expr::Constant(op.apply(l, r)),
            (Some(l), None) => match op {
                BinaryOp::Add if l == 0.0 => return right,
                BinaryOp::Sub if l == 0.0 => return Expr::unary(UnaryOp::Neg, right),
                BinaryOp::Mul if l == 0.0 => return Expr::Constant(0.0),
                BinaryOp::Mul if l == 1.0 => return right,
                BinaryOp::Div if l == 0.0 => return Expr::Constant(0.0),
                _ => {}
            },
            (None, Some(r)) => match op {
                BinaryOp::Add | BinaryOp::Sub if r == 0.0 => return left,
                BinaryOp::Mul if r == 0.0 => return Expr::Constant(0.0),
                BinaryOp::Mul | BinaryOp::Div if r == 1.0 => return left,
                BinaryOp::Pow if r == 0.0 => return Expr::Constant(1.0),
                BinaryOp::Pow if r == 1.0 => return left,
                _ => {}
            },
            (None, None) => {}
        }
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Expr::Constant(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.as_constant().is_some()
    }

    pub fn sin(self) -> Self {
        Expr::unary(UnaryOp::Sin, self)
    }

    pub fn cos(self) -> Self {
        Expr::unary(UnaryOp::Cos, self)
    }

    pub fn tan(self) -> Self {
        Expr::unary(UnaryOp::Tan, self)
    }

    pub fn exp(self) -> Self {
        Expr::unary(UnaryOp::Exp, self)
    }

    pub fn ln(self) -> Self {
        Expr::unary(UnaryOp::Ln, self)
    }

    pub fn sqrt(self) -> Self {
        Expr::unary(UnaryOp::Sqrt, self)
    }

    pub fn abs(self) -> Self {
        Expr::unary(UnaryOp::Abs, self)
    }

    pub fn sign(self) -> Self {
        Expr::unary(UnaryOp::Sign, self)
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Expr::binary(self, BinaryOp::Pow, exponent.into())
    }

    pub fn powi(self, exponent: i32) -> Self {
        self.pow(f64::from(exponent))
    }

    /// Free symbols in order of first appearance (left to right).
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_symbols(&mut seen, &mut out);
        out
    }

    fn collect_symbols(&self, seen: &mut HashSet<u64>, out: &mut Vec<Symbol>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Symbol(s) => {
                if seen.insert(s.id()) {
                    out.push(s.clone());
                }
            }
            Expr::Unary { arg, .. } => arg.collect_symbols(seen, out),
            Expr::Binary { left, right, .. } => {
                left.collect_symbols(seen, out);
                right.collect_symbols(seen, out);
            }
        }
    }

    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        match self {
            Expr::Constant(_) => false,
            Expr::Symbol(s) => s == symbol,
            Expr::Unary { arg, .. } => arg.depends_on(symbol),
            Expr::Binary { left, right, .. } => left.depends_on(symbol) || right.depends_on(symbol),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Constant(v) if *v < 0.0 => NEG_PRECEDENCE,
            Expr::Constant(_) | Expr::Symbol(_) => ATOM_PRECEDENCE,
            Expr::Unary { op: UnaryOp::Neg, .. } => NEG_PRECEDENCE,
            Expr::Unary { .. } => ATOM_PRECEDENCE,
            Expr::Binary { op, .. } => op.precedence(),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Unary { op: UnaryOp::Neg, arg } => {
                write!(f, "-")?;
                write_operand(f, arg, arg.precedence() < NEG_PRECEDENCE)
            }
            Expr::Unary { op, arg } => {
                let name = op.function_name().unwrap_or("?");
                write!(f, "{name}({arg})")
            }
            Expr::Binary { left, op, right } => {
                let prec = op.precedence();
                // `^` is right-associative, the rest associate to the left.
                let (left_parens, right_parens) = if *op == BinaryOp::Pow {
                    (left.precedence() <= prec, right.precedence() < NEG_PRECEDENCE)
                } else {
                    (left.precedence() < prec, right.precedence() <= prec)
                };
                write_operand(f, left, left_parens)?;
                write!(f, " {op} ")?;
                write_operand(f, right, right_parens)
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Constant(f64::from(value))
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::Symbol(symbol)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Expr::Symbol(symbol.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(self, $op, rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(self.clone(), $op, rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for Symbol {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(Expr::Symbol(self), $op, rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Symbol {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(Expr::Symbol(self.clone()), $op, rhs.into())
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary(Expr::Constant(self), $op, rhs)
            }
        }

        impl $trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary(Expr::Constant(self), $op, rhs.clone())
            }
        }

        impl $trait<Symbol> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Symbol) -> Expr {
                Expr::binary(Expr::Constant(self), $op, Expr::Symbol(rhs))
            }
        }

        impl $trait<&Symbol> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Symbol) -> Expr {
                Expr::binary(Expr::Constant(self), $op, Expr::Symbol(rhs.clone()))
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self.clone())
    }
}

impl Neg for Symbol {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, Expr::Symbol(self))
    }
}

impl Neg for &Symbol {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, Expr::Symbol(self.clone()))
    }
}

impl std::iter::Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Self {
        iter.fold(Expr::Constant(0.0), |acc, e| acc + e)
    }
}

impl<'a> std::iter::Sum<&'a Expr> for Expr {
    fn sum<I: Iterator<Item = &'a Expr>>(iter: I) -> Self {
        iter.fold(Expr::Constant(0.0), |acc, e| acc + e)
    }
}

use quibble_expr::{Expr, Symbol};

/// A nonlinear program in symbolic form
///
/// ```text
/// minimize    f(x)
/// subject to  lbg <= g(x) <= ubg
///             lbx <=   x  <= ubx
/// ```
///
/// Bounds are not part of the program; they are supplied per invocation so a
/// single instantiated engine can be re-run with new bounds and guesses.
#[derive(Debug, Clone)]
pub struct Nlp {
    /// Decision variables, in solver order
    pub x: Vec<Symbol>,
    /// Scalar objective
    pub f: Expr,
    /// Constraint expressions, in solver order
    pub g: Vec<Expr>,
}

impl Nlp {
    pub fn new(x: Vec<Symbol>, f: Expr, g: Vec<Expr>) -> Self {
        Self { x, f, g }
    }

    pub fn num_variables(&self) -> usize {
        self.x.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.g.len()
    }
}

/// Arguments of one engine invocation.
#[derive(Debug, Clone, Copy)]
pub struct InvokeArgs<'a> {
    /// Initial guess
    pub x0: &'a [f64],
    pub lbx: &'a [f64],
    pub ubx: &'a [f64],
    pub lbg: &'a [f64],
    pub ubg: &'a [f64],
}

impl<'a> InvokeArgs<'a> {
    /// Check dimensions and bound ordering against a program with `n`
    /// variables and `m` constraints.
    pub fn validate(&self, n: usize, m: usize) -> Result<(), String> {
        for (label, values, expected) in [
            ("x0", self.x0, n),
            ("lbx", self.lbx, n),
            ("ubx", self.ubx, n),
            ("lbg", self.lbg, m),
            ("ubg", self.ubg, m),
        ] {
            if values.len() != expected {
                return Err(format!(
                    "{label} has length {}, expected {expected}",
                    values.len()
                ));
            }
        }
        for (label, lower, upper) in [("x", self.lbx, self.ubx), ("g", self.lbg, self.ubg)] {
            for (i, (l, u)) in lower.iter().zip(upper).enumerate() {
                if l.is_nan() || u.is_nan() {
                    return Err(format!("bound on {label}[{i}] is NaN"));
                }
                if l > u {
                    return Err(format!("bounds on {label}[{i}] are crossed: {l} > {u}"));
                }
            }
        }
        Ok(())
    }
}

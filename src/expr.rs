//! Expression tree definitions and helpers.

use std::collections::BTreeSet;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

pub type Rational = BigRational;

/// Immutable expression tree. Children are owned boxes; rewrites build new trees.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Expr {
    Variable(String),
    Constant(Rational),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Tan(Box<Expr>),
    Asin(Box<Expr>),
    Acos(Box<Expr>),
    Atan(Box<Expr>),
    Exp(Box<Expr>),
    Log(Box<Expr>),
    Abs(Box<Expr>),
    /// `order`-th derivative of the function `var` with respect to `wrt`.
    Derivative { var: String, wrt: String, order: u32 },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn constant(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::new(num.into(), den.into()))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::from_integer(value.into()))
    }

    pub fn rational(value: Rational) -> Self {
        Expr::Constant(value)
    }

    pub fn derivative(var: impl Into<String>, wrt: impl Into<String>, order: u32) -> Self {
        Expr::Derivative {
            var: var.into(),
            wrt: wrt.into(),
            order,
        }
    }

    /// Euler's number, kept symbolic as `exp(1)`.
    pub fn e() -> Self {
        Expr::Exp(one().boxed())
    }

    pub fn sqrt(arg: Expr) -> Self {
        pow(arg, Expr::constant(1, 2))
    }

    /// The symbol `d<var>` used when writing an equation in differential form.
    pub fn differential(var: &str) -> Self {
        Expr::Variable(format!("d{var}"))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_one())
    }

    pub fn as_variable(&self) -> Option<&str> {
        if let Expr::Variable(name) = self {
            Some(name)
        } else {
            None
        }
    }

    pub fn as_constant(&self) -> Option<&Rational> {
        if let Expr::Constant(c) = self {
            Some(c)
        } else {
            None
        }
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Argument of a single-child node (negation or function application).
    pub fn unary_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Neg(a)
            | Expr::Sin(a)
            | Expr::Cos(a)
            | Expr::Tan(a)
            | Expr::Asin(a)
            | Expr::Acos(a)
            | Expr::Atan(a)
            | Expr::Exp(a)
            | Expr::Log(a)
            | Expr::Abs(a) => Some(a),
            _ => None,
        }
    }

    /// Rebuild a single-child node around a new argument; other nodes are returned unchanged.
    pub fn with_unary_arg(&self, arg: Expr) -> Expr {
        match self {
            Expr::Neg(_) => Expr::Neg(arg.boxed()),
            Expr::Sin(_) => Expr::Sin(arg.boxed()),
            Expr::Cos(_) => Expr::Cos(arg.boxed()),
            Expr::Tan(_) => Expr::Tan(arg.boxed()),
            Expr::Asin(_) => Expr::Asin(arg.boxed()),
            Expr::Acos(_) => Expr::Acos(arg.boxed()),
            Expr::Atan(_) => Expr::Atan(arg.boxed()),
            Expr::Exp(_) => Expr::Exp(arg.boxed()),
            Expr::Log(_) => Expr::Log(arg.boxed()),
            Expr::Abs(_) => Expr::Abs(arg.boxed()),
            other => other.clone(),
        }
    }

    pub fn binary_args(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
                Some((a, b))
            }
            _ => None,
        }
    }

    /// True when the symbol `name` occurs, either as a variable or as the function of a derivative
    /// marker. The `wrt` variable of a marker does not count.
    pub fn contains_var(&self, name: &str) -> bool {
        match self {
            Expr::Variable(v) => v == name,
            Expr::Constant(_) => false,
            Expr::Derivative { var, .. } => var == name,
            other => {
                if let Some((a, b)) = other.binary_args() {
                    a.contains_var(name) || b.contains_var(name)
                } else {
                    other.unary_arg().is_some_and(|a| a.contains_var(name))
                }
            }
        }
    }

    pub fn contains_derivative(&self) -> bool {
        self.max_derivative_order().is_some()
    }

    /// Highest derivative order appearing in the tree.
    pub fn max_derivative_order(&self) -> Option<u32> {
        match self {
            Expr::Derivative { order, .. } => Some(*order),
            Expr::Variable(_) | Expr::Constant(_) => None,
            other => {
                if let Some((a, b)) = other.binary_args() {
                    match (a.max_derivative_order(), b.max_derivative_order()) {
                        (Some(x), Some(y)) => Some(x.max(y)),
                        (x, y) => x.or(y),
                    }
                } else {
                    other.unary_arg().and_then(Expr::max_derivative_order)
                }
            }
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Variable(v) => {
                out.insert(v.clone());
            }
            Expr::Constant(_) => {}
            Expr::Derivative { var, .. } => {
                out.insert(var.clone());
            }
            other => {
                if let Some((a, b)) = other.binary_args() {
                    a.collect_symbols(out);
                    b.collect_symbols(out);
                } else if let Some(a) = other.unary_arg() {
                    a.collect_symbols(out);
                }
            }
        }
    }

    /// Node count.
    pub fn size(&self) -> usize {
        if let Some((a, b)) = self.binary_args() {
            1 + a.size() + b.size()
        } else if let Some(a) = self.unary_arg() {
            1 + a.size()
        } else {
            1
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::format::pretty(self))
    }
}

/// Arbitrary integration constants are named `C`, `C1`, `C2`, ...
pub fn is_arbitrary_constant(name: &str) -> bool {
    name.strip_prefix('C')
        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
}

pub fn zero() -> Expr {
    Expr::Constant(Rational::zero())
}

pub fn one() -> Expr {
    Expr::Constant(Rational::one())
}

pub fn int(value: i64) -> Expr {
    Expr::integer(value)
}

pub fn rational(num: i64, den: i64) -> Rational {
    Rational::new(num.into(), den.into())
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    Expr::Pow(base.boxed(), exp.boxed())
}

pub fn add(a: Expr, b: Expr) -> Expr {
    Expr::Add(a.boxed(), b.boxed())
}

pub fn sub(a: Expr, b: Expr) -> Expr {
    Expr::Sub(a.boxed(), b.boxed())
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    Expr::Mul(a.boxed(), b.boxed())
}

pub fn div(a: Expr, b: Expr) -> Expr {
    Expr::Div(a.boxed(), b.boxed())
}

pub fn neg(a: Expr) -> Expr {
    Expr::Neg(a.boxed())
}

pub fn exp(a: Expr) -> Expr {
    Expr::Exp(a.boxed())
}

pub fn ln(a: Expr) -> Expr {
    Expr::Log(a.boxed())
}

pub fn abs(a: Expr) -> Expr {
    Expr::Abs(a.boxed())
}

pub fn sin(a: Expr) -> Expr {
    Expr::Sin(a.boxed())
}

pub fn cos(a: Expr) -> Expr {
    Expr::Cos(a.boxed())
}

pub fn tan(a: Expr) -> Expr {
    Expr::Tan(a.boxed())
}

pub fn atan(a: Expr) -> Expr {
    Expr::Atan(a.boxed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_marker_counts_its_function_only() {
        let d = Expr::derivative("y", "x", 2);
        assert!(d.contains_var("y"));
        assert!(!d.contains_var("x"));
        assert_eq!(mul(d, Expr::var("x")).max_derivative_order(), Some(2));
    }

    #[test]
    fn arbitrary_constant_names() {
        assert!(is_arbitrary_constant("C"));
        assert!(is_arbitrary_constant("C12"));
        assert!(!is_arbitrary_constant("Cx"));
        assert!(!is_arbitrary_constant("x"));
    }
}

//! Symbolic simplification, normalization, and substitution utilities.
//!
//! [`simplify`] applies cheap local rewrites. [`normalize`] goes through the canonical
//! sum-of-monomials form and is what zero testing and equivalence checks are built on.

pub(crate) mod canonical;
mod rules;
mod substitute;

use std::collections::BTreeMap;

use crate::calculus::differentiate;
use crate::error::{Result, SolveError};
use crate::expr::{div, sub, Expr, Rational};

pub(crate) use canonical::Sum;
use canonical::Monomial;
pub use rules::{
    simplify, simplify_add, simplify_div, simplify_fully, simplify_mul, simplify_neg, simplify_pow,
    simplify_sub, simplify_with_limit,
};
pub use substitute::{replace, substitute, substitute_derivative, substitute_many};

/// Sample points used when a symbol must be shown to drop out of an expression.
const SAMPLE_POINTS: [i64; 7] = [0, 1, -1, 2, 3, -2, 5];

/// Canonical form of `expr`. Falls back to local rewriting when expansion would grow too large.
pub fn normalize(expr: Expr) -> Expr {
    match try_normalize(&expr) {
        Ok(out) => out,
        Err(err) => {
            tracing::debug!(target: "simplify", error = %err, "canonical form unavailable");
            simplify_fully(expr)
        }
    }
}

pub fn try_normalize(expr: &Expr) -> Result<Expr> {
    Ok(Sum::from_expr(expr)?.cancel()?.to_expr())
}

/// True when `expr` is identically zero after bringing it over a common denominator.
pub fn is_zero(expr: &Expr) -> Result<bool> {
    let (num, _) = Sum::from_expr(expr)?.together()?;
    Ok(num.is_zero())
}

pub fn equivalent(a: &Expr, b: &Expr) -> Result<bool> {
    is_zero(&sub(a.clone(), b.clone()))
}

/// Whether `expr` genuinely varies with `var`, as opposed to mentioning it in a way that cancels.
pub fn depends_on(expr: &Expr, var: &str) -> Result<bool> {
    let canonical = try_normalize(expr)?;
    if !canonical.contains_var(var) {
        return Ok(false);
    }
    Ok(!is_zero(&differentiate(var, &canonical))?)
}

/// Rewrites an expression known not to depend on `var` without mentioning it, by evaluating at
/// a point where it is defined.
pub fn eliminate(expr: &Expr, var: &str) -> Result<Expr> {
    let canonical = try_normalize(expr)?;
    if !canonical.contains_var(var) {
        return Ok(canonical);
    }
    let (num, den) = Sum::from_expr(&canonical)?.together()?;
    let (num, den) = (num.to_expr(), den.to_expr());
    for point in SAMPLE_POINTS {
        let value = Expr::integer(point);
        let at = |e: &Expr| try_normalize(&substitute(e, var, &value));
        let Ok(d) = at(&den) else { continue };
        if is_zero(&d).unwrap_or(true) {
            continue;
        }
        let Ok(n) = at(&num) else { continue };
        return try_normalize(&div(n, d));
    }
    Err(SolveError::unsolvable(format!(
        "could not eliminate {var} from {expr}"
    )))
}

/// Coefficients of the powers of `var` in `expr`, or `None` when `var` also occurs inside
/// another function.
pub fn collect_powers(expr: &Expr, var: &str) -> Result<Option<BTreeMap<Rational, Expr>>> {
    let sum = Sum::from_expr(expr)?.cancel()?;
    Ok(sum.collect_powers(var).map(|powers| {
        powers
            .into_iter()
            .map(|(k, coeff)| (k, coeff.to_expr()))
            .collect()
    }))
}

/// `(a, b)` with `expr = a * var + b`, both free of `var`.
pub fn linear_coefficients(expr: &Expr, var: &str) -> Result<Option<(Expr, Expr)>> {
    let Some(powers) = collect_powers(expr, var)? else {
        return Ok(None);
    };
    if powers
        .keys()
        .any(|k| !(k == &Rational::from_integer(0.into()) || k == &Rational::from_integer(1.into())))
    {
        return Ok(None);
    }
    let get = |k: i64| {
        powers
            .get(&Rational::from_integer(k.into()))
            .cloned()
            .unwrap_or_else(crate::expr::zero)
    };
    Ok(Some((get(1), get(0))))
}

/// Numerator and denominator of `expr` over a common denominator.
pub fn together(expr: &Expr) -> Result<(Expr, Expr)> {
    let (num, den) = Sum::from_expr(expr)?.together()?;
    Ok((num.to_expr(), den.to_expr()))
}

/// Splits `expr` into a numeric coefficient and the rest.
pub fn split_coefficient(expr: &Expr) -> Result<(Rational, Expr)> {
    let sum = Sum::from_expr(expr)?;
    match sum.single_term() {
        Some((m, c)) => Ok((c.clone(), Sum::single(Rational::from_integer(1.into()), m.clone()).to_expr())),
        None if sum.is_zero() => Ok((Rational::from_integer(0.into()), crate::expr::one())),
        None => Ok((Rational::from_integer(1.into()), sum.to_expr())),
    }
}

/// Splits a product into the factors that mention `var` and the rest, numeric coefficient
/// included, so `3 x sin(y) e^{x + y}` gives `(x e^x, 3 sin(y) e^y)`. A sum that is not a single
/// product goes whole to the side of `var` when it mentions it.
pub fn split_factors(expr: &Expr, var: &str) -> Result<(Expr, Expr)> {
    let sum = Sum::from_expr(expr)?.cancel()?;
    let Some((m, c)) = sum.single_term() else {
        let whole = sum.to_expr();
        return Ok(if whole.contains_var(var) {
            (whole, crate::expr::one())
        } else {
            (crate::expr::one(), whole)
        });
    };
    let (with, without): (BTreeMap<Expr, Rational>, BTreeMap<Expr, Rational>) = m
        .powers()
        .iter()
        .map(|(a, k)| (a.clone(), k.clone()))
        .partition(|(a, _)| a.contains_var(var));
    let (mut exp_with, mut exp_without) = (Sum::zero(), Sum::zero());
    for (t, k) in m.exp_arg().map(Sum::terms).into_iter().flatten() {
        let piece = Sum::single(k.clone(), t.clone());
        if t.contains_var(var) {
            exp_with = exp_with.add(&piece);
        } else {
            exp_without = exp_without.add(&piece);
        }
    }
    let part = Monomial::from_parts(with, Some(exp_with));
    let rest = Monomial::from_parts(without, Some(exp_without));
    Ok((
        Sum::single(Rational::from_integer(1.into()), part).to_expr(),
        Sum::single(c.clone(), rest).to_expr(),
    ))
}

/// Pulls a common monomial factor out of a sum, so `x ln|x| + C x` reads `x (ln|x| + C)`.
/// Anything else comes back in canonical form.
pub fn factor_content(expr: &Expr) -> Result<Expr> {
    let sum = Sum::from_expr(expr)?.cancel()?;
    if sum.len() < 2 {
        return Ok(sum.to_expr());
    }
    let (lead, g, prim) = sum.split_content();
    let pulls_out = !g.is_one()
        && g.exp_arg().is_none()
        && g.powers().values().all(|k| k > &Rational::from_integer(0.into()));
    if !pulls_out {
        return Ok(sum.to_expr());
    }
    Ok(crate::expr::mul(Sum::single(lead, g).to_expr(), prim.to_expr()))
}

/// Removes every absolute value. Used where the sign can be absorbed into an arbitrary constant.
pub fn strip_abs(expr: &Expr) -> Expr {
    replace(expr, &|e| match e {
        Expr::Abs(inner) => Some(strip_abs(inner)),
        _ => None,
    })
}

/// One canonical term split into its parts: `coeff * Π atom^k * exp(exp)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub coeff: Rational,
    pub factors: Vec<(Expr, Rational)>,
    pub exp: Option<Expr>,
}

impl Term {
    pub fn contains_var(&self, var: &str) -> bool {
        self.factors.iter().any(|(a, _)| a.contains_var(var))
            || self.exp.as_ref().is_some_and(|e| e.contains_var(var))
    }

    pub fn to_expr(&self) -> Expr {
        let mut out = Expr::Constant(self.coeff.clone());
        for (atom, k) in &self.factors {
            out = crate::expr::mul(out, crate::expr::pow(atom.clone(), Expr::Constant(k.clone())));
        }
        if let Some(arg) = &self.exp {
            out = crate::expr::mul(out, crate::expr::exp(arg.clone()));
        }
        normalize(out)
    }
}

/// Canonical terms of `expr` in decomposed form.
pub fn decompose(expr: &Expr) -> Result<Vec<Term>> {
    let sum = Sum::from_expr(expr)?;
    Ok(sum
        .terms()
        .map(|(m, c)| Term {
            coeff: c.clone(),
            factors: m.powers().iter().map(|(a, k)| (a.clone(), k.clone())).collect(),
            exp: m.exp_arg().map(Sum::to_expr),
        })
        .collect())
}

/// Terms of the canonical sum, each already in canonical form.
pub fn terms(expr: &Expr) -> Result<Vec<Expr>> {
    let sum = Sum::from_expr(expr)?;
    Ok(sum
        .terms()
        .map(|(m, c)| Sum::single(c.clone(), m.clone()).to_expr())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, int, ln, mul, pow};

    #[test]
    fn hidden_dependence_is_eliminated() {
        // ln|2x| - ln|x| does not depend on x
        let x = Expr::var("x");
        let e = sub(
            ln(crate::expr::abs(mul(int(2), x.clone()))),
            ln(crate::expr::abs(x)),
        );
        assert!(!depends_on(&e, "x").unwrap());
        assert_eq!(eliminate(&e, "x").unwrap(), ln(int(2)));
    }

    #[test]
    fn common_factor_is_pulled_out() {
        let x = Expr::var("x");
        let c = Expr::var("C");
        let e = add(mul(x.clone(), ln(crate::expr::abs(x.clone()))), mul(c.clone(), x.clone()));
        match factor_content(&e).unwrap() {
            Expr::Mul(a, b) => {
                assert_eq!(*a, x);
                assert!(equivalent(&b, &add(ln(crate::expr::abs(x)), c)).unwrap());
            }
            other => panic!("expected a product, got {other}"),
        }
    }

    #[test]
    fn collects_powers_of_a_variable() {
        let y = Expr::var("y");
        let e = add(mul(int(3), pow(y.clone(), int(2))), y);
        let powers = collect_powers(&e, "y").unwrap().unwrap();
        assert_eq!(powers.len(), 2);
        assert_eq!(powers[&Rational::from_integer(2.into())], int(3));
    }
}

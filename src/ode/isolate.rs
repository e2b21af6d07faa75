//! Solving `lhs = rhs` for the dependent variable by undoing one outer operation at a time.

use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::Result;
use crate::expr::{self, add, div, mul, pow, sub, Expr, Rational};
use crate::simplify::{decompose, linear_coefficients, normalize, strip_abs, Term};

use super::{Solution, Workspace};

const MAX_INVERSIONS: usize = 8;

/// Turns `lhs = rhs` into `var = ...` when every step is invertible, otherwise into a tidy
/// implicit relation with the `var` terms on the left.
pub(crate) fn finish(lhs: &Expr, rhs: &Expr, var: &str, ws: &Workspace) -> Result<Solution> {
    let constants = ws.constants.used();
    if let Some(value) = isolate(lhs, rhs, var, &constants)? {
        let rhs = ws.polish(&ws.absorb(&value));
        return Ok(Solution {
            lhs: Expr::var(var),
            rhs,
            constants,
        });
    }
    let (lhs, rhs) = implicit(lhs, rhs, var)?;
    Ok(Solution {
        lhs,
        rhs: ws.absorb(&rhs),
        constants,
    })
}

/// `Some(value)` with `var = value`.
pub(crate) fn isolate(
    lhs: &Expr,
    rhs: &Expr,
    var: &str,
    constants: &[String],
) -> Result<Option<Expr>> {
    let (mut lhs, mut rhs) = (lhs.clone(), rhs.clone());
    for _ in 0..MAX_INVERSIONS {
        let (left, right) = split_sides(&lhs, &rhs, var)?;
        if let Some((a, b)) = linear_coefficients(&left, var)? {
            if !a.is_zero() && !a.contains_var(var) {
                return Ok(Some(normalize(div(sub(right, b), a))));
            }
        }
        let terms = decompose(&left)?;
        let [term] = terms.as_slice() else {
            tracing::debug!(target: "solver", %left, "several terms in {var}, leaving implicit");
            return Ok(None);
        };
        let Some((inner, outer, right)) = peel(term, right, var, constants) else {
            return Ok(None);
        };
        tracing::trace!(target: "solver", %outer, "inverted");
        lhs = inner;
        rhs = right;
    }
    Ok(None)
}

/// Moves terms free of `var` to the right.
fn split_sides(lhs: &Expr, rhs: &Expr, var: &str) -> Result<(Expr, Expr)> {
    let mut left = expr::zero();
    let mut right = expr::zero();
    for term in decompose(&sub(lhs.clone(), rhs.clone()))? {
        if term.contains_var(var) {
            left = add(left, term.to_expr());
        } else {
            right = sub(right, term.to_expr());
        }
    }
    Ok((normalize(left), normalize(right)))
}

/// Undoes the outermost operation of a single term: `(argument, description, new right side)`.
fn peel(term: &Term, right: Expr, var: &str, constants: &[String]) -> Option<(Expr, String, Expr)> {
    let (dependent_exp, free_exp) = match &term.exp {
        Some(arg) if arg.contains_var(var) => (Some(arg), None),
        other => (None, other.clone()),
    };
    let mut scale = Term {
        coeff: term.coeff.clone(),
        factors: Vec::new(),
        exp: free_exp,
    };
    let mut dependent = Vec::new();
    for (atom, k) in &term.factors {
        if atom.contains_var(var) {
            dependent.push((atom.clone(), k.clone()));
        } else {
            scale.factors.push((atom.clone(), k.clone()));
        }
    }
    let right = normalize(div(right, scale.to_expr()));
    match (dependent.as_slice(), dependent_exp) {
        ([], Some(arg)) => {
            Some((arg.clone(), "exp".into(), normalize(expr::ln(right))))
        }
        ([(atom, k)], None) if k.is_one() => invert(atom, right, constants),
        ([(atom, k)], None) => {
            // an even numerator leaves a ± ambiguity that is kept implicit
            if k.numer().is_even() {
                return None;
            }
            let root = Expr::Constant(k.recip());
            Some((atom.clone(), format!("power {k}"), normalize(pow(right, root))))
        }
        _ => None,
    }
}

fn invert(atom: &Expr, right: Expr, constants: &[String]) -> Option<(Expr, String, Expr)> {
    let out = match atom {
        Expr::Log(arg) => {
            let inner = match &**arg {
                Expr::Abs(u) => (**u).clone(),
                other => other.clone(),
            };
            (inner, "ln".into(), exponentiate(&right, constants))
        }
        Expr::Abs(u) => ((**u).clone(), "abs".into(), right),
        Expr::Atan(u) => ((**u).clone(), "atan".into(), expr::tan(right)),
        Expr::Tan(u) => ((**u).clone(), "tan".into(), expr::atan(right)),
        Expr::Asin(u) => ((**u).clone(), "asin".into(), expr::sin(right)),
        Expr::Acos(u) => ((**u).clone(), "acos".into(), expr::cos(right)),
        Expr::Sin(u) => ((**u).clone(), "sin".into(), Expr::Asin(right.boxed())),
        Expr::Cos(u) => ((**u).clone(), "cos".into(), Expr::Acos(right.boxed())),
        Expr::Exp(u) => ((**u).clone(), "exp".into(), normalize(expr::ln(right))),
        _ => return None,
    };
    Some(out)
}

/// `e^(A + kC)` becomes `C e^A`; the sign of the logarithm's argument goes into `C` as well.
fn exponentiate(value: &Expr, constants: &[String]) -> Expr {
    for name in constants {
        let Ok(Some((coeff, rest))) = linear_coefficients(value, name) else {
            continue;
        };
        if coeff.as_constant().is_some_and(|k| !k.is_zero()) {
            let base = strip_abs(&normalize(expr::exp(rest)));
            return normalize(mul(Expr::var(name.clone()), base));
        }
    }
    strip_abs(&normalize(expr::exp(value.clone())))
}

/// Implicit relation with every `var` term on the left and no fractional coefficients there.
fn implicit(lhs: &Expr, rhs: &Expr, var: &str) -> Result<(Expr, Expr)> {
    let (left, right) = split_sides(lhs, rhs, var)?;
    let terms = decompose(&left)?;
    let scale = match terms.as_slice() {
        [single] => single.coeff.recip(),
        many => {
            let lcm = many
                .iter()
                .fold(num_bigint::BigInt::one(), |acc, t| acc.lcm(t.coeff.denom()));
            let sign = if many.first().is_some_and(|t| t.coeff.is_negative()) {
                -Rational::one()
            } else {
                Rational::one()
            };
            Rational::from_integer(lcm) * sign
        }
    };
    if scale.is_zero() || scale.is_one() {
        return Ok((left, right));
    }
    let k = Expr::Constant(scale);
    Ok((
        normalize(mul(k.clone(), left)),
        normalize(mul(k, right)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{abs, int, ln};
    use crate::simplify::equivalent;

    fn constants() -> Vec<String> {
        vec!["C".to_string()]
    }

    #[test]
    fn logarithm_with_constant_becomes_a_multiplier() {
        // ln|y| = x + C  ->  y = C e^x
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let out = isolate(&ln(abs(y)), &add(x.clone(), Expr::var("C")), "y", &constants())
            .unwrap()
            .unwrap();
        assert!(equivalent(&out, &mul(Expr::var("C"), expr::exp(x))).unwrap());
    }

    #[test]
    fn reciprocal_is_inverted() {
        // -1/y = x + C  ->  y = -1/(x + C)
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let lhs = expr::neg(div(int(1), y));
        let rhs = add(x.clone(), Expr::var("C"));
        let out = isolate(&lhs, &rhs, "y", &constants()).unwrap().unwrap();
        let expected = expr::neg(div(int(1), add(x, Expr::var("C"))));
        assert!(equivalent(&out, &expected).unwrap());
    }

    #[test]
    fn even_powers_stay_implicit() {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let lhs = div(pow(y, int(2)), int(2));
        assert_eq!(isolate(&lhs, &x, "y", &constants()).unwrap(), None);
        let (l, r) = implicit(&lhs, &x, "y").unwrap();
        assert!(equivalent(&l, &pow(Expr::var("y"), int(2))).unwrap());
        assert!(equivalent(&r, &mul(int(2), Expr::var("x"))).unwrap());
    }

    #[test]
    fn arctangent_is_undone() {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let out = isolate(&expr::atan(y), &x, "y", &constants()).unwrap().unwrap();
        assert!(equivalent(&out, &expr::tan(Expr::var("x"))).unwrap());
    }
}

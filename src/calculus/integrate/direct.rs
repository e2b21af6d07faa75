use num_traits::{One, Zero};

use crate::expr::{abs, add, cos, div, exp, int, ln, mul, pow, sin, sub, Expr, Rational};
use crate::simplify::collect_powers;

use super::common::{linear_parts, over};

/// Table integrals for a single factor, mostly of a linear argument, with any constant factor
/// removed.
pub(super) fn integrate_factors(
    factors: &[(Expr, Rational)],
    exp_arg: Option<&Expr>,
    var: &str,
) -> Option<Expr> {
    match (factors, exp_arg) {
        ([], None) => Some(Expr::var(var)),
        ([], Some(arg)) => {
            let (a, _) = linear_parts(arg, var)?;
            Some(over(exp(arg.clone()), a))
        }
        ([(base, k)], None) => power_of_linear(base, k, var)
            .or_else(|| {
                if k.is_one() {
                    function_of_linear(base, var)
                } else {
                    None
                }
            })
            .or_else(|| secant_squared(base, k, var))
            .or_else(|| reciprocal_trig(base, k, var))
            .or_else(|| arctangent(base, k, var)),
        _ => None,
    }
}

/// `∫ L^k` for linear `L`.
fn power_of_linear(base: &Expr, k: &Rational, var: &str) -> Option<Expr> {
    let (a, _) = linear_parts(base, var)?;
    if *k == -Rational::one() {
        return Some(over(ln(abs(base.clone())), a));
    }
    let k1 = k + Rational::one();
    Some(over(
        pow(base.clone(), Expr::Constant(k1.clone())),
        mul(a, Expr::Constant(k1)),
    ))
}

fn function_of_linear(f: &Expr, var: &str) -> Option<Expr> {
    let arg = match f {
        Expr::Log(inner) => match &**inner {
            Expr::Abs(u) => &**u,
            other => other,
        },
        other => other.unary_arg()?,
    };
    let (a, _) = linear_parts(arg, var)?;
    let u = arg.clone();
    let body = match f {
        Expr::Sin(_) => Expr::Neg(cos(u).boxed()),
        Expr::Cos(_) => sin(u),
        Expr::Tan(_) => Expr::Neg(ln(abs(cos(u))).boxed()),
        // ∫ ln|u| du = u ln|u| - u
        Expr::Log(_) => sub(mul(u.clone(), ln(abs(u.clone()))), u),
        Expr::Atan(_) => sub(
            mul(u.clone(), Expr::Atan(u.clone().boxed())),
            mul(
                Expr::constant(1, 2),
                ln(Expr::Add(int(1).boxed(), pow(u, int(2)).boxed())),
            ),
        ),
        Expr::Asin(_) => Expr::Add(
            mul(u.clone(), Expr::Asin(u.clone().boxed())).boxed(),
            Expr::sqrt(sub(int(1), pow(u, int(2)))).boxed(),
        ),
        Expr::Acos(_) => sub(
            mul(u.clone(), Expr::Acos(u.clone().boxed())),
            Expr::sqrt(sub(int(1), pow(u, int(2)))),
        ),
        Expr::Exp(_) => exp(u),
        _ => return None,
    };
    Some(over(body, a))
}

/// `∫ 1/cos^2(L) = tan(L)/a`.
fn secant_squared(base: &Expr, k: &Rational, var: &str) -> Option<Expr> {
    let Expr::Cos(arg) = base else {
        return None;
    };
    if *k != Rational::from_integer((-2).into()) {
        return None;
    }
    let (a, _) = linear_parts(arg, var)?;
    Some(over(Expr::Tan(arg.clone()), a))
}

/// `∫ sec`, `∫ csc` and `∫ cot` of a linear argument.
fn reciprocal_trig(base: &Expr, k: &Rational, var: &str) -> Option<Expr> {
    if *k != -Rational::one() {
        return None;
    }
    let arg = base.unary_arg()?;
    let (a, _) = linear_parts(arg, var)?;
    let u = arg.clone();
    let body = match base {
        // ln|sec u + tan u|
        Expr::Cos(_) => ln(abs(add(div(int(1), cos(u.clone())), Expr::Tan(u.boxed())))),
        // ln|tan(u/2)|
        Expr::Sin(_) => ln(abs(Expr::Tan(div(u, int(2)).boxed()))),
        Expr::Tan(_) => ln(abs(sin(u))),
        _ => return None,
    };
    Some(over(body, a))
}

/// `∫ 1/(a x^2 + c) = atan(x √(a/c)) / √(a c)` when `c` is symbolic, read with `a c > 0`.
/// Numeric `c` is left to partial fractions, which knows its sign.
fn arctangent(base: &Expr, k: &Rational, var: &str) -> Option<Expr> {
    if *k != -Rational::one() {
        return None;
    }
    let powers = collect_powers(base, var).ok()??;
    let two = Rational::from_integer(2.into());
    if powers.keys().any(|p| !p.is_zero() && *p != two) {
        return None;
    }
    let (a, c) = (powers.get(&two)?, powers.get(&Rational::zero())?);
    if a.contains_var(var) || c.contains_var(var) || c.as_constant().is_some() {
        return None;
    }
    let scale = Expr::sqrt(div(a.clone(), c.clone()));
    Some(div(
        Expr::Atan(mul(scale, Expr::var(var)).boxed()),
        Expr::sqrt(mul(a.clone(), c.clone())),
    ))
}

//! Integration by parts for the product shapes that reduce in closed form.

use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::expr::{abs, add, cos, exp, int, mul, pow, sin, sub, Expr, Rational};
use crate::simplify::normalize;

use super::common::{coeff_of_var, over};

/// Highest polynomial degree handled by the tabular method.
const MAX_TABULAR_DEGREE: u32 = 12;

#[derive(Clone, Copy)]
enum Cyclic {
    Exp,
    Sin,
    Cos,
}

pub(super) fn integrate_by_parts(
    factors: &[(Expr, Rational)],
    exp_arg: Option<&Expr>,
    var: &str,
) -> Option<Expr> {
    exp_times_trig(factors, exp_arg, var)
        .or_else(|| tabular(factors, exp_arg, var))
        .or_else(|| power_times_log(factors, exp_arg, var))
}

/// `∫ e^{L1} sin(L2)` and `∫ e^{L1} cos(L2)`.
fn exp_times_trig(factors: &[(Expr, Rational)], exp_arg: Option<&Expr>, var: &str) -> Option<Expr> {
    let exp_arg = exp_arg?;
    let [(trig, k)] = factors else {
        return None;
    };
    if !k.is_one() {
        return None;
    }
    let a = coeff_of_var(exp_arg, var)?;
    let (arg, is_sin) = match trig {
        Expr::Sin(u) => (&**u, true),
        Expr::Cos(u) => (&**u, false),
        _ => return None,
    };
    let b = coeff_of_var(arg, var)?;
    let s = sin(arg.clone());
    let c = cos(arg.clone());
    let body = if is_sin {
        sub(mul(a.clone(), s), mul(b.clone(), c))
    } else {
        add(mul(a.clone(), c), mul(b.clone(), s))
    };
    let denom = add(pow(a, int(2)), pow(b, int(2)));
    Some(over(mul(exp(exp_arg.clone()), body), denom))
}

/// `∫ x^n G(L)` with `G` one of exp, sin, cos, by repeated parts.
fn tabular(factors: &[(Expr, Rational)], exp_arg: Option<&Expr>, var: &str) -> Option<Expr> {
    let x = Expr::var(var);
    let mut degree = None;
    let mut cyclic = None;
    for (atom, k) in factors {
        if *atom == x {
            if !k.is_integer() || !k.is_positive() {
                return None;
            }
            degree = Some(k.to_integer().to_u32()?);
        } else if k.is_one() {
            let kind = match atom {
                Expr::Sin(u) => (Cyclic::Sin, (**u).clone()),
                Expr::Cos(u) => (Cyclic::Cos, (**u).clone()),
                _ => return None,
            };
            if cyclic.replace(kind).is_some() {
                return None;
            }
        } else {
            return None;
        }
    }
    if let Some(arg) = exp_arg {
        if cyclic.replace((Cyclic::Exp, arg.clone())).is_some() {
            return None;
        }
    }
    let n = degree.filter(|n| *n <= MAX_TABULAR_DEGREE)?;
    let (kind, arg) = cyclic?;
    let a = coeff_of_var(&arg, var)?;

    // Σ (-1)^j n!/(n-j)! x^(n-j) G_(j+1)
    let mut total = Expr::Constant(Rational::zero());
    let mut falling = Rational::one();
    for j in 0..=n {
        let sign = if j % 2 == 0 { 1 } else { -1 };
        let coeff = falling.clone() * Rational::from_integer(sign.into());
        let power = pow(x.clone(), int(i64::from(n - j)));
        let anti = repeated_antiderivative(kind, &arg, &a, j + 1);
        total = add(total, mul(Expr::Constant(coeff), mul(power, anti)));
        falling *= Rational::from_integer((n - j).into());
    }
    Some(normalize(total))
}

/// The `m`-th antiderivative of `G(L)` where `L` has slope `a`.
fn repeated_antiderivative(kind: Cyclic, arg: &Expr, a: &Expr, m: u32) -> Expr {
    let scale = pow(a.clone(), int(-i64::from(m)));
    let u = arg.clone();
    let base = match kind {
        Cyclic::Exp => exp(u),
        // sin -> -cos -> -sin -> cos -> sin
        Cyclic::Sin => match m % 4 {
            1 => Expr::Neg(cos(u).boxed()),
            2 => Expr::Neg(sin(u).boxed()),
            3 => cos(u),
            _ => sin(u),
        },
        // cos -> sin -> -cos -> -sin -> cos
        Cyclic::Cos => match m % 4 {
            1 => sin(u),
            2 => Expr::Neg(cos(u).boxed()),
            3 => Expr::Neg(sin(u).boxed()),
            _ => cos(u),
        },
    };
    mul(scale, base)
}

/// `∫ x^n ln|x| = x^(n+1) ln|x|/(n+1) - x^(n+1)/(n+1)^2` for `n != -1`.
fn power_times_log(factors: &[(Expr, Rational)], exp_arg: Option<&Expr>, var: &str) -> Option<Expr> {
    if exp_arg.is_some() {
        return None;
    }
    let x = Expr::var(var);
    let mut power = Rational::zero();
    let mut log = None;
    for (atom, k) in factors {
        if *atom == x {
            power = k.clone();
        } else if k.is_one() && matches!(atom, Expr::Log(inner) if **inner == abs(x.clone()) || **inner == x) {
            log = Some(atom.clone());
        } else {
            return None;
        }
    }
    let log = log?;
    let n1 = power + Rational::one();
    if n1.is_zero() {
        return None;
    }
    let lifted = pow(x, Expr::Constant(n1.clone()));
    Some(normalize(sub(
        over(mul(lifted.clone(), log), Expr::Constant(n1.clone())),
        over(lifted, Expr::Constant(n1.clone() * n1)),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ln;

    #[test]
    fn cyclic_antiderivatives_follow_the_table() {
        let x = Expr::var("x");
        let second = repeated_antiderivative(Cyclic::Sin, &x, &int(1), 2);
        assert_eq!(normalize(second), normalize(Expr::Neg(sin(x).boxed())));
    }

    #[test]
    fn log_is_recognised_with_abs() {
        let x = Expr::var("x");
        let factors = vec![(ln(abs(x.clone())), Rational::one())];
        let expected = normalize(sub(mul(x.clone(), ln(abs(x.clone()))), x));
        assert_eq!(power_times_log(&factors, None, "x"), Some(expected));
    }
}

use crate::expr::{Expr, Rational};
use num_traits::Signed;

/// Plain-text rendering that the equation parser reads back.
pub fn pretty(expr: &Expr) -> String {
    fn pp(ctx: u8, expr: &Expr) -> String {
        match expr {
            Expr::Variable(v) => v.clone(),
            Expr::Constant(r) => show_rational(ctx, r),
            Expr::Derivative { var, order, .. } => {
                format!("{var}{}", "'".repeat(*order as usize))
            }

            Expr::Add(a, b) => {
                let s_a = pp(1, a);
                let (neg_b, b_inner) = split_neg(b);
                let s_b = pp(2, &b_inner);
                let body = format!("{s_a} {} {s_b}", if neg_b { "-" } else { "+" });
                bracket(ctx, 1, body)
            }

            Expr::Sub(a, b) => {
                let s_a = pp(1, a);
                let (neg_b, b_inner) = split_neg(b);
                let s_b = pp(2, &b_inner);
                let body = format!("{s_a} {} {s_b}", if neg_b { "+" } else { "-" });
                bracket(ctx, 1, body)
            }

            Expr::Mul(a, b) => {
                let (na, a_inner) = split_neg(a);
                let (nb, b_inner) = split_neg(b);
                let body = format!("{}*{}", pp(2, &a_inner), pp(3, &b_inner));
                if na ^ nb {
                    bracket(ctx, 2, format!("-{body}"))
                } else {
                    bracket(ctx, 2, body)
                }
            }

            Expr::Div(a, b) => {
                let (na, a_inner) = split_neg(a);
                let (nb, b_inner) = split_neg(b);
                let body = format!("{}/{}", pp(2, &a_inner), pp(3, &b_inner));
                if na ^ nb {
                    bracket(ctx, 2, format!("-{body}"))
                } else {
                    bracket(ctx, 2, body)
                }
            }

            Expr::Pow(a, b) if is_half(b) => format!("sqrt({})", pp(0, a)),
            Expr::Pow(a, b) => bracket(ctx, 3, format!("{}^{}", pp(4, a), pp(4, b))),

            Expr::Neg(a) => {
                let (is_neg, inner) = split_neg(a);
                if is_neg {
                    pp(ctx, &inner)
                } else {
                    bracket(ctx, 2, format!("-{}", pp(2, &inner)))
                }
            }

            Expr::Exp(a) if a.is_one() => "e".to_string(),
            Expr::Sin(a) => format!("sin({})", pp(0, a)),
            Expr::Cos(a) => format!("cos({})", pp(0, a)),
            Expr::Tan(a) => format!("tan({})", pp(0, a)),
            Expr::Atan(a) => format!("atan({})", pp(0, a)),
            Expr::Asin(a) => format!("asin({})", pp(0, a)),
            Expr::Acos(a) => format!("acos({})", pp(0, a)),
            Expr::Exp(a) => format!("exp({})", pp(0, a)),
            Expr::Log(a) => format!("ln({})", pp(0, a)),
            Expr::Abs(a) => format!("abs({})", pp(0, a)),
        }
    }

    pp(0, expr)
}

pub(crate) fn is_half(expr: &Expr) -> bool {
    matches!(expr, Expr::Constant(r) if *r == Rational::new(1.into(), 2.into()))
}

pub(crate) fn split_neg(expr: &Expr) -> (bool, Expr) {
    match expr {
        Expr::Neg(inner) => (true, *inner.clone()),
        Expr::Constant(r) if r.is_negative() => (true, Expr::Constant(-r)),
        other => (false, other.clone()),
    }
}

fn bracket(ctx: u8, prec: u8, body: String) -> String {
    if prec < ctx {
        format!("({body})")
    } else {
        body
    }
}

fn show_rational(ctx: u8, r: &Rational) -> String {
    let body = if r.is_integer() {
        format!("{}", r.numer())
    } else {
        format!("{}/{}", r.numer(), r.denom())
    };
    if r.is_negative() || !r.is_integer() {
        bracket(ctx, 2, body)
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, div, exp, int, mul, neg, pow};

    #[test]
    fn fractional_exponents_are_bracketed() {
        let x = Expr::var("x");
        assert_eq!(pretty(&pow(x.clone(), Expr::constant(2, 3))), "x^(2/3)");
        assert_eq!(pretty(&pow(x, Expr::constant(1, 2))), "sqrt(x)");
    }

    #[test]
    fn negation_and_sums() {
        let x = Expr::var("x");
        let e = add(mul(int(2), x.clone()), neg(exp(div(pow(x, int(2)), int(2)))));
        assert_eq!(pretty(&e), "2*x - exp(x^2/2)");
    }
}

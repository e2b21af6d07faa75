//! LaTeX rendering for equations and solution steps.

use num_traits::Signed;

use crate::expr::{Expr, Rational};

use super::expr::{is_half, split_neg};

/// LaTeX for a single expression.
pub fn latex(expr: &Expr) -> String {
    Writer { inline: false }.render(0, expr)
}

/// `lhs = rhs`
pub fn equation(lhs: &Expr, rhs: &Expr) -> String {
    format!("{} = {}", latex(lhs), latex(rhs))
}

/// `\int integrand \,dvar`
pub fn integral(integrand: &Expr, var: &str) -> String {
    let body = Writer { inline: false }.render(2, integrand);
    format!("\\int {body}\\,d{var}")
}

/// Writers inside exponents use slashed fractions so that `e^{x^2/2}` stays on one line.
#[derive(Clone, Copy)]
struct Writer {
    inline: bool,
}

impl Writer {
    fn render(self, ctx: u8, expr: &Expr) -> String {
        match expr {
            Expr::Variable(v) => symbol(v),
            Expr::Constant(r) => self.rational(ctx, r),
            Expr::Derivative { var, wrt, order } => self.derivative(var, wrt, *order),

            Expr::Add(a, b) | Expr::Sub(a, b) => {
                let (neg_b, b_inner) = split_neg(b);
                let minus = neg_b ^ matches!(expr, Expr::Sub(..));
                let body = format!(
                    "{} {} {}",
                    self.render(1, a),
                    if minus { "-" } else { "+" },
                    self.render(2, &b_inner)
                );
                bracket(ctx, 1, body)
            }

            Expr::Mul(a, b) => {
                let (na, a_inner) = split_neg(a);
                let (nb, b_inner) = split_neg(b);
                let left = self.render(2, &a_inner);
                let right = self.render(3, &b_inner);
                let body = format!("{left}{}{right}", joiner(&a_inner, &b_inner, &right));
                signed(ctx, na ^ nb, body)
            }

            Expr::Div(a, b) => {
                let (na, a_inner) = split_neg(a);
                let (nb, b_inner) = split_neg(b);
                let body = if self.inline {
                    format!("{}/{}", self.render(2, &a_inner), self.render(3, &b_inner))
                } else {
                    format!(
                        "\\frac{{{}}}{{{}}}",
                        self.render(0, &a_inner),
                        self.render(0, &b_inner)
                    )
                };
                if self.inline || na ^ nb {
                    signed(ctx, na ^ nb, body)
                } else {
                    body
                }
            }

            Expr::Pow(a, b) if is_half(b) => format!("\\sqrt{{{}}}", self.render(0, a)),
            Expr::Pow(a, b) => {
                let base = match &**a {
                    Expr::Sin(_)
                    | Expr::Cos(_)
                    | Expr::Tan(_)
                    | Expr::Exp(_)
                    | Expr::Log(_)
                    | Expr::Derivative { .. } => format!("\\left({}\\right)", self.render(0, a)),
                    _ => match self.render(4, a) {
                        s if s.starts_with("\\frac") => format!("\\left({s}\\right)"),
                        s => s,
                    },
                };
                let exponent = Writer { inline: true }.render(0, b);
                bracket(ctx, 3, format!("{base}^{}", group(&exponent)))
            }

            Expr::Neg(a) => {
                let (is_neg, inner) = split_neg(a);
                if is_neg {
                    self.render(ctx, &inner)
                } else {
                    bracket(ctx, 2, format!("-{}", self.render(2, &inner)))
                }
            }

            Expr::Exp(a) if a.is_one() => "e".to_string(),
            Expr::Exp(a) => format!("e^{{{}}}", Writer { inline: true }.render(0, a)),
            Expr::Log(a) => match &**a {
                Expr::Abs(inner) => format!("\\ln|{}|", self.render(0, inner)),
                other => self.function("\\ln", other),
            },
            Expr::Abs(a) => format!("\\left|{}\\right|", self.render(0, a)),
            Expr::Sin(a) => self.function("\\sin", a),
            Expr::Cos(a) => self.function("\\cos", a),
            Expr::Tan(a) => self.function("\\tan", a),
            Expr::Asin(a) => self.function("\\arcsin", a),
            Expr::Acos(a) => self.function("\\arccos", a),
            Expr::Atan(a) => self.function("\\arctan", a),
        }
    }

    fn rational(self, ctx: u8, r: &Rational) -> String {
        if r.is_integer() {
            let body = r.numer().to_string();
            return if r.is_negative() { bracket(ctx, 2, body) } else { body };
        }
        let (num, den) = (r.numer().abs(), r.denom());
        let body = if self.inline {
            format!("{num}/{den}")
        } else {
            format!("\\frac{{{num}}}{{{den}}}")
        };
        if r.is_negative() {
            bracket(ctx, 2, format!("-{body}"))
        } else if self.inline {
            bracket(ctx, 2, body)
        } else {
            body
        }
    }

    fn derivative(self, var: &str, wrt: &str, order: u32) -> String {
        match (order, self.inline) {
            (1, false) => format!("\\frac{{d{var}}}{{d{wrt}}}"),
            (1, true) => format!("d{var}/d{wrt}"),
            (n, false) => format!("\\frac{{d^{{{n}}}{var}}}{{d{wrt}^{{{n}}}}}"),
            (n, true) => format!("{var}^{{({n})}}"),
        }
    }

    fn function(self, name: &str, arg: &Expr) -> String {
        let inner = self.render(0, arg);
        if matches!(arg, Expr::Variable(_)) || arg.as_constant().is_some_and(|c| c.is_integer()) {
            format!("{name}({inner})")
        } else {
            format!("{name}\\left({inner}\\right)")
        }
    }
}

fn symbol(name: &str) -> String {
    if let Some(rest) = name.strip_prefix('_') {
        return rest.to_string();
    }
    // `C1`, `A12`: a letter with a numeric subscript
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        let rest = chars.as_str();
        if first.is_ascii_alphabetic() && !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return format!("{first}_{{{rest}}}");
        }
    }
    match name {
        "mu" => "\\mu".to_string(),
        "pi" => "\\pi".to_string(),
        "lambda" => "\\lambda".to_string(),
        other => other.to_string(),
    }
}

fn is_differential(expr: &Expr) -> bool {
    expr.as_variable().is_some_and(|v| {
        v.len() == 2 && v.starts_with('d') && v[1..].chars().all(|c| c.is_ascii_alphabetic())
    })
}

/// Separator between two adjacent factors.
fn joiner(a: &Expr, b: &Expr, right: &str) -> &'static str {
    if is_differential(b) {
        "\\,"
    } else if matches!(b, Expr::Constant(_)) || right.starts_with(|c: char| c.is_ascii_digit()) {
        " \\cdot "
    } else if matches!(a, Expr::Constant(_)) || (is_letter(rightmost(a)) && is_letter(b)) {
        ""
    } else {
        " "
    }
}

fn rightmost(expr: &Expr) -> &Expr {
    match expr {
        Expr::Mul(_, b) => rightmost(b),
        other => other,
    }
}

/// A one-letter variable, possibly raised to a power.
fn is_letter(expr: &Expr) -> bool {
    match expr {
        Expr::Variable(v) => v.len() == 1,
        Expr::Pow(base, _) => is_letter(base),
        _ => false,
    }
}

fn group(s: &str) -> String {
    if s.chars().count() == 1 {
        s.to_string()
    } else {
        format!("{{{s}}}")
    }
}

fn signed(ctx: u8, negative: bool, body: String) -> String {
    if negative {
        bracket(ctx, 2, format!("-{body}"))
    } else {
        bracket(ctx, 2, body)
    }
}

fn bracket(ctx: u8, prec: u8, body: String) -> String {
    if prec < ctx {
        format!("\\left({body}\\right)")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{abs, add, div, exp, int, ln, mul, pow, sub};

    #[test]
    fn derivative_marker_is_a_fraction() {
        assert_eq!(latex(&Expr::derivative("y", "x", 1)), "\\frac{dy}{dx}");
        assert_eq!(latex(&Expr::derivative("y", "x", 2)), "\\frac{d^{2}y}{dx^{2}}");
    }

    #[test]
    fn exponent_fractions_stay_inline() {
        let x = Expr::var("x");
        let e = mul(Expr::var("C"), exp(div(pow(x, int(2)), int(2))));
        assert_eq!(latex(&e), "C e^{x^2/2}");
    }

    #[test]
    fn logarithm_of_absolute_value() {
        let x = Expr::var("x");
        let e = mul(x.clone(), add(ln(abs(x)), Expr::var("C")));
        assert_eq!(latex(&e), "x \\left(\\ln|x| + C\\right)");
    }

    #[test]
    fn differentials_are_spaced() {
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        let e = add(
            mul(add(mul(int(2), x.clone()), y.clone()), Expr::differential("x")),
            mul(add(x, mul(int(2), y)), Expr::differential("y")),
        );
        assert_eq!(latex(&e), "\\left(2x + y\\right)\\,dx + \\left(x + 2y\\right)\\,dy");
    }

    #[test]
    fn coefficients_attach_to_their_factor() {
        let x = Expr::var("x");
        let e = sub(sub(mul(int(2), x.clone()), int(1)), mul(Expr::constant(1, 2), x));
        assert_eq!(latex(&e), "2x - 1 - \\frac{1}{2}x");
    }
}

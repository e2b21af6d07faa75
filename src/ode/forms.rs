//! Structural tests that read the data each method needs off an equation.

use num_traits::{One, Signed, Zero};

use crate::calculus::{antiderivative, differentiate};
use crate::equation::Equation;
use crate::error::Result;
use crate::expr::{self, div, mul, neg, sub, Expr, Rational};
use crate::simplify::{
    collect_powers, depends_on, eliminate, is_zero, linear_coefficients, normalize,
    split_coefficient, split_factors, strip_abs, substitute, substitute_derivative, substitute_many, together,
};

/// Placeholder for `y'` while the derivative is solved for.
const SLOPE: &str = "_p";
const SCALE: &str = "_lambda";
const SAMPLES: [i64; 5] = [1, 2, -1, 3, 0];

/// `M dx + N dy = 0` read off a first-order equation, whether written with differentials or as
/// `a y' + b = 0` (then `M = b`, `N = a`).
pub(crate) fn differential_form(eq: &Equation) -> Result<Option<(Expr, Expr)>> {
    if let Some(form) = &eq.form {
        return Ok(Some((form.m.clone(), form.n.clone())));
    }
    if eq.order() != 1 {
        return Ok(None);
    }
    let residual = substitute_derivative(&eq.residual(), &eq.dependent, 1, &Expr::var(SLOPE));
    let Some((a, b)) = linear_coefficients(&residual, SLOPE)? else {
        return Ok(None);
    };
    if is_zero(&a)? {
        return Ok(None);
    }
    Ok(Some((b, a)))
}

/// `f` in `y' = f(x, y)`.
pub(crate) fn slope(m: &Expr, n: &Expr) -> Expr {
    normalize(neg(div(m.clone(), n.clone())))
}

/// `(g, h)` with `f = g(x) h(y)`.
pub(crate) fn separate(f: &Expr, x: &str, y: &str) -> Result<Option<(Expr, Expr)>> {
    if is_zero(f)? {
        return Ok(Some((expr::zero(), expr::one())));
    }
    let on_x = depends_on(f, x)?;
    let on_y = depends_on(f, y)?;
    match (on_x, on_y) {
        (_, false) => return Ok(Some((eliminate(f, y)?, expr::one()))),
        (false, true) => return Ok(Some((expr::one(), eliminate(f, x)?))),
        (true, true) => {}
    }
    // f = g h exactly when f f_xy = f_x f_y
    let fx = differentiate(x, f);
    let fy = differentiate(y, f);
    let fxy = differentiate(y, &fx);
    if !is_zero(&sub(mul(f.clone(), fxy), mul(fx, fy)))? {
        return Ok(None);
    }
    if let Some(split) = split_product(f, x, y)? {
        return Ok(Some(split));
    }
    for point in SAMPLES {
        let Some(g) = at(f, y, &Expr::integer(point))? else {
            continue;
        };
        // factors free of x would carry the sample point into the answer
        let (g, rest) = split_factors(&g, x)?;
        let g = with_sign(g, &rest)?;
        let h = eliminate(&div(f.clone(), g.clone()), x)?;
        return Ok(Some((g, h)));
    }
    Ok(None)
}

/// Reads `g` and `h` straight off the factors of the numerator and denominator.
fn split_product(f: &Expr, x: &str, y: &str) -> Result<Option<(Expr, Expr)>> {
    let (num, den) = together(f)?;
    let (num_x, num_y) = split_factors(&num, x)?;
    let (den_x, den_y) = split_factors(&den, x)?;
    if [&num_x, &den_x].iter().any(|e| e.contains_var(y))
        || [&num_y, &den_y].iter().any(|e| e.contains_var(x))
    {
        return Ok(None);
    }
    let g = with_sign(normalize(div(num_x, den_x)), &normalize(div(num_y, den_y)))?;
    let h = normalize(div(f.clone(), g.clone()));
    Ok(Some((g, h)))
}

/// The numeric factor goes to `h`, but a negative sign stays with `g`.
fn with_sign(g: Expr, rest: &Expr) -> Result<Expr> {
    let (_, g) = split_coefficient(&g)?;
    let (c, _) = split_coefficient(rest)?;
    Ok(if c.is_negative() { normalize(neg(g)) } else { g })
}

/// Value of `expr` at `var = value`, or `None` where it vanishes or is undefined.
fn at(expr: &Expr, var: &str, value: &Expr) -> Result<Option<Expr>> {
    let (num, den) = together(expr)?;
    let den = normalize(substitute(&den, var, value));
    if is_zero(&den)? {
        return Ok(None);
    }
    let num = normalize(substitute(&num, var, value));
    if is_zero(&num)? {
        return Ok(None);
    }
    Ok(Some(normalize(div(num, den))))
}

/// `(P, Q)` with `f = -P y + Q`.
pub(crate) fn linear(f: &Expr, y: &str) -> Result<Option<(Expr, Expr)>> {
    let Some((a, b)) = linear_coefficients(f, y)? else {
        return Ok(None);
    };
    Ok(Some((normalize(neg(a)), b)))
}

/// `(P, Q, n)` with `f = -P y + Q y^n`, `n` not 0 or 1.
pub(crate) fn bernoulli(f: &Expr, y: &str) -> Result<Option<(Expr, Expr, Rational)>> {
    let Some(powers) = collect_powers(f, y)? else {
        return Ok(None);
    };
    let one = Rational::one();
    let mut others = powers.iter().filter(|(k, _)| **k != one);
    let (Some((n, q)), None) = (others.next(), others.next()) else {
        return Ok(None);
    };
    if n.is_zero() {
        return Ok(None);
    }
    let p = powers
        .get(&one)
        .map(|a| normalize(neg(a.clone())))
        .unwrap_or_else(expr::zero);
    Ok(Some((p, q.clone(), n.clone())))
}

/// `f(λx, λy) = f(x, y)`.
pub(crate) fn is_homogeneous(f: &Expr, x: &str, y: &str) -> Result<bool> {
    let lambda = Expr::var(SCALE);
    let scaled = substitute_many(
        f,
        &[
            (x.to_string(), mul(lambda.clone(), Expr::var(x))),
            (y.to_string(), mul(lambda, Expr::var(y))),
        ],
    );
    is_zero(&sub(scaled, f.clone()))
}

/// `F(v) = f(x, v x)`, which no longer mentions `x` when `f` is homogeneous.
pub(crate) fn homogeneous_reduction(f: &Expr, x: &str, y: &str, v: &str) -> Result<Expr> {
    let replaced = substitute(f, y, &mul(Expr::var(v), Expr::var(x)));
    eliminate(&replaced, x)
}

/// `∂M/∂y - ∂N/∂x`, zero for an exact form.
pub(crate) fn exactness_defect(m: &Expr, n: &Expr, x: &str, y: &str) -> Expr {
    normalize(sub(differentiate(y, m), differentiate(x, n)))
}

/// A factor depending on one variable only that makes `M dx + N dy` exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegratingFactor {
    /// The variable the factor depends on.
    pub var: String,
    /// `(M_y - N_x)/N` when `var` is the independent variable, `(N_x - M_y)/M` otherwise.
    pub ratio: Expr,
    pub mu: Expr,
}

pub(crate) fn integrating_factor(
    m: &Expr,
    n: &Expr,
    x: &str,
    y: &str,
) -> Result<Option<IntegratingFactor>> {
    let defect = exactness_defect(m, n, x, y);
    if is_zero(&defect)? {
        return Ok(None);
    }
    let candidates = [
        (x, y, div(defect.clone(), n.clone()), n),
        (y, x, neg(div(defect, m.clone())), m),
    ];
    for (var, other, ratio, denominator) in candidates {
        if is_zero(denominator)? || depends_on(&ratio, other)? {
            continue;
        }
        let ratio = eliminate(&ratio, other)?;
        let integral = match antiderivative(var, &ratio) {
            Ok(integral) => integral,
            Err(err) => {
                tracing::debug!(target: "classify", %ratio, error = %err, "integrating factor not elementary");
                continue;
            }
        };
        let mu = strip_abs(&normalize(expr::exp(integral)));
        return Ok(Some(IntegratingFactor {
            var: var.to_string(),
            ratio,
            mu,
        }));
    }
    Ok(None)
}

/// Coefficients `a_k` and forcing `g` of `Σ a_k y^(k) = g` when every `a_k` is a number.
pub(crate) fn constant_coefficients(eq: &Equation) -> Result<Option<(Vec<Rational>, Expr)>> {
    let order = eq.order();
    if order == 0 {
        return Ok(None);
    }
    let placeholder = |k: u32| format!("_d{k}");
    let mut rest = eq.residual();
    for k in 1..=order {
        rest = substitute_derivative(&rest, &eq.dependent, k, &Expr::var(placeholder(k)));
    }
    rest = substitute(&rest, &eq.dependent, &Expr::var(placeholder(0)));

    let mut coeffs = vec![Rational::zero(); order as usize + 1];
    for k in (0..=order).rev() {
        let Some((a, b)) = linear_coefficients(&rest, &placeholder(k))? else {
            return Ok(None);
        };
        let Some(c) = a.as_constant() else {
            return Ok(None);
        };
        coeffs[k as usize] = c.clone();
        rest = b;
    }
    if coeffs[order as usize].is_zero() {
        return Ok(None);
    }
    Ok(Some((coeffs, normalize(neg(rest)))))
}

/// Which variable a second-order equation lacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReducibleCase {
    /// `F(x, y', y'') = 0`: `p = y'` gives a first-order equation in `p(x)`.
    MissingDependent,
    /// `F(y, y', y'') = 0`: `p(y) = y'` with `y'' = p dp/dy`.
    MissingIndependent,
}

pub(crate) fn reducible(eq: &Equation) -> Result<Option<ReducibleCase>> {
    if eq.order() != 2 {
        return Ok(None);
    }
    let y = eq.dependent.as_str();
    let residual = substitute_derivative(
        &substitute_derivative(&eq.residual(), y, 2, &Expr::var("_d2")),
        y,
        1,
        &Expr::var("_d1"),
    );
    if !residual.contains_var(y) {
        return Ok(Some(ReducibleCase::MissingDependent));
    }
    if !depends_on(&residual, &eq.independent)? {
        return Ok(Some(ReducibleCase::MissingIndependent));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, int};
    use crate::parser::parse_equation;
    use crate::simplify::equivalent;

    fn slope_of(text: &str) -> Expr {
        let eq = parse_equation(text).unwrap();
        let (m, n) = differential_form(&eq).unwrap().unwrap();
        slope(&m, &n)
    }

    #[test]
    fn product_right_side_separates() {
        let f = slope_of("dy/dx = x*y");
        let (g, h) = separate(&f, "x", "y").unwrap().unwrap();
        assert!(equivalent(&g, &Expr::var("x")).unwrap());
        assert!(equivalent(&h, &Expr::var("y")).unwrap());
    }

    #[test]
    fn sum_right_side_does_not_separate() {
        let f = slope_of("dy/dx = x + y");
        assert_eq!(separate(&f, "x", "y").unwrap(), None);
    }

    #[test]
    fn bernoulli_exponent_is_found() {
        let f = slope_of("dy/dx + y = y^2*x");
        let (p, q, n) = bernoulli(&f, "y").unwrap().unwrap();
        assert_eq!(p, int(1));
        assert!(equivalent(&q, &Expr::var("x")).unwrap());
        assert_eq!(n, Rational::from_integer(2.into()));
    }

    #[test]
    fn ratio_of_linear_terms_is_homogeneous() {
        let f = slope_of("dy/dx = (x+y)/x");
        assert!(is_homogeneous(&f, "x", "y").unwrap());
        let reduced = homogeneous_reduction(&f, "x", "y", "v").unwrap();
        assert!(equivalent(&reduced, &add(int(1), Expr::var("v"))).unwrap());
        assert!(!is_homogeneous(&slope_of("dy/dx = x*y"), "x", "y").unwrap());
    }

    #[test]
    fn integrating_factor_in_x() {
        // (M_y - N_x)/N = 1/x
        let eq = parse_equation("(3*x*y + y^2) dx + (x^2 + x*y) dy = 0").unwrap();
        let (m, n) = differential_form(&eq).unwrap().unwrap();
        let factor = integrating_factor(&m, &n, "x", "y").unwrap().unwrap();
        assert_eq!(factor.var, "x");
        assert!(equivalent(&factor.mu, &Expr::var("x")).unwrap());
    }

    #[test]
    fn constant_coefficients_and_forcing() {
        let eq = parse_equation("y'' - 3y' + 2y = 4x").unwrap();
        let (coeffs, forcing) = constant_coefficients(&eq).unwrap().unwrap();
        let expected: Vec<Rational> = [2, -3, 1]
            .iter()
            .map(|&c: &i64| Rational::from_integer(c.into()))
            .collect();
        assert_eq!(coeffs, expected);
        assert!(equivalent(&forcing, &mul(int(4), Expr::var("x"))).unwrap());
        let eq = parse_equation("y'' + x*y = 0").unwrap();
        assert_eq!(constant_coefficients(&eq).unwrap(), None);
    }

    #[test]
    fn missing_variables_are_detected() {
        let eq = parse_equation("x*y'' = y'").unwrap();
        assert_eq!(reducible(&eq).unwrap(), Some(ReducibleCase::MissingDependent));
        let eq = parse_equation("y*y'' + (y')^2 = 0").unwrap();
        assert_eq!(reducible(&eq).unwrap(), Some(ReducibleCase::MissingIndependent));
        let eq = parse_equation("y'' + x*y = 0").unwrap();
        assert_eq!(reducible(&eq).unwrap(), None);
    }
}

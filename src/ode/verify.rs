//! Checks a solution against its equation: symbolically when the residual simplifies to zero,
//! otherwise numerically at a handful of sample points.

use num_traits::{One, ToPrimitive, Zero};

use crate::calculus::differentiate;
use crate::equation::Equation;
use crate::error::{Result, SolveError};
use crate::expr::{div, is_arbitrary_constant, neg, pow, sub, Expr, Rational};
use crate::simplify::{is_zero, linear_coefficients, normalize, substitute, substitute_derivative};

use super::Solution;

const X_SAMPLES: [f64; 4] = [0.3, 0.7, 1.3, 2.1];
const Y_SAMPLES: [f64; 3] = [0.4, 1.1, 1.9];
const CONSTANT_SAMPLES: [f64; 4] = [0.6, 1.4, 0.9, 1.7];
const TOLERANCE: f64 = 1e-8;

/// `Ok(true)` when the solution satisfies the equation, `Ok(false)` when a sample point
/// disproves it, `Err` when neither check can be carried out.
pub fn verify(eq: &Equation, solution: &Solution) -> Result<bool> {
    let y = eq.dependent.as_str();
    if solution.is_explicit(y) {
        return verify_explicit(eq, &solution.rhs);
    }
    if let Some(branch) = principal_branch(solution, y) {
        tracing::debug!(target: "solver", %branch, "checking the principal branch");
        match verify_explicit(eq, &branch) {
            // the branch may be undefined at every sample point, the relation itself is not
            Err(err) if eq.order() == 1 => {
                tracing::debug!(target: "solver", error = %err, "falling back to the implicit check");
            }
            checked => return checked,
        }
    }
    if eq.order() == 1 {
        return verify_implicit(eq, solution);
    }
    Err(SolveError::unsolvable(format!(
        "cannot check the implicit solution {solution} of an order {} equation",
        eq.order()
    )))
}

fn verify_explicit(eq: &Equation, rhs: &Expr) -> Result<bool> {
    let (x, y) = (eq.independent.as_str(), eq.dependent.as_str());
    let order = eq.order();
    let mut derivatives = vec![rhs.clone()];
    for k in 1..=order as usize {
        derivatives.push(normalize(differentiate(x, &derivatives[k - 1])));
    }
    let mut residual = eq.residual();
    for k in (1..=order).rev() {
        residual = substitute_derivative(&residual, y, k, &derivatives[k as usize]);
    }
    let residual = substitute(&residual, y, rhs);
    if is_zero(&residual).unwrap_or(false) {
        return Ok(true);
    }
    numeric(&residual, x, None)
}

/// `y^k = R` (or `1/y^k = R`) read as `y = R^(1/k)`.
fn principal_branch(solution: &Solution, y: &str) -> Option<Expr> {
    let (base, k) = match &solution.lhs {
        Expr::Pow(base, exponent) => (&**base, exponent.as_constant()?.clone()),
        Expr::Div(num, den) if num.as_constant().is_some_and(|c| c.is_one()) => match &**den {
            Expr::Pow(base, exponent) => (&**base, -exponent.as_constant()?.clone()),
            other => (other, -Rational::one()),
        },
        _ => return None,
    };
    if base.as_variable() != Some(y) || solution.rhs.contains_var(y) {
        return None;
    }
    if k.is_zero() {
        return None;
    }
    Some(pow(solution.rhs.clone(), Expr::Constant(k.recip())))
}

/// `Φ(x, y) = C` has slope `-Φ_x / Φ_y`; the equation must hold with that slope everywhere.
fn verify_implicit(eq: &Equation, solution: &Solution) -> Result<bool> {
    let (x, y) = (eq.independent.as_str(), eq.dependent.as_str());
    let relation = normalize(sub(solution.lhs.clone(), solution.rhs.clone()));
    let mut integral = relation.clone();
    for name in &solution.constants {
        if let Some((a, b)) = linear_coefficients(&relation, name)? {
            // solving for the constant keeps the level sets; the coefficient may depend on x and y
            if !a.is_zero() {
                integral = normalize(neg(div(b, a)));
                break;
            }
        }
    }
    let k_x = normalize(differentiate(x, &integral));
    let k_y = normalize(differentiate(y, &integral));
    if k_y.is_zero() {
        return Err(SolveError::unsolvable(format!(
            "the relation {solution} does not involve {y}"
        )));
    }
    let slope = div(neg(k_x), k_y);
    let residual = substitute_derivative(&eq.residual(), y, 1, &slope);
    if is_zero(&residual).unwrap_or(false) {
        return Ok(true);
    }
    numeric(&residual, x, Some(y))
}

fn numeric(residual: &Expr, x: &str, y: Option<&str>) -> Result<bool> {
    let y_samples: &[f64] = if y.is_some() { &Y_SAMPLES } else { &[0.0] };
    let mut checked = 0usize;
    for (i, &xv) in X_SAMPLES.iter().enumerate() {
        for &yv in y_samples {
            let bind = |name: &str| -> Option<f64> {
                if name == x {
                    Some(xv)
                } else if Some(name) == y {
                    Some(yv)
                } else if is_arbitrary_constant(name) {
                    let index = name[1..].parse::<usize>().unwrap_or(0);
                    Some(CONSTANT_SAMPLES[(index + i) % CONSTANT_SAMPLES.len()])
                } else if name == "pi" {
                    Some(std::f64::consts::PI)
                } else {
                    None
                }
            };
            let (Some(value), Some(scale)) = (evaluate(residual, &bind), magnitude(residual, &bind))
            else {
                continue;
            };
            if !value.is_finite() || !scale.is_finite() {
                continue;
            }
            checked += 1;
            if value.abs() > TOLERANCE * (1.0 + scale) {
                tracing::debug!(target: "solver", x = xv, value, "residual does not vanish");
                return Ok(false);
            }
        }
    }
    if checked == 0 {
        return Err(SolveError::unsolvable(format!(
            "the residual {residual} cannot be evaluated at any sample point"
        )));
    }
    tracing::debug!(target: "solver", checked, "numeric check passed");
    Ok(true)
}

/// Sum of the absolute values of the top-level terms, used to scale the tolerance.
fn magnitude(expr: &Expr, bind: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
    match expr {
        Expr::Add(a, b) | Expr::Sub(a, b) => Some(magnitude(a, bind)? + magnitude(b, bind)?),
        Expr::Neg(a) => magnitude(a, bind),
        other => evaluate(other, bind).map(f64::abs),
    }
}

fn evaluate(expr: &Expr, bind: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
    let value = match expr {
        Expr::Variable(name) => bind(name)?,
        Expr::Constant(r) => r.to_f64()?,
        Expr::Add(a, b) => evaluate(a, bind)? + evaluate(b, bind)?,
        Expr::Sub(a, b) => evaluate(a, bind)? - evaluate(b, bind)?,
        Expr::Mul(a, b) => evaluate(a, bind)? * evaluate(b, bind)?,
        Expr::Div(a, b) => evaluate(a, bind)? / evaluate(b, bind)?,
        Expr::Pow(a, b) => {
            let (base, exponent) = (evaluate(a, bind)?, evaluate(b, bind)?);
            if exponent.fract() == 0.0 && exponent.abs() < i32::MAX as f64 {
                base.powi(exponent as i32)
            } else {
                base.powf(exponent)
            }
        }
        Expr::Neg(a) => -evaluate(a, bind)?,
        Expr::Sin(a) => evaluate(a, bind)?.sin(),
        Expr::Cos(a) => evaluate(a, bind)?.cos(),
        Expr::Tan(a) => evaluate(a, bind)?.tan(),
        Expr::Asin(a) => evaluate(a, bind)?.asin(),
        Expr::Acos(a) => evaluate(a, bind)?.acos(),
        Expr::Atan(a) => evaluate(a, bind)?.atan(),
        Expr::Exp(a) => evaluate(a, bind)?.exp(),
        Expr::Log(a) => evaluate(a, bind)?.ln(),
        Expr::Abs(a) => evaluate(a, bind)?.abs(),
        Expr::Derivative { .. } => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, exp, int, mul};
    use crate::parser::parse_equation;

    fn explicit(rhs: Expr) -> Solution {
        Solution {
            lhs: Expr::var("y"),
            rhs,
            constants: vec!["C".to_string()],
        }
    }

    #[test]
    fn exponential_growth_checks_out() {
        let eq = parse_equation("y' = 2*y").unwrap();
        let good = explicit(mul(Expr::var("C"), exp(mul(int(2), Expr::var("x")))));
        assert!(verify(&eq, &good).unwrap());
        let bad = explicit(mul(Expr::var("C"), exp(Expr::var("x"))));
        assert!(!verify(&eq, &bad).unwrap());
    }

    #[test]
    fn implicit_relation_is_checked_through_its_slope() {
        // (2x + y) dx + (x + 2y) dy = 0
        let eq = parse_equation("(2*x + y)dx + (x + 2*y)dy = 0").unwrap();
        let x = Expr::var("x");
        let y = Expr::var("y");
        let lhs = add(
            add(pow(x.clone(), int(2)), mul(x, y.clone())),
            pow(y, int(2)),
        );
        let solution = Solution {
            lhs,
            rhs: Expr::var("C"),
            constants: vec!["C".to_string()],
        };
        assert!(verify(&eq, &solution).unwrap());
    }

    #[test]
    fn square_relation_uses_the_principal_branch() {
        // y y'' + y'^2 = 0  with  y^2 = C1 x + C2
        let eq = parse_equation("y*y'' + (y')^2 = 0").unwrap();
        let solution = Solution {
            lhs: pow(Expr::var("y"), int(2)),
            rhs: add(mul(Expr::var("C1"), Expr::var("x")), Expr::var("C2")),
            constants: vec!["C1".to_string(), "C2".to_string()],
        };
        assert!(verify(&eq, &solution).unwrap());
    }
}

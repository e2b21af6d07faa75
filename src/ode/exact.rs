use num_integer::Integer;
use num_traits::{One, Signed};

use crate::calculus::differentiate;
use crate::error::{Result, SolveError};
use crate::expr::{add, mul, sub, Expr, Rational};
use crate::format::{integral, latex};
use crate::simplify::{decompose, depends_on, eliminate, is_zero, linear_coefficients, normalize};
use crate::steps::Math;

use super::{integrate, isolate, Solution, Workspace};

/// `M dx + N dy = 0` with `M_y = N_x`: build the potential `F` and state `F = C`.
pub(super) fn solve(m: &Expr, n: &Expr, x: &str, y: &str, ws: &mut Workspace) -> Result<Solution> {
    let m_y = normalize(differentiate(y, m));
    let n_x = normalize(differentiate(x, n));
    if !is_zero(&sub(m_y.clone(), n_x))? {
        return Err(SolveError::invariant(format!(
            "exact method applied to a form that is not exact (M = {m}, N = {n})"
        )));
    }
    ws.trace.push(
        "Check exactness",
        "The mixed partial derivatives agree, so the form is exact.",
        Math::Latex(format!(
            "\\frac{{\\partial M}}{{\\partial {y}}} = {} = \\frac{{\\partial N}}{{\\partial {x}}}",
            latex(&m_y)
        )),
    );

    let partial = integrate(x, m)?;
    ws.trace.push(
        format!("Integrate M with respect to {x}"),
        format!("{y} is held constant; the constant of integration may depend on {y}."),
        Math::Latex(format!(
            "F({x}, {y}) = {} = {}",
            integral(m, x),
            with_unknown(&partial, y)
        )),
    );

    let partial_y = normalize(differentiate(y, &partial));
    ws.trace.push(
        format!("Differentiate with respect to {y}"),
        format!("This must equal N({x}, {y})."),
        Math::Latex(format!(
            "\\frac{{\\partial F}}{{\\partial {y}}} = {} = {}",
            with_unknown_derivative(&partial_y, y),
            latex(n)
        )),
    );

    let remainder = normalize(sub(n.clone(), partial_y));
    if depends_on(&remainder, x)? {
        return Err(SolveError::invariant(format!(
            "g'({y}) = {remainder} still depends on {x}"
        )));
    }
    let remainder = eliminate(&remainder, x)?;
    let g = integrate(y, &remainder)?;
    ws.trace.push(
        format!("Find g({y})"),
        format!("Integrate the remaining part with respect to {y}."),
        Math::Latex(format!(
            "g'({y}) = {} \\quad\\Rightarrow\\quad g({y}) = {}",
            latex(&remainder),
            latex(&g)
        )),
    );

    let potential = normalize(add(partial, g));
    let c = ws.constants.fresh()?;
    let solution = match linear_coefficients(&potential, y)? {
        Some((a, _)) if !a.is_zero() => isolate::finish(&potential, &c, y, ws)?,
        _ => {
            let scale = Expr::Constant(integer_scale(&potential)?);
            Solution {
                lhs: normalize(mul(scale.clone(), potential)),
                rhs: ws.absorb(&mul(scale, c)),
                constants: ws.constants.used(),
            }
        }
    };
    ws.trace.push(
        "State the solution",
        "Level curves of the potential F are the solutions.",
        Math::Equation(solution.lhs.clone(), solution.rhs.clone()),
    );
    Ok(solution)
}

/// Multiplier that clears fractional coefficients and makes the leading one positive.
fn integer_scale(expr: &Expr) -> Result<Rational> {
    let terms = decompose(expr)?;
    let lcm = terms
        .iter()
        .fold(num_bigint::BigInt::one(), |acc, t| acc.lcm(t.coeff.denom()));
    let mut scale = Rational::from_integer(lcm);
    if terms.first().is_some_and(|t| t.coeff.is_negative()) {
        scale = -scale;
    }
    Ok(scale)
}

fn with_unknown(partial: &Expr, y: &str) -> String {
    if partial.is_zero() {
        format!("g({y})")
    } else {
        format!("{} + g({y})", latex(partial))
    }
}

fn with_unknown_derivative(partial_y: &Expr, y: &str) -> String {
    if partial_y.is_zero() {
        format!("g'({y})")
    } else {
        format!("{} + g'({y})", latex(partial_y))
    }
}

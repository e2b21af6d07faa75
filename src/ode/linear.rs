use crate::error::Result;
use crate::expr::{add, div, exp, mul, Expr};
use crate::format::{integral, latex};
use crate::simplify::{normalize, strip_abs};
use crate::steps::Math;

use super::{integrate, Solution, Workspace};

/// `y' + P(x) y = Q(x)` through the integrating factor `e^{∫P}`.
pub(super) fn solve(p: &Expr, q: &Expr, x: &str, y: &str, ws: &mut Workspace) -> Result<Solution> {
    ws.trace.push(
        "Identify P and Q",
        format!("Write the equation as d{y}/d{x} + P({x}) {y} = Q({x})."),
        Math::Latex(format!(
            "P({x}) = {},\\quad Q({x}) = {}",
            latex(p),
            latex(q)
        )),
    );

    let exponent = integrate(x, p)?;
    let raw = normalize(exp(exponent));
    let mu = strip_abs(&raw);
    let mut description = format!("The integrating factor is e raised to the integral of P({x}).");
    if mu != raw {
        description.push_str(" The absolute value is dropped; its sign cancels in the next step.");
    }
    ws.trace.push(
        "Compute the integrating factor",
        description,
        Math::Latex(format!(
            "\\mu({x}) = e^{{{}}} = {}",
            integral(p, x),
            latex(&mu)
        )),
    );

    let product = mul(mu.clone(), Expr::var(y));
    let mu_q = normalize(mul(mu.clone(), q.clone()));
    ws.trace.push(
        "Multiply through by the integrating factor",
        format!("The left side becomes the derivative of μ({x}) {y}."),
        Math::Latex(format!(
            "\\frac{{d}}{{d{x}}}\\left[{}\\right] = {}",
            latex(&product),
            latex(&mu_q)
        )),
    );

    let antiderivative = integrate(x, &mu_q)?;
    let c = ws.constants.fresh()?;
    ws.trace.push(
        "Integrate both sides",
        format!("Integrate with respect to {x} and add the constant {c}."),
        Math::Equation(product, add(antiderivative.clone(), c.clone())),
    );

    let rhs = ws.polish(&ws.absorb(&div(add(antiderivative, c), mu)));
    ws.trace.push(
        format!("Solve for {y}"),
        "Divide by the integrating factor.",
        Math::Equation(Expr::var(y), rhs.clone()),
    );
    Ok(Solution {
        lhs: Expr::var(y),
        rhs,
        constants: ws.constants.used(),
    })
}

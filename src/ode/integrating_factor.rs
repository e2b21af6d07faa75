use crate::equation::DifferentialForm;
use crate::error::Result;
use crate::expr::{mul, Expr};
use crate::format::{integral, latex};
use crate::simplify::normalize;
use crate::steps::Math;

use super::{exact, IntegratingFactor, Solution, Workspace};

/// Multiplies `M dx + N dy` by a one-variable factor and finishes with the exact method.
pub(super) fn solve(
    m: &Expr,
    n: &Expr,
    factor: &IntegratingFactor,
    x: &str,
    y: &str,
    ws: &mut Workspace,
) -> Result<Solution> {
    let v = factor.var.as_str();
    let test = if v == x {
        format!("\\frac{{M_{y} - N_{x}}}{{N}}")
    } else {
        format!("\\frac{{N_{x} - M_{y}}}{{M}}")
    };
    ws.trace.push(
        "Find the integrating factor",
        format!(
            "The form is not exact, but this ratio depends on {v} alone, so μ({v}) = e^(∫ ratio d{v}) works. \
             The absolute value from the logarithm is dropped."
        ),
        Math::Latex(format!(
            "{test} = {} \\quad\\Rightarrow\\quad \\mu({v}) = e^{{{}}} = {}",
            latex(&factor.ratio),
            integral(&factor.ratio, v),
            latex(&factor.mu)
        )),
    );

    let scaled = DifferentialForm {
        m: normalize(mul(factor.mu.clone(), m.clone())),
        n: normalize(mul(factor.mu.clone(), n.clone())),
    };
    ws.trace.push(
        "Multiply through by the integrating factor",
        "The new form is exact.",
        Math::Latex(scaled.latex(x, y)),
    );
    exact::solve(&scaled.m, &scaled.n, x, y, ws)
}

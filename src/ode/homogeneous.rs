use crate::error::Result;
use crate::expr::{div, mul, sub, Expr};
use crate::format::pretty;
use crate::simplify::{normalize, substitute};
use crate::steps::Math;

use super::{auxiliary, forms, separable, Solution, Workspace};

/// `y' = f(x, y)` with `f` of degree zero: `y = v x` separates the variables.
pub(super) fn solve(f: &Expr, x: &str, y: &str, ws: &mut Workspace) -> Result<Solution> {
    let v = auxiliary("v", &[x, y]);
    ws.trace.push(
        format!("Substitute {y} = {v}{x}"),
        format!("Then d{y}/d{x} = {v} + {x} d{v}/d{x}."),
        Math::Latex(format!(
            "{y} = {v}{x},\\quad \\frac{{d{y}}}{{d{x}}} = {v} + {x}\\frac{{d{v}}}{{d{x}}}"
        )),
    );

    let reduced = forms::homogeneous_reduction(f, x, y, &v)?;
    let right = separable::over_common_denominator(&sub(reduced, Expr::var(v.as_str())))?;
    ws.trace.push(
        "Reduced separable equation",
        format!("The {x} terms cancel, leaving an equation in {v} and {x} that separates."),
        Math::Equation(
            mul(Expr::var(x), Expr::derivative(v.as_str(), x, 1)),
            right.clone(),
        ),
    );

    let g = div(crate::expr::one(), Expr::var(x));
    let v_solution = if right.is_zero() {
        // x v' = 0
        let c = ws.constants.fresh()?;
        ws.trace.push(
            format!("Solve for {v}"),
            format!("{v} is constant."),
            Math::Equation(Expr::var(v.as_str()), c.clone()),
        );
        Solution {
            lhs: Expr::var(v.as_str()),
            rhs: c,
            constants: ws.constants.used(),
        }
    } else {
        separable::solve(&normalize(g), &right, x, &v, ws)?
    };

    let ratio = div(Expr::var(y), Expr::var(x));
    let solution = if v_solution.is_explicit(&v) {
        Solution {
            lhs: Expr::var(y),
            rhs: ws.polish(&mul(Expr::var(x), v_solution.rhs.clone())),
            constants: v_solution.constants,
        }
    } else {
        Solution {
            lhs: normalize(substitute(&v_solution.lhs, &v, &ratio)),
            rhs: normalize(substitute(&v_solution.rhs, &v, &ratio)),
            constants: v_solution.constants,
        }
    };
    ws.trace.push(
        "Back-substitute",
        format!("Replace {v} by {}.", pretty(&ratio)),
        Math::Equation(solution.lhs.clone(), solution.rhs.clone()),
    );
    Ok(solution)
}

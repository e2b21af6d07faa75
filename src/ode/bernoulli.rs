use num_traits::One;

use crate::error::{Result, SolveError};
use crate::expr::{add, mul, pow, Expr, Rational};
use crate::format::latex;
use crate::simplify::normalize;
use crate::steps::Math;

use super::{auxiliary, isolate, linear, Solution, Workspace};

/// `y' + P y = Q y^n`: `v = y^(1-n)` turns it linear.
pub(super) fn solve(
    p: &Expr,
    q: &Expr,
    n: &Rational,
    x: &str,
    y: &str,
    ws: &mut Workspace,
) -> Result<Solution> {
    let v = auxiliary("v", &[x, y]);
    let k = Rational::one() - n;
    let substitution = normalize(pow(Expr::var(y), Expr::Constant(k.clone())));
    let chain = normalize(mul(
        Expr::Constant(k.clone()),
        pow(Expr::var(y), Expr::Constant(-n.clone())),
    ));
    ws.trace.push(
        format!("Substitute {v} = {y}^(1-n)"),
        format!("With n = {n}, dividing by {y}^n and setting {v} = {y}^(1-n) removes the nonlinear term."),
        Math::Latex(format!(
            "{v} = {},\\quad \\frac{{d{v}}}{{d{x}}} = {} \\frac{{d{y}}}{{d{x}}}",
            latex(&substitution),
            latex(&chain)
        )),
    );

    let reduced_p = normalize(mul(Expr::Constant(k.clone()), p.clone()));
    let reduced_q = normalize(mul(Expr::Constant(k), q.clone()));
    let derivative = Expr::derivative(v.as_str(), x, 1);
    let lhs = if reduced_p.is_zero() {
        derivative
    } else {
        add(derivative, normalize(mul(reduced_p.clone(), Expr::var(v.as_str()))))
    };
    ws.trace.push(
        "Reduced linear equation",
        format!("In terms of {v} the equation is linear."),
        Math::Equation(lhs, reduced_q.clone()),
    );

    let reduced = linear::solve(&reduced_p, &reduced_q, x, &v, ws)?;
    if !reduced.is_explicit(&v) {
        return Err(SolveError::invariant("linear method returned an implicit solution"));
    }

    let solution = isolate::finish(&substitution, &reduced.rhs, y, ws)?;
    ws.trace.push(
        "Back-substitute",
        format!("Replace {v} by {} and solve for {y}.", crate::format::pretty(&substitution)),
        Math::Equation(solution.lhs.clone(), solution.rhs.clone()),
    );
    Ok(solution)
}

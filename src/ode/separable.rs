use crate::error::{Result, SolveError};
use crate::expr::{add, div, mul, Expr};
use crate::format::{integral, latex, pretty};
use crate::simplify::{is_zero, together, try_normalize};
use crate::steps::Math;

use super::{integrate, isolate, Solution, Workspace};

/// `dy/dx = g(x) h(y)`: separate, integrate both sides, solve for `y` where possible.
pub(super) fn solve(g: &Expr, h: &Expr, x: &str, y: &str, ws: &mut Workspace) -> Result<Solution> {
    let inverse = reciprocal(h)?;
    let left = with_differential(&inverse, y);
    let right = with_differential(g, x);
    let description = if h.is_one() {
        format!("Multiply both sides by d{x}.")
    } else {
        format!("Divide by {} and multiply by d{x}, so each side involves one variable.", pretty(h))
    };
    ws.trace
        .push("Separate the variables", description, Math::Equation(left, right));
    solve_separated(g, h, x, y, ws)
}

/// Integrates `(1/h) dy = g dx` and combines the sides. Shared by the methods that reduce to a
/// separable equation.
pub(super) fn solve_separated(
    g: &Expr,
    h: &Expr,
    x: &str,
    y: &str,
    ws: &mut Workspace,
) -> Result<Solution> {
    let inverse = reciprocal(h)?;
    let g = over_common_denominator(g)?;
    let g = &g;
    let left = integrate(y, &inverse)?;
    ws.trace.push(
        "Integrate the left side",
        format!("Integrate with respect to {y}."),
        Math::Latex(format!("{} = {}", integral(&inverse, y), latex(&left))),
    );
    let right = integrate(x, g)?;
    ws.trace.push(
        "Integrate the right side",
        format!("Integrate with respect to {x}."),
        Math::Latex(format!("{} = {}", integral(g, x), latex(&right))),
    );

    let c = ws.constants.fresh()?;
    let solution = isolate::finish(&left, &add(right, c.clone()), y, ws)?;
    let mut description = format!("Equate the two integrals and add the constant {c}.");
    if solution.is_explicit(y) {
        description.push_str(&format!(" Solving for {y} gives the general solution."));
        if has_log_abs(&left) {
            description.push_str(" The sign of the absolute value is absorbed into the constant.");
        }
    } else {
        description.push_str(&format!(
            " The relation cannot be solved for {y} in closed form, so it is left implicit."
        ));
    }
    ws.trace.push(
        format!("Combine and solve for {y}"),
        description,
        Math::Equation(solution.lhs.clone(), solution.rhs.clone()),
    );
    Ok(solution)
}

/// `1/h` with `h` first brought over one denominator, so no fraction is left nested.
fn reciprocal(h: &Expr) -> Result<Expr> {
    let (num, den) = together(h)?;
    if is_zero(&num)? {
        return Err(SolveError::unsolvable(format!("cannot divide by {h}, which vanishes")));
    }
    try_normalize(&div(den, num))
}

pub(super) fn over_common_denominator(expr: &Expr) -> Result<Expr> {
    let (num, den) = together(expr)?;
    try_normalize(&div(num, den))
}

fn with_differential(coeff: &Expr, var: &str) -> Expr {
    if coeff.is_one() {
        Expr::differential(var)
    } else {
        mul(coeff.clone(), Expr::differential(var))
    }
}

fn has_log_abs(expr: &Expr) -> bool {
    match expr {
        Expr::Log(inner) if matches!(**inner, Expr::Abs(_)) => true,
        other => match other.binary_args() {
            Some((a, b)) => has_log_abs(a) || has_log_abs(b),
            None => other.unary_arg().is_some_and(has_log_abs),
        },
    }
}

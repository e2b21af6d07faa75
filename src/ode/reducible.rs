use crate::equation::Equation;
use crate::error::{Result, SolveError};
use crate::expr::{self, add, mul, Expr};
use crate::format::{integral, latex};
use crate::simplify::{linear_coefficients, substitute_derivative};
use crate::steps::Math;

use super::{auxiliary, classify, separable, solve_shape, ReducibleCase, Solution, Workspace};

/// Second-order equations missing `y` or `x`: lower the order with `p = y'`, solve the
/// first-order equation for `p`, then recover `y`.
pub(super) fn solve(eq: &Equation, case: ReducibleCase, ws: &mut Workspace) -> Result<Solution> {
    let (x, y) = (eq.independent.as_str(), eq.dependent.as_str());
    let p = auxiliary("p", &[x, y]);
    let p_var = Expr::var(p.as_str());
    let residual = eq.residual();

    let (reduced, new_independent) = match case {
        ReducibleCase::MissingDependent => {
            ws.trace.push(
                format!("Substitute {p} = {y}'"),
                format!("{y} itself does not appear, so {p}({x}) = d{y}/d{x} lowers the order."),
                Math::Latex(format!(
                    "{p} = \\frac{{d{y}}}{{d{x}}},\\quad \\frac{{d^{{2}}{y}}}{{d{x}^{{2}}}} = \\frac{{d{p}}}{{d{x}}}"
                )),
            );
            let second = Expr::derivative(p.as_str(), x, 1);
            (reduce(&residual, y, &second, &p_var), x)
        }
        ReducibleCase::MissingIndependent => {
            ws.trace.push(
                format!("Substitute {p} = {y}' as a function of {y}"),
                format!("{x} does not appear, so {y} becomes the independent variable."),
                Math::Latex(format!(
                    "{p} = \\frac{{d{y}}}{{d{x}}},\\quad \\frac{{d^{{2}}{y}}}{{d{x}^{{2}}}} = {p}\\frac{{d{p}}}{{d{y}}}"
                )),
            );
            let second = mul(p_var.clone(), Expr::derivative(p.as_str(), y, 1));
            (reduce(&residual, y, &second, &p_var), y)
        }
    };
    let reduced = Equation {
        lhs: reduced,
        rhs: expr::zero(),
        independent: new_independent.to_string(),
        dependent: p.clone(),
        form: None,
        conditions: Vec::new(),
    };
    let classification = classify::detect(&reduced, &ws.config).map_err(|err| {
        SolveError::unsolvable(format!("the reduced equation cannot be solved: {}", err.message()))
    })?;
    ws.trace.push(
        "Reduced first-order equation",
        format!("The reduced equation is {}.", classification.class.label()),
        Math::Latex(reduced.latex()),
    );

    let first = solve_shape(&reduced, &classification.shape, ws)?;
    if !first.is_explicit(&p) {
        return Err(SolveError::unsolvable(format!(
            "the reduced equation has only the implicit solution {first}, so {y} cannot be recovered"
        )));
    }

    match case {
        ReducibleCase::MissingDependent => {
            let antiderivative = super::integrate(x, &first.rhs)?;
            let c = ws.constants.fresh()?;
            let rhs = ws.polish(&ws.absorb(&add(antiderivative, c)));
            ws.trace.push(
                format!("Integrate to recover {y}"),
                format!("{y} is the integral of {p} plus a second constant."),
                Math::Latex(format!("{y} = {} = {}", integral(&first.rhs, x), latex(&rhs))),
            );
            Ok(Solution {
                lhs: Expr::var(y),
                rhs,
                constants: ws.constants.used(),
            })
        }
        ReducibleCase::MissingIndependent => {
            let (g, h) = split_constant(&first.rhs, &first.constants)?;
            ws.trace.push(
                format!("Recover {y}"),
                format!("d{y}/d{x} = {p}({y}) is separable."),
                Math::Equation(Expr::derivative(y, x, 1), first.rhs.clone()),
            );
            separable::solve(&g, &h, x, y, ws)
        }
    }
}

fn reduce(residual: &Expr, y: &str, second: &Expr, first: &Expr) -> Expr {
    let replaced = substitute_derivative(residual, y, 2, second);
    substitute_derivative(&replaced, y, 1, first)
}

/// `P(y) = C h(y)` splits into `g = C`, `h`, so the constant stays on the `x` side.
fn split_constant(p: &Expr, constants: &[String]) -> Result<(Expr, Expr)> {
    for name in constants {
        if let Some((coeff, rest)) = linear_coefficients(p, name)? {
            if rest.is_zero() && !constants.iter().any(|c| coeff.contains_var(c)) {
                return Ok((Expr::var(name.clone()), coeff));
            }
        }
    }
    Ok((expr::one(), p.clone()))
}

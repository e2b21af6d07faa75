use crate::calculus::differentiate;
use crate::equation::Equation;
use crate::error::{Result, SolveError};
use crate::expr::{self, sub, Expr};
use crate::format::latex;
use crate::linear_system::{solve_linear, LinearResult};
use crate::simplify::{normalize, substitute, substitute_many};
use crate::steps::Math;

use super::isolate::isolate;
use super::{Solution, Workspace};

/// Fixes the arbitrary constants of a general solution from the equation's initial conditions.
pub(crate) fn apply_conditions(
    eq: &Equation,
    solution: Solution,
    ws: &mut Workspace,
) -> Result<Solution> {
    let conditions = &eq.conditions;
    if conditions.is_empty() {
        return Ok(solution);
    }
    let (x, y) = (eq.independent.as_str(), eq.dependent.as_str());
    if conditions.len() > solution.constants.len() {
        return Err(SolveError::unsolvable(format!(
            "{} initial conditions given but the general solution has {} arbitrary constants",
            conditions.len(),
            solution.constants.len()
        )));
    }

    for condition in conditions {
        let mut symbols = condition.at.free_symbols();
        symbols.extend(condition.value.free_symbols());
        if symbols.contains(x) || symbols.contains(y) {
            return Err(SolveError::unsolvable(format!(
                "the condition {} must use numbers, not {x} or {y}",
                condition.latex(y)
            )));
        }
    }

    let explicit = solution.is_explicit(y);
    let mut equations = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let equation = if explicit {
            let mut derivative = solution.rhs.clone();
            for _ in 0..condition.order {
                derivative = normalize(differentiate(x, &derivative));
            }
            normalize(sub(
                substitute(&derivative, x, &condition.at),
                condition.value.clone(),
            ))
        } else {
            if condition.order > 0 {
                return Err(SolveError::unsolvable(format!(
                    "the condition {} needs an explicit solution for {y}",
                    condition.latex(y)
                )));
            }
            let point = [
                (x.to_string(), condition.at.clone()),
                (y.to_string(), condition.value.clone()),
            ];
            normalize(sub(
                substitute_many(&solution.rhs, &point),
                substitute_many(&solution.lhs, &point),
            ))
        };
        tracing::debug!(target: "solver", %equation, "condition equation");
        equations.push(equation);
    }

    let (assignment, remaining) = fit(&solution.constants, &equations)?;
    let rhs = ws.polish(&substitute_many(&solution.rhs, &assignment));
    let lhs = if explicit {
        solution.lhs.clone()
    } else {
        normalize(substitute_many(&solution.lhs, &assignment))
    };

    ws.trace.push(
        "Apply the initial conditions",
        format!(
            "Substitute {} into the general solution and solve for the constants.",
            conditions
                .iter()
                .map(|c| c.latex(y))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Math::Latex(
            assignment
                .iter()
                .map(|(name, value)| format!("{} = {}", latex(&Expr::var(name.as_str())), latex(value)))
                .collect::<Vec<_>>()
                .join(",\\quad "),
        ),
    );
    ws.trace.push(
        "Particular solution",
        "The solution satisfying the initial conditions.",
        Math::Equation(lhs.clone(), rhs.clone()),
    );
    Ok(Solution {
        lhs,
        rhs,
        constants: remaining,
    })
}

/// Values for the determined constants and the names that stay free.
fn fit(constants: &[String], equations: &[Expr]) -> Result<(Vec<(String, Expr)>, Vec<String>)> {
    let result = match solve_linear(constants, equations) {
        Ok(result) => result,
        // A single constant entering nonlinearly, as in y = 1/(C - x).
        Err(_) if constants.len() == 1 && equations.len() == 1 => {
            let value = isolate(&equations[0], &expr::zero(), &constants[0], &[])?
                .ok_or_else(|| {
                    SolveError::unsolvable(format!(
                        "cannot solve {} = 0 for {}",
                        equations[0], constants[0]
                    ))
                })?;
            LinearResult::Unique(vec![value])
        }
        Err(err) => {
            return Err(SolveError::unsolvable(format!(
                "the initial conditions do not determine the constants: {}",
                err.message()
            )))
        }
    };
    match result {
        LinearResult::Unique(values) => Ok((constants.iter().cloned().zip(values).collect(), Vec::new())),
        LinearResult::Underdetermined { values, free } => {
            let assignment = constants
                .iter()
                .cloned()
                .zip(values)
                .filter(|(name, _)| !free.contains(name))
                .collect();
            Ok((assignment, free))
        }
        LinearResult::Inconsistent => Err(SolveError::unsolvable(
            "the initial conditions are inconsistent with the general solution",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::equation::InitialCondition;
    use crate::expr::{add, exp, int, mul};
    use crate::parser::parse_equation;
    use crate::simplify::equivalent;

    #[test]
    fn first_order_constant_is_fixed() {
        let eq = parse_equation("y' = y").unwrap().with_conditions(vec![InitialCondition {
            order: 0,
            at: int(0),
            value: int(3),
        }]);
        let mut ws = Workspace::new(1, SolverConfig::default());
        let general = Solution {
            lhs: Expr::var("y"),
            rhs: mul(Expr::var("C"), exp(Expr::var("x"))),
            constants: vec!["C".to_string()],
        };
        let particular = apply_conditions(&eq, general, &mut ws).unwrap();
        assert!(equivalent(&particular.rhs, &mul(int(3), exp(Expr::var("x")))).unwrap());
        assert!(particular.constants.is_empty());
        assert_eq!(ws.trace.len(), 2);
    }

    #[test]
    fn derivative_condition_uses_the_derivative() {
        // y = C1 + C2 x with y(0) = 1, y'(0) = 2
        let eq = parse_equation("y'' = 0").unwrap().with_conditions(vec![
            InitialCondition { order: 0, at: int(0), value: int(1) },
            InitialCondition { order: 1, at: int(0), value: int(2) },
        ]);
        let mut ws = Workspace::new(2, SolverConfig::default());
        let general = Solution {
            lhs: Expr::var("y"),
            rhs: add(Expr::var("C1"), mul(Expr::var("C2"), Expr::var("x"))),
            constants: vec!["C1".to_string(), "C2".to_string()],
        };
        let particular = apply_conditions(&eq, general, &mut ws).unwrap();
        let expected = add(int(1), mul(int(2), Expr::var("x")));
        assert!(equivalent(&particular.rhs, &expected).unwrap());
    }

    #[test]
    fn too_many_conditions_are_rejected() {
        let eq = parse_equation("y' = y").unwrap().with_conditions(vec![
            InitialCondition { order: 0, at: int(0), value: int(1) },
            InitialCondition { order: 0, at: int(1), value: int(2) },
        ]);
        let mut ws = Workspace::new(1, SolverConfig::default());
        let general = Solution {
            lhs: Expr::var("y"),
            rhs: mul(Expr::var("C"), exp(Expr::var("x"))),
            constants: vec!["C".to_string()],
        };
        let err = apply_conditions(&eq, general, &mut ws).unwrap_err();
        assert_eq!(err.kind(), "unsolvable_error");
    }
}

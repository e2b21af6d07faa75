use crate::solve::SolutionResult;
use crate::steps::Math;

use super::pretty;

/// Render a `SolutionResult` into human-readable lines for the CLI.
pub fn solve_summary(result: &SolutionResult) -> Vec<String> {
    let mut lines = vec![format!("Equation: {}", result.equation)];
    for condition in &result.equation.conditions {
        lines.push(format!(
            "  {}{}({}) = {}",
            result.equation.dependent,
            "'".repeat(condition.order as usize),
            pretty(&condition.at),
            pretty(&condition.value)
        ));
    }
    lines.push(format!("Type: {} ({})", result.class, result.reason));
    for (index, step) in result.steps.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, step.title));
        if !step.description.is_empty() {
            lines.push(format!("   {}", step.description));
        }
        lines.push(format!("   {}", math_text(&step.math)));
    }
    lines.push(format!("Solution: {}", result.solution));
    lines
}

fn math_text(math: &Math) -> String {
    match math {
        Math::Equation(lhs, rhs) => format!("{} = {}", pretty(lhs), pretty(rhs)),
        Math::Expr(e) => pretty(e),
        Math::Latex(s) => s.clone(),
    }
}

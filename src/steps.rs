//! Human-readable derivation steps.

use crate::expr::Expr;
use crate::format;

/// The mathematical content of a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Math {
    Equation(Expr, Expr),
    Expr(Expr),
    /// Already typeset, for content that is not a single equation (integrals, systems).
    Latex(String),
}

impl Math {
    pub fn latex(&self) -> String {
        match self {
            Math::Equation(lhs, rhs) => format::equation(lhs, rhs),
            Math::Expr(e) => format::latex(e),
            Math::Latex(s) => s.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub title: String,
    pub description: String,
    pub math: Math,
}

impl Step {
    pub fn latex(&self) -> String {
        self.math.latex()
    }
}

/// Append-only list of steps. A step is pushed whole or not at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepTrace {
    steps: Vec<Step>,
}

impl StepTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, title: impl Into<String>, description: impl Into<String>, math: Math) {
        let step = Step {
            title: title.into(),
            description: description.into(),
            math,
        };
        tracing::trace!(target: "solver", title = %step.title, "step");
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::int;

    #[test]
    fn steps_keep_their_order() {
        let mut trace = StepTrace::new();
        trace.push("first", "", Math::Expr(int(1)));
        trace.push("second", "", Math::Equation(Expr::var("y"), int(2)));
        let titles: Vec<&str> = trace.steps().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["first", "second"]);
        assert_eq!(trace.steps()[1].latex(), "y = 2");
    }
}

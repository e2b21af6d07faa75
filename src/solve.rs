//! Entry points: parse, classify, run the method, then check the result.

use crate::config::SolverConfig;
use crate::equation::Equation;
use crate::error::{Result, SolveError};
use crate::ode::{self, Classification, EquationClass, Solution, Workspace};
use crate::parser::parse_equation;
use crate::steps::{Math, Step};

/// A solved equation with its derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolutionResult {
    pub equation: Equation,
    pub class: EquationClass,
    /// Why the class applies.
    pub reason: String,
    pub solution: Solution,
    pub steps: Vec<Step>,
}

impl SolutionResult {
    /// The equation as written, followed by its initial conditions.
    pub fn original_latex(&self) -> String {
        let y = self.equation.dependent.as_str();
        std::iter::once(self.equation.latex())
            .chain(self.equation.conditions.iter().map(|c| c.latex(y)))
            .collect::<Vec<_>>()
            .join(",\\quad ")
    }

    pub fn solution_latex(&self) -> String {
        self.solution.latex()
    }

    /// Substitutes the solution back into the equation.
    pub fn verify(&self) -> Result<bool> {
        ode::verify(&self.equation, &self.solution)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Solver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves `text` with the declared method, after checking that it applies.
    pub fn solve(&self, text: &str, class: EquationClass) -> Result<SolutionResult> {
        self.solve_equation(parse_equation(text)?, Some(class))
    }

    /// Solves `text` with the first method that applies.
    pub fn solve_auto(&self, text: &str) -> Result<SolutionResult> {
        self.solve_equation(parse_equation(text)?, None)
    }

    pub fn classify(&self, text: &str, hint: Option<EquationClass>) -> Result<Classification> {
        let eq = parse_equation(text)?;
        self.classification(&eq, hint)
    }

    pub fn solve_equation(
        &self,
        eq: Equation,
        class: Option<EquationClass>,
    ) -> Result<SolutionResult> {
        let classification = self.classification(&eq, class)?;
        let mut ws = Workspace::new(eq.order(), self.config.clone());
        ws.trace.push(
            "Identify the equation type",
            format!(
                "The equation is {}: {}.",
                classification.class.label(),
                classification.reason
            ),
            Math::Latex(eq.latex()),
        );

        let general = ode::solve_shape(&eq, &classification.shape, &mut ws)?;
        let solution = ode::apply_conditions(&eq, general, &mut ws)?;
        if self.config.verify_solutions {
            self.check(&eq, &solution)?;
        }
        tracing::info!(
            target: "solver",
            class = %classification.class,
            steps = ws.trace.len(),
            %solution,
            "solved"
        );
        Ok(SolutionResult {
            equation: eq,
            class: classification.class,
            reason: classification.reason,
            solution,
            steps: ws.trace.into_steps(),
        })
    }

    fn classification(&self, eq: &Equation, hint: Option<EquationClass>) -> Result<Classification> {
        match hint {
            Some(class) => ode::classify(eq, class, &self.config),
            None if self.config.auto_detect => ode::detect(eq, &self.config),
            None => Err(SolveError::classification(
                "no equation type given and automatic detection is disabled",
            )),
        }
    }

    fn check(&self, eq: &Equation, solution: &Solution) -> Result<()> {
        match ode::verify(eq, solution) {
            Ok(true) => Ok(()),
            Ok(false) => Err(SolveError::invariant(format!(
                "{solution} does not satisfy {eq}"
            ))),
            Err(err) => {
                tracing::warn!(target: "solver", %solution, reason = %err, "solution left unchecked");
                Ok(())
            }
        }
    }
}

/// Solves with the default configuration and a declared class.
pub fn solve(text: &str, class: EquationClass) -> Result<SolutionResult> {
    Solver::default().solve(text, class)
}

/// Solves with the default configuration, detecting the class.
pub fn solve_auto(text: &str) -> Result<SolutionResult> {
    Solver::default().solve_auto(text)
}

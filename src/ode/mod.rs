//! Equation classes, their recognisers and the closed-form method for each.

mod bernoulli;
pub mod classify;
mod conditions;
mod constant_coefficient;
mod exact;
pub(crate) mod forms;
mod homogeneous;
mod integrating_factor;
mod isolate;
mod linear;
mod reducible;
mod separable;
mod undetermined;
mod verify;
mod workspace;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::equation::Equation;
use crate::error::{Result, SolveError};
use crate::expr::{Expr, Rational};
use crate::format;

pub use classify::{classify, detect, Classification};
pub(crate) use conditions::apply_conditions;
pub use forms::{IntegratingFactor, ReducibleCase};
pub use verify::verify;
pub(crate) use workspace::Workspace;

/// The nine supported equation classes. Wire identifiers follow the web client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquationClass {
    #[serde(rename = "separable")]
    Separable,
    #[serde(rename = "homogeneous")]
    Homogeneous,
    #[serde(rename = "exact")]
    Exact,
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "bernoulli")]
    Bernoulli,
    #[serde(rename = "reducible")]
    Reducible,
    #[serde(rename = "constant-coef", alias = "constant_coefficient", alias = "second_order_const")]
    ConstantCoefficient,
    #[serde(rename = "undetermined", alias = "undetermined_coefficients")]
    UndeterminedCoefficients,
    #[serde(rename = "integrating-factor", alias = "integrating_factor")]
    IntegratingFactor,
}

impl EquationClass {
    pub const ALL: [EquationClass; 9] = [
        EquationClass::Separable,
        EquationClass::Homogeneous,
        EquationClass::Exact,
        EquationClass::Linear,
        EquationClass::Bernoulli,
        EquationClass::Reducible,
        EquationClass::ConstantCoefficient,
        EquationClass::UndeterminedCoefficients,
        EquationClass::IntegratingFactor,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EquationClass::Separable => "separable",
            EquationClass::Homogeneous => "homogeneous",
            EquationClass::Exact => "exact",
            EquationClass::Linear => "linear",
            EquationClass::Bernoulli => "bernoulli",
            EquationClass::Reducible => "reducible",
            EquationClass::ConstantCoefficient => "constant-coef",
            EquationClass::UndeterminedCoefficients => "undetermined",
            EquationClass::IntegratingFactor => "integrating-factor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EquationClass::Separable => "separable",
            EquationClass::Homogeneous => "homogeneous",
            EquationClass::Exact => "exact",
            EquationClass::Linear => "linear",
            EquationClass::Bernoulli => "a Bernoulli equation",
            EquationClass::Reducible => "reducible to first order",
            EquationClass::ConstantCoefficient => "linear with constant coefficients",
            EquationClass::UndeterminedCoefficients => {
                "linear with constant coefficients and a forcing term"
            }
            EquationClass::IntegratingFactor => "exact after an integrating factor",
        }
    }
}

impl fmt::Display for EquationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EquationClass {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        let class = match key.as_str() {
            "separable" => EquationClass::Separable,
            "homogeneous" => EquationClass::Homogeneous,
            "exact" => EquationClass::Exact,
            "linear" => EquationClass::Linear,
            "bernoulli" => EquationClass::Bernoulli,
            "reducible" => EquationClass::Reducible,
            "constant-coef" | "constant-coefficient" | "second-order-const" => {
                EquationClass::ConstantCoefficient
            }
            "undetermined" | "undetermined-coefficients" => {
                EquationClass::UndeterminedCoefficients
            }
            "integrating-factor" => EquationClass::IntegratingFactor,
            _ => {
                return Err(SolveError::classification(format!(
                    "unknown equation type '{s}'"
                )))
            }
        };
        Ok(class)
    }
}

/// What a recogniser extracted; each variant carries exactly what its method needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// `y' = g(x) h(y)`
    Separable { g: Expr, h: Expr },
    /// `y' = f(x, y)` with `f(λx, λy) = f(x, y)`
    Homogeneous { f: Expr },
    /// `M dx + N dy = 0` with `M_y = N_x`
    Exact { m: Expr, n: Expr },
    /// `y' + P(x) y = Q(x)`
    Linear { p: Expr, q: Expr },
    /// `y' + P(x) y = Q(x) y^n`
    Bernoulli { p: Expr, q: Expr, n: Rational },
    /// Second order with `y` or `x` absent.
    Reducible { case: ReducibleCase },
    /// `Σ a_k y^(k) = 0`, `coeffs[k] = a_k`
    ConstantCoefficient { coeffs: Vec<Rational> },
    /// `Σ a_k y^(k) = forcing`
    UndeterminedCoefficients {
        coeffs: Vec<Rational>,
        forcing: Expr,
    },
    IntegratingFactor {
        m: Expr,
        n: Expr,
        factor: IntegratingFactor,
    },
}

impl Shape {
    pub fn class(&self) -> EquationClass {
        match self {
            Shape::Separable { .. } => EquationClass::Separable,
            Shape::Homogeneous { .. } => EquationClass::Homogeneous,
            Shape::Exact { .. } => EquationClass::Exact,
            Shape::Linear { .. } => EquationClass::Linear,
            Shape::Bernoulli { .. } => EquationClass::Bernoulli,
            Shape::Reducible { .. } => EquationClass::Reducible,
            Shape::ConstantCoefficient { .. } => EquationClass::ConstantCoefficient,
            Shape::UndeterminedCoefficients { .. } => EquationClass::UndeterminedCoefficients,
            Shape::IntegratingFactor { .. } => EquationClass::IntegratingFactor,
        }
    }
}

/// A general (or particular) solution: `lhs = rhs`, explicit when `lhs` is the dependent
/// variable itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub lhs: Expr,
    pub rhs: Expr,
    /// Arbitrary constants still present, in the order they were introduced.
    pub constants: Vec<String>,
}

impl Solution {
    pub fn is_explicit(&self, dependent: &str) -> bool {
        self.lhs.as_variable() == Some(dependent)
    }

    pub fn latex(&self) -> String {
        format::equation(&self.lhs, &self.rhs)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// Runs the method for `shape`, appending its steps to the workspace trace.
pub(crate) fn solve_shape(
    eq: &Equation,
    shape: &Shape,
    ws: &mut Workspace,
) -> Result<Solution> {
    let (x, y) = (eq.independent.as_str(), eq.dependent.as_str());
    tracing::debug!(target: "solver", class = %shape.class(), "applying method");
    match shape {
        Shape::Separable { g, h } => separable::solve(g, h, x, y, ws),
        Shape::Homogeneous { f } => homogeneous::solve(f, x, y, ws),
        Shape::Exact { m, n } => exact::solve(m, n, x, y, ws),
        Shape::Linear { p, q } => linear::solve(p, q, x, y, ws),
        Shape::Bernoulli { p, q, n } => bernoulli::solve(p, q, n, x, y, ws),
        Shape::Reducible { case } => reducible::solve(eq, *case, ws),
        Shape::ConstantCoefficient { coeffs } => {
            constant_coefficient::solve(coeffs, x, y, ws)
        }
        Shape::UndeterminedCoefficients { coeffs, forcing } => {
            undetermined::solve(coeffs, forcing, x, y, ws)
        }
        Shape::IntegratingFactor { m, n, factor } => {
            integrating_factor::solve(m, n, factor, x, y, ws)
        }
    }
}

/// Antiderivative without a constant; a missing closed form is reported as unsolvable.
pub(crate) fn integrate(var: &str, integrand: &Expr) -> Result<Expr> {
    crate::calculus::antiderivative(var, integrand).map_err(|err| {
        tracing::warn!(target: "integrate", %integrand, var, "no elementary antiderivative");
        err
    })
}

/// Name for a substituted function that clashes with neither variable of the equation.
pub(crate) fn auxiliary(preferred: &str, taken: &[&str]) -> String {
    [preferred, "u", "w", "z"]
        .into_iter()
        .find(|name| !taken.contains(name))
        .unwrap_or("q")
        .to_string()
}

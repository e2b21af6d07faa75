//! JSON request and response shapes used by the web client and the `json` subcommand.

use serde::{Deserialize, Serialize};

use crate::equation::InitialCondition;
use crate::error::{Result, SolveError};
use crate::ode::EquationClass;
use crate::parser::{parse_equation, Grammar};
use crate::solve::{SolutionResult, Solver};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub equation: String,
    /// Absent means detect the class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation_type: Option<EquationClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial_conditions: Vec<WireCondition>,
}

/// `y^(order)(x0) = value`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCondition {
    #[serde(default)]
    pub order: u32,
    pub x0: WireValue,
    pub value: WireValue,
}

/// Numbers may arrive as JSON integers or as expressions in a string (`"1/2"`, `"pi"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Integer(i64),
    Text(String),
}

impl WireValue {
    fn as_text(&self) -> String {
        match self {
            WireValue::Integer(n) => n.to_string(),
            WireValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub original_equation: String,
    pub solution: String,
    pub steps: Vec<WireStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireStep {
    pub title: String,
    pub description: String,
    /// LaTeX.
    pub equation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// `parse_error`, `classification_error`, `unsolvable_error` or `internal_invariant_error`.
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl From<&SolveError> for ErrorResponse {
    fn from(err: &SolveError) -> Self {
        ErrorResponse {
            error: err.kind().to_string(),
            message: err.message(),
            column: match err {
                SolveError::Parse { column, .. } => Some(*column),
                _ => None,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Solved(SolveResponse),
    Failed(ErrorResponse),
}

impl From<&SolutionResult> for SolveResponse {
    fn from(result: &SolutionResult) -> Self {
        SolveResponse {
            original_equation: result.original_latex(),
            solution: result.solution_latex(),
            steps: result
                .steps
                .iter()
                .map(|step| WireStep {
                    title: step.title.clone(),
                    description: step.description.clone(),
                    equation: step.latex(),
                })
                .collect(),
        }
    }
}

impl SolveRequest {
    /// Runs the request; conditions listed in the request are added to any written inline.
    pub fn run(&self, solver: &Solver) -> Result<SolutionResult> {
        let eq = parse_equation(&self.equation)?;
        let grammar = Grammar::new(eq.independent.clone(), eq.dependent.clone());
        let conditions = self
            .initial_conditions
            .iter()
            .map(|c| condition(&grammar, c))
            .collect::<Result<Vec<_>>>()?;
        solver.solve_equation(eq.with_conditions(conditions), self.equation_type)
    }
}

fn condition(grammar: &Grammar, wire: &WireCondition) -> Result<InitialCondition> {
    let text = format!(
        "{}{}({}) = {}",
        grammar.dependent,
        "'".repeat(wire.order as usize),
        wire.x0.as_text(),
        wire.value.as_text()
    );
    grammar.initial_condition(&text)
}

pub fn respond(solver: &Solver, request: &SolveRequest) -> Response {
    match request.run(solver) {
        Ok(result) => Response::Solved(SolveResponse::from(&result)),
        Err(err) => {
            tracing::debug!(target: "solver", kind = err.kind(), error = %err, "request failed");
            Response::Failed(ErrorResponse::from(&err))
        }
    }
}

/// Reads a request from JSON and writes the response as JSON.
pub fn respond_json(solver: &Solver, body: &str) -> String {
    let response = match serde_json::from_str::<SolveRequest>(body) {
        Ok(request) => respond(solver, &request),
        Err(err) => Response::Failed(ErrorResponse {
            error: "parse_error".to_string(),
            message: format!("invalid request: {err}"),
            column: Some(err.column()),
        }),
    };
    serde_json::to_string_pretty(&response).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case() {
        let request: SolveRequest = serde_json::from_str(
            r#"{"equation": "dy/dx = x*y", "equationType": "separable",
                "initialConditions": [{"x0": 0, "value": "2"}]}"#,
        )
        .unwrap();
        assert_eq!(request.equation_type, Some(EquationClass::Separable));
        assert_eq!(request.initial_conditions[0].order, 0);
        assert_eq!(request.initial_conditions[0].x0, WireValue::Integer(0));
    }

    #[test]
    fn legacy_class_ids_are_accepted() {
        let request: SolveRequest = serde_json::from_str(
            r#"{"equation": "y'' + y = 0", "equationType": "second_order_const"}"#,
        )
        .unwrap();
        assert_eq!(request.equation_type, Some(EquationClass::ConstantCoefficient));
    }

    #[test]
    fn errors_carry_their_kind() {
        let body = respond_json(&Solver::default(), r#"{"equation": "dy/dx = ="}"#);
        let response: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.error, "parse_error");
        assert!(response.column.is_some());
    }
}

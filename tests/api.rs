use odekit::api::{respond, respond_json, ErrorResponse, Response, SolveRequest, SolveResponse};
use odekit::{EquationClass, Solver};
use serde_json::Value;

#[test]
fn json_round_trip_for_a_separable_equation() {
    let body = respond_json(
        &Solver::default(),
        r#"{"equation": "dy/dx = x*y", "equationType": "separable"}"#,
    );
    let value: Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(value["solution"], "y = C e^{x^2/2}");
    assert!(value["originalEquation"].as_str().unwrap().contains("\\frac{dy}{dx}"));
    let steps = value["steps"].as_array().expect("steps");
    assert!(steps.len() >= 3);
    for step in steps {
        for key in ["title", "description", "equation"] {
            assert!(step[key].is_string(), "step without {key}: {step}");
        }
    }
}

#[test]
fn missing_type_means_detection() {
    let request = SolveRequest {
        equation: "dy/dx + 2*y = 4*x".to_string(),
        equation_type: None,
        initial_conditions: Vec::new(),
    };
    match respond(&Solver::default(), &request) {
        Response::Solved(SolveResponse { solution, .. }) => {
            assert_eq!(solution, "y = 2x - 1 + C e^{-2x}")
        }
        Response::Failed(err) => panic!("unexpected failure {err:?}"),
    }
}

#[test]
fn conditions_from_the_request() {
    let body = respond_json(
        &Solver::default(),
        r#"{"equation": "y'' + y = 0", "equationType": "constant-coef",
            "initialConditions": [
                {"order": 0, "x0": 0, "value": 0},
                {"order": 1, "x0": "0", "value": "1"}
            ]}"#,
    );
    let response: SolveResponse = serde_json::from_str(&body).expect("solved");
    assert_eq!(response.solution, "y = \\sin(x)");
    assert!(response.original_equation.contains("y'(0) = 1"));
    assert_eq!(
        response.steps.last().map(|s| s.title.as_str()),
        Some("Particular solution")
    );
}

#[test]
fn classification_errors_are_reported() {
    let request = SolveRequest {
        equation: "dy/dx = x*y".to_string(),
        equation_type: Some(EquationClass::Exact),
        initial_conditions: Vec::new(),
    };
    match respond(&Solver::default(), &request) {
        Response::Failed(ErrorResponse { error, column, .. }) => {
            assert_eq!(error, "classification_error");
            assert_eq!(column, None);
        }
        Response::Solved(found) => panic!("expected an error, got {found:?}"),
    }
}

#[test]
fn malformed_json_is_a_parse_error() {
    let body = respond_json(&Solver::default(), "{\"equation\": ");
    let response: ErrorResponse = serde_json::from_str(&body).expect("error body");
    assert_eq!(response.error, "parse_error");
    assert!(response.message.starts_with("invalid request"));
}

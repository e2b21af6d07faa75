use odekit::{solve, solve_auto, EquationClass, SolveError, Solver, SolverConfig};

fn class(id: &str) -> EquationClass {
    id.parse().expect("known class")
}

#[test]
fn malformed_input_is_a_parse_error() {
    for text in ["dy/dx = =", "dy/dx = (x + y", "dy/dx = x +", "", "dy/dx = foo(x)"] {
        let err = solve(text, class("separable")).unwrap_err();
        assert_eq!(err.kind(), "parse_error", "{text:?}: {err}");
    }
    match solve_auto("dy/dx = (x + y").unwrap_err() {
        SolveError::Parse { column, .. } => assert!(column > 0),
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn unknown_class_names_are_rejected() {
    let err = "quadratic".parse::<EquationClass>().unwrap_err();
    assert_eq!(err.kind(), "classification_error");
    assert_eq!(class("second_order_const"), EquationClass::ConstantCoefficient);
    assert_eq!(class("integrating_factor"), EquationClass::IntegratingFactor);
}

#[test]
fn wrong_class_is_a_classification_error() {
    let cases = [
        ("dy/dx = x*y", "exact"),
        ("dy/dx = x + y^2", "linear"),
        ("y'' + y = 0", "separable"),
        ("dy/dx = x*y", "constant-coef"),
        ("y'' + y = 0", "undetermined"),
    ];
    for (text, id) in cases {
        let err = solve(text, class(id)).unwrap_err();
        assert_eq!(err.kind(), "classification_error", "{text} as {id}: {err}");
    }
}

#[test]
fn not_a_differential_equation() {
    let err = solve_auto("x + y = 1").unwrap_err();
    assert_eq!(err.kind(), "classification_error");
}

#[test]
fn non_elementary_integral_is_unsolvable() {
    let err = solve("dy/dx = exp(x^2)", class("separable")).unwrap_err();
    assert_eq!(err.kind(), "unsolvable_error", "{err}");
}

#[test]
fn inconsistent_conditions_are_unsolvable() {
    let err = solve("y' = y; y(0) = 1; y(1) = 1", class("separable")).unwrap_err();
    assert_eq!(err.kind(), "unsolvable_error", "{err}");
}

#[test]
fn detection_can_be_switched_off() {
    let solver = Solver::new(SolverConfig {
        auto_detect: false,
        ..SolverConfig::default()
    });
    let err = solver.solve_auto("dy/dx = x*y").unwrap_err();
    assert_eq!(err.kind(), "classification_error");
    assert!(solver.solve("dy/dx = x*y", class("separable")).is_ok());
}

#[test]
fn order_limit_comes_from_the_config() {
    let solver = Solver::new(SolverConfig {
        max_order: 2,
        ..SolverConfig::default()
    });
    let err = solver.solve_auto("y''' - y' = 0").unwrap_err();
    assert_eq!(err.kind(), "classification_error");
    assert!(Solver::default().solve_auto("y''' - y' = 0").is_ok());
}

#[test]
fn conditions_must_be_numeric() {
    let err = solve("y' = y; y(0) = x", class("separable")).unwrap_err();
    assert_eq!(err.kind(), "unsolvable_error", "{err}");
}

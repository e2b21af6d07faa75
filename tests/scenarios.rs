//! Worked examples end to end: class, derivation and final answer.

use odekit::simplify::{equivalent, substitute_many};
use odekit::{parse_expr, solve, solve_auto, EquationClass, Expr, SolutionResult};

fn class(id: &str) -> EquationClass {
    id.parse().expect("known class")
}

fn solved(text: &str, id: &str) -> SolutionResult {
    solve(text, class(id)).unwrap_or_else(|err| panic!("{text} as {id}: {err}"))
}

fn assert_rhs(result: &SolutionResult, expected: &str) {
    let expected = parse_expr(expected).expect("parse expected");
    assert!(
        equivalent(&result.solution.rhs, &expected).expect("canonical form"),
        "got {}, expected {expected}",
        result.solution
    );
}

fn has_step(result: &SolutionResult, latex: &str) -> bool {
    result.steps.iter().any(|s| s.latex().contains(latex))
}

fn assert_verified(result: &SolutionResult) {
    assert!(
        result.verify().expect("checkable solution"),
        "{} does not satisfy {}",
        result.solution,
        result.equation
    );
}

#[test]
fn separable_growth() {
    let result = solved("dy/dx = x*y", "separable");
    assert_eq!(result.class, EquationClass::Separable);
    assert_eq!(result.solution_latex(), "y = C e^{x^2/2}");
    assert!(has_step(&result, "\\frac{1}{y}\\,dy = x\\,dx"), "{:#?}", result.steps);
    assert_eq!(result.steps[0].title, "Identify the equation type");
    assert_verified(&result);
}

#[test]
fn linear_with_integrating_factor() {
    let result = solved("dy/dx + 2*y = 4*x", "linear");
    assert!(has_step(&result, "e^{2x}"));
    assert_eq!(result.solution_latex(), "y = 2x - 1 + C e^{-2x}");
    assert_verified(&result);
}

#[test]
fn exact_differential_form() {
    let result = solved("(2*x+y)dx + (x+2*y)dy = 0", "exact");
    assert_eq!(result.solution_latex(), "x^2 + xy + y^2 = C");
    assert_verified(&result);
}

#[test]
fn homogeneous_substitution() {
    let result = solved("dy/dx = (x+y)/x", "homogeneous");
    assert!(has_step(&result, "x \\frac{dv}{dx} = 1"), "{:#?}", result.steps);
    assert_rhs(&result, "x*(ln(abs(x)) + C)");
    assert_verified(&result);
}

#[test]
fn bernoulli_reduction() {
    let result = solved("dy/dx + y = y^2*x", "bernoulli");
    assert!(result.steps.iter().any(|s| s.description.contains("n = 2")));
    assert!(has_step(&result, "\\frac{dv}{dx} - v = -x"), "{:#?}", result.steps);
    assert_rhs(&result, "1/(x + 1 + C*exp(x))");
    assert_verified(&result);
}

#[test]
fn declared_class_is_checked() {
    let err = solve("dy/dx = x*y", class("exact")).unwrap_err();
    assert_eq!(err.kind(), "classification_error");
    assert!(err.message().contains("exact"));
}

#[test]
fn constant_coefficients() {
    let result = solved("y'' - 3y' + 2y = 0", "constant-coef");
    assert_rhs(&result, "C1*exp(2x) + C2*exp(x)");
    assert_eq!(result.solution.constants, ["C1", "C2"]);
    assert_verified(&result);

    let result = solved("y'' + 4y = 0", "constant-coef");
    assert_rhs(&result, "C1*cos(2x) + C2*sin(2x)");
    assert_verified(&result);
}

#[test]
fn undetermined_coefficients() {
    let result = solved("y'' - 3y' + 2y = 4x", "undetermined");
    let particular = substitute_many(
        &result.solution.rhs,
        &[
            ("C1".to_string(), Expr::integer(0)),
            ("C2".to_string(), Expr::integer(0)),
        ],
    );
    let expected = parse_expr("2x + 3").expect("parse expected");
    assert!(equivalent(&particular, &expected).expect("canonical form"));
    assert_verified(&result);

    let result = solved("y'' + y = sin(2x)", "undetermined");
    assert_verified(&result);
}

#[test]
fn integrating_factor_makes_the_form_exact() {
    let result = solved("(3*x*y + y^2)dx + (x^2 + x*y)dy = 0", "integrating-factor");
    assert!(result.steps.iter().any(|s| s.title == "Find the integrating factor"));
    assert_verified(&result);
}

#[test]
fn reducible_without_the_independent_variable() {
    let result = solve_auto("y*y'' + (y')^2 = 0").expect("solves");
    assert_eq!(result.class, EquationClass::Reducible);
    assert_eq!(result.solution_latex(), "y^2 = C_{1} x + C_{2}");
    assert_verified(&result);
}

#[test]
fn reducible_without_the_dependent_variable() {
    // x y'' = y'  =>  y' = C1 x  =>  y = C1 x^2 / 2 + C2
    let result = solved("x*y'' = y'", "reducible");
    assert_eq!(result.solution.constants, ["C1", "C2"]);
    assert_verified(&result);
}

#[test]
fn initial_conditions_fix_the_constants() {
    let result = solve_auto("y' = y; y(0) = 2").expect("solves");
    assert_rhs(&result, "2 exp(x)");
    assert!(result.solution.constants.is_empty());
    assert!(result.original_latex().contains("y(0) = 2"));

    let result = solved("y'' + y = 0; y(0) = 0; y'(0) = 1", "constant-coef");
    assert_rhs(&result, "sin(x)");
}

#[test]
fn detection_picks_the_most_specific_class() {
    let cases = [
        ("dy/dx = x*y", EquationClass::Separable),
        ("dy/dx + 2*y = 4*x", EquationClass::Linear),
        ("(2*x+y)dx + (x+2*y)dy = 0", EquationClass::Exact),
        ("dy/dx + y = y^2*x", EquationClass::Bernoulli),
        ("y'' + y = x", EquationClass::UndeterminedCoefficients),
    ];
    for (text, expected) in cases {
        let result = solve_auto(text).unwrap_or_else(|err| panic!("{text}: {err}"));
        assert_eq!(result.class, expected, "{text}");
    }
}

#[test]
fn bernoulli_with_a_cubic_power() {
    // v = y^-2 gives v' - 2v = -2x, so 1/y^2 = x + 1/2 + C e^{2x}
    let result = solved("y' + y = x*y^3", "bernoulli");
    assert!(result.steps.iter().any(|s| s.description.contains("n = 3")));
    assert_verified(&result);

    let result = solved("y' - y = y^3", "bernoulli");
    assert_verified(&result);
}

#[test]
fn homogeneous_with_a_rational_reduced_equation() {
    for text in ["dy/dx = (y - x)/(y + x)", "dy/dx = (x - y)/(x + y)"] {
        let result = solved(text, "homogeneous");
        assert_eq!(result.class, EquationClass::Homogeneous);
        assert_verified(&result);
    }
}

#[test]
fn separated_sides_carry_no_sampled_constants() {
    let result = solved("dy/dx = sin(x)/cos(y)", "separable");
    let latex = result.solution_latex();
    assert!(!latex.contains("\\cos(1)"), "{latex}");
    assert_verified(&result);

    let result = solved("dy/dx = exp(x + y)", "separable");
    let latex = result.solution_latex();
    assert!(!latex.contains("x+1") && !latex.contains("x + 1"), "{latex}");
    assert_verified(&result);
}

#[test]
fn secant_and_cosecant_integrals() {
    let result = solved("dy/dx = x*cos(y)", "separable");
    assert_verified(&result);

    let result = solved("dy/dx = sin(x)*sin(y)", "separable");
    assert_verified(&result);
}

#[test]
fn products_and_powers_of_sinusoids_as_forcing() {
    for text in ["y'' + y = sin(3*x)*cos(x)", "y'' + y = sin(x)^2"] {
        let result = solved(text, "undetermined");
        assert_eq!(result.class, EquationClass::UndeterminedCoefficients);
        assert!(
            result.steps.iter().any(|s| s.title == "Rewrite the forcing term"),
            "{:#?}",
            result.steps
        );
        assert_verified(&result);
    }
}

#[test]
fn huge_powers_leave_no_unit_base() {
    let result = solved("dy/dx = x^1000", "separable");
    let latex = result.solution_latex();
    assert!(!latex.contains("1^"), "{latex}");
    assert_rhs(&result, "x^1001/1001 + C");
}

#[test]
fn reducible_with_a_symbolic_square() {
    // p = y' as a function of y: p = y^2 + C1, then y = √C1 tan(√C1 (x + C2))
    let result = solved("y'' = 2*y*y'", "reducible");
    assert_eq!(result.solution.constants, ["C1", "C2"]);
    assert!(result.solution.is_explicit("y"), "{}", result.solution);
    assert_verified(&result);
}

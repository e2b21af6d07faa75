use odekit::calculus::total_derivative;
use odekit::simplify::equivalent;
use odekit::{differentiate, parse_expr};

fn assert_diff_eq(var: &str, input: &str, expected: &str) {
    let expr = parse_expr(input).expect("parse input");
    let got = differentiate(var, &expr);
    let expected_expr = parse_expr(expected).expect("parse expected");
    assert!(
        equivalent(&got, &expected_expr).expect("canonical form"),
        "d/d{var} {input}: got {got}"
    );
}

#[test]
fn basic_vars_and_constants() {
    assert_diff_eq("x", "x", "1");
    assert_diff_eq("x", "y", "0");
    assert_diff_eq("x", "5", "0");
    assert_diff_eq("x", "C1 x", "C1");
}

#[test]
fn polynomials_and_products() {
    assert_diff_eq("x", "x^3", "3x^2");
    assert_diff_eq("x", "x*y", "y");
    assert_diff_eq("y", "x^2 + x y + y^2", "x + 2y");
}

#[test]
fn trig_and_exponentials() {
    assert_diff_eq("x", "sin(x)", "cos(x)");
    assert_diff_eq("x", "cos(2x)", "-2 sin(2x)");
    assert_diff_eq("x", "exp(x^2/2)", "x exp(x^2/2)");
    assert_diff_eq("x", "atan(x)", "1/(1 + x^2)");
}

#[test]
fn logarithms() {
    assert_diff_eq("x", "ln(x)", "1/x");
    assert_diff_eq("x", "ln(abs(x))", "1/x");
    assert_diff_eq("x", "x ln(abs(x))", "ln(abs(x)) + 1");
}

#[test]
fn total_derivative_follows_the_dependent_variable() {
    let expr = parse_expr("x y^2").expect("parse input");
    let got = total_derivative("x", "y", &expr);
    let expected = parse_expr("y^2 + 2 x y y'").expect("parse expected");
    assert!(equivalent(&got, &expected).expect("canonical form"), "got {got}");
    assert!(got.contains_derivative());
    assert_eq!(got.max_derivative_order(), Some(1));
}

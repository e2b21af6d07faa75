use odekit::simplify::equivalent;
use odekit::{
    antiderivative, differentiate, integrate, parse_expr, IntegrationResult, SolveError,
};
use odekit::calculus::{NonElementaryKind, ReasonCode};

/// Differentiating the antiderivative must give back the integrand.
fn assert_integrates(var: &str, input: &str) {
    let integrand = parse_expr(input).expect("parse integrand");
    let result = antiderivative(var, &integrand)
        .unwrap_or_else(|err| panic!("no antiderivative for {input}: {err}"));
    let back = differentiate(var, &result);
    assert!(
        equivalent(&back, &integrand).expect("canonical form"),
        "d/d{var} of {result} is not {input}"
    );
}

#[test]
fn polynomials_and_powers() {
    assert_integrates("x", "x^3");
    assert_integrates("x", "3x^2 - 2x + 7");
    assert_integrates("x", "x^(1/2)");
    assert_integrates("y", "y^-2");
}

#[test]
fn reciprocal_gives_logarithm() {
    assert_integrates("x", "1/x");
    assert_integrates("y", "1/y");
    let result = antiderivative("x", &parse_expr("1/x").expect("parse")).expect("integrates");
    assert_eq!(odekit::latex(&result), "\\ln|x|");
}

#[test]
fn exponentials_and_trig() {
    assert_integrates("x", "exp(2x)");
    assert_integrates("x", "x exp(x^2/2)");
    assert_integrates("x", "sin(3x)");
    assert_integrates("x", "cos(x)");
}

#[test]
fn reciprocal_trig_functions() {
    for input in ["1/cos(x)", "1/sin(2x)", "1/tan(x)"] {
        let integrand = parse_expr(input).expect("parse integrand");
        let result = antiderivative("x", &integrand)
            .unwrap_or_else(|err| panic!("no antiderivative for {input}: {err}"));
        assert!(odekit::latex(&result).contains("\\ln"), "{input}: {result}");
    }
    // ln|sin x| differentiates straight back to the cotangent
    let result = antiderivative("x", &parse_expr("1/tan(x)").expect("parse")).expect("integrates");
    let back = differentiate("x", &result);
    let expected = parse_expr("cos(x)/sin(x)").expect("parse");
    assert!(equivalent(&back, &expected).expect("canonical form"), "{back}");
}

#[test]
fn symbolic_constant_in_a_quadratic_denominator() {
    let integrand = parse_expr("1/(y^2 + k)").expect("parse");
    let result = antiderivative("y", &integrand).expect("integrates");
    assert!(odekit::latex(&result).contains("\\arctan"), "{result}");
    // a numeric constant still goes through partial fractions
    let result = antiderivative("y", &parse_expr("1/(y^2 - 4)").expect("parse")).expect("integrates");
    assert!(!odekit::latex(&result).contains("\\arctan"), "{result}");
}

#[test]
fn products_by_parts() {
    assert_integrates("x", "4x exp(2x)");
    assert_integrates("x", "x sin(x)");
    assert_integrates("x", "x^2 exp(-x)");
}

#[test]
fn rational_functions_by_partial_fractions() {
    assert_integrates("x", "1/(x^2 - 1)");
    assert_integrates("x", "1/(1 + x^2)");
    assert_integrates("y", "1/(y (1 - y))");
}

#[test]
fn other_variables_are_constants() {
    assert_integrates("x", "2x + y");
    assert_integrates("y", "x + 2y");
    assert_integrates("x", "C1");
}

#[test]
fn gaussian_is_reported_as_non_elementary() {
    let integrand = parse_expr("exp(x^2)").expect("parse");
    match integrate("x", &integrand) {
        IntegrationResult::NotIntegrable(report) => {
            assert_eq!(
                report.reason,
                Some(ReasonCode::NonElementary(NonElementaryKind::ExpOfPolynomial))
            );
        }
        other => panic!("unexpected result {other:?}"),
    }
    let err = antiderivative("x", &integrand).unwrap_err();
    assert!(matches!(err, SolveError::Unsolvable(_)));
}

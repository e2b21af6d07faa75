use odekit::simplify::equivalent;
use odekit::{parse_equation, parse_expr, Expr, Grammar};

fn same(a: &str, b: &str) {
    let (ea, eb) = (
        parse_expr(a).expect("parse left"),
        parse_expr(b).expect("parse right"),
    );
    assert!(equivalent(&ea, &eb).expect("canonical form"), "{a} vs {b}");
}

#[test]
fn derivative_notations_agree() {
    let leibniz = parse_equation("dy/dx = x*y").expect("parse");
    let prime = parse_equation("y' = x*y").expect("parse");
    assert_eq!(leibniz.lhs, prime.lhs);
    assert_eq!(leibniz.order(), 1);

    let second = parse_equation("d^2y/dx^2 + y = 0").expect("parse");
    assert_eq!(second.order(), 2);
    assert_eq!(
        parse_expr("y''").expect("parse"),
        Expr::derivative("y", "x", 2)
    );
}

#[test]
fn implicit_multiplication_and_powers() {
    same("2xy", "2*x*y");
    same("x**2", "x^2");
    same("3(x + 1)", "3*x + 3");
    same("(x + 1)(x - 1)", "x^2 - 1");
    same("2 sin(x)", "2*sin(x)");
    same("x e^x", "x*exp(x)");
}

#[test]
fn functions_and_constants() {
    same("sqrt(x)", "x^(1/2)");
    same("exp(2 ln(x))", "x^2");
    same("e^(2x)", "exp(2x)");
    same("tan(x)", "tan(x)");
    assert_eq!(parse_expr("1.5").expect("parse"), Expr::constant(3, 2));
}

#[test]
fn differential_form_is_recognised() {
    let eq = parse_equation("(2*x+y)dx + (x+2*y)dy = 0").expect("parse");
    let form = eq.form.as_ref().expect("differential form");
    same(&form.m.to_string(), "2x + y");
    same(&form.n.to_string(), "x + 2y");
    assert_eq!(eq.order(), 1);
}

#[test]
fn initial_conditions_follow_the_equation() {
    let eq = parse_equation("y'' + y = 0; y(0) = 1; y'(0) = -2").expect("parse");
    assert_eq!(eq.conditions.len(), 2);
    assert_eq!(eq.conditions[0].order, 0);
    assert_eq!(eq.conditions[1].order, 1);
    assert_eq!(eq.conditions[1].value, parse_expr("-2").expect("parse"));

    let eq = parse_equation("y' = y\ny(1) = 3").expect("parse");
    assert_eq!(eq.conditions.len(), 1);
}

#[test]
fn other_variable_names() {
    let grammar = Grammar::new("t", "u");
    let eq = grammar.equation("du/dt = t*u").expect("parse");
    assert_eq!(eq.independent, "t");
    assert_eq!(eq.dependent, "u");
    assert_eq!(eq.order(), 1);
}

#[test]
fn printing_round_trips() {
    for input in [
        "x^2 + x*y + y^2",
        "C*exp(x^2/2)",
        "2x - 1 + C*exp(-2x)",
        "x*(ln(abs(x)) + C)",
        "1/(x + 1 + C*exp(x))",
        "-x^2/3 + sin(2x)",
    ] {
        let expr = parse_expr(input).expect("parse input");
        let printed = expr.to_string();
        let reparsed = parse_expr(&printed)
            .unwrap_or_else(|err| panic!("cannot reparse {printed}: {err}"));
        assert!(
            equivalent(&expr, &reparsed).expect("canonical form"),
            "{input} printed as {printed}"
        );
    }
}

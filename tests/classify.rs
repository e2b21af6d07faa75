use odekit::{classify, detect, parse_equation, EquationClass, Shape, SolverConfig};

fn confirmed(text: &str, id: &str) -> odekit::Classification {
    let eq = parse_equation(text).expect("parse");
    let class: EquationClass = id.parse().expect("class");
    classify(&eq, class, &SolverConfig::default())
        .unwrap_or_else(|err| panic!("{text} as {id}: {err}"))
}

fn detected(text: &str) -> EquationClass {
    let eq = parse_equation(text).expect("parse");
    detect(&eq, &SolverConfig::default())
        .unwrap_or_else(|err| panic!("{text}: {err}"))
        .class
}

#[test]
fn declared_classes_are_confirmed() {
    let cases = [
        ("dy/dx = x*y", "separable"),
        ("dy/dx = (x+y)/x", "homogeneous"),
        ("(2*x+y)dx + (x+2*y)dy = 0", "exact"),
        ("dy/dx + 2*y = 4*x", "linear"),
        ("dy/dx + y = y^2*x", "bernoulli"),
        ("y*y'' + y'^2 = 0", "reducible"),
        ("y'' - 3y' + 2y = 0", "constant-coef"),
        ("y'' + y = x^2", "undetermined"),
        ("(3*x*y + y^2)dx + (x^2 + x*y)dy = 0", "integrating-factor"),
    ];
    for (text, id) in cases {
        let found = confirmed(text, id);
        assert_eq!(found.class.id(), id);
        assert!(!found.reason.is_empty(), "{text} has no reason");
    }
}

#[test]
fn one_equation_can_belong_to_several_classes() {
    confirmed("dy/dx = x*y", "separable");
    confirmed("dy/dx = x*y", "linear");
    confirmed("dy/dx = (x+y)/x", "linear");
}

#[test]
fn shapes_carry_the_method_data() {
    match confirmed("dy/dx + y = y^2*x", "bernoulli").shape {
        Shape::Bernoulli { n, .. } => assert_eq!(n, odekit::rational(2, 1)),
        other => panic!("unexpected shape {other:?}"),
    }
    match confirmed("dy/dx = x*y", "separable").shape {
        Shape::Separable { .. } => {}
        other => panic!("unexpected shape {other:?}"),
    }
}

#[test]
fn detection_order() {
    assert_eq!(detected("dy/dx = x*y"), EquationClass::Separable);
    assert_eq!(detected("dy/dx + 2*y = 4*x"), EquationClass::Linear);
    assert_eq!(detected("dy/dx + y = y^2*x"), EquationClass::Bernoulli);
    assert_eq!(detected("dy/dx = (x + y)/(x - y)"), EquationClass::Homogeneous);
    assert_eq!(detected("(2*x+y)dx + (x+2*y)dy = 0"), EquationClass::Exact);
    assert_eq!(detected("y'' + 4y = 0"), EquationClass::ConstantCoefficient);
    assert_eq!(detected("y'' + 4y = exp(x)"), EquationClass::UndeterminedCoefficients);
    assert_eq!(detected("x*y'' = y'"), EquationClass::Reducible);
}

#[test]
fn classification_is_idempotent() {
    for text in [
        "dy/dx = x*y",
        "dy/dx + y = y^2*x",
        "(2*x+y)dx + (x+2*y)dy = 0",
        "y'' + y = sin(x)",
    ] {
        let first = detected(text);
        assert_eq!(confirmed(text, first.id()).class, first);
        assert_eq!(detected(text), first);
    }
}

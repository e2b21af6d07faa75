//! Property-based checks for printing, normalisation, classification and solving.

use odekit::expr::{add, cos, exp, int, mul, neg, pow, sin, sub, Expr};
use odekit::simplify::equivalent;
use odekit::{normalize, parse_equation, parse_expr, pretty, solve, solve_auto, EquationClass};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        Just(Expr::var("x")),
        Just(Expr::var("y")),
        (-9i64..10).prop_map(int),
    ]
}

// Small trees without division, so every sample is defined everywhere
fn expr_tree() -> impl Strategy<Value = Expr> {
    leaf().prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| add(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| sub(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| mul(a, b)),
            (inner.clone(), 2i64..4).prop_map(|(a, k)| pow(a, int(k))),
            inner.clone().prop_map(neg),
            inner.clone().prop_map(sin),
            inner.clone().prop_map(cos),
            inner.prop_map(exp),
        ]
    })
}

fn nonzero() -> impl Strategy<Value = i64> {
    (-6i64..7).prop_filter("coefficient must be non-zero", |k| *k != 0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn printed_expressions_parse_back(e in expr_tree()) {
        let printed = pretty(&e);
        let reparsed = parse_expr(&printed);
        prop_assert!(reparsed.is_ok(), "{} did not parse", printed);
        prop_assert!(equivalent(&e, &reparsed.unwrap()).unwrap(), "{}", printed);
    }

    #[test]
    fn normalize_is_idempotent(e in expr_tree()) {
        let once = normalize(e);
        prop_assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn linear_solutions_check_out(a in nonzero(), b in -6i64..7) {
        let text = format!("dy/dx + {a}*y = {b}*x");
        let result = solve(&text, EquationClass::Linear).unwrap();
        prop_assert!(result.verify().unwrap(), "{}", result.solution);
        let again = solve(&text, EquationClass::Linear).unwrap();
        prop_assert_eq!(&result, &again);
    }

    #[test]
    fn separable_solutions_check_out(k in nonzero(), m in 0i64..4) {
        let text = format!("dy/dx = {k}*x^{m}*y");
        let result = solve(&text, EquationClass::Separable).unwrap();
        prop_assert!(result.verify().unwrap(), "{}", result.solution);
    }

    #[test]
    fn detected_class_is_confirmed(a in nonzero(), b in nonzero(), c in -4i64..5) {
        let text = format!("y'' + {a}*y' + {b}*y = {c}");
        let eq = parse_equation(&text).unwrap();
        let config = odekit::SolverConfig::default();
        let found = odekit::detect(&eq, &config).unwrap();
        let again = odekit::classify(&eq, found.class, &config).unwrap();
        prop_assert_eq!(found.class, again.class);
        prop_assert_eq!(found.shape, again.shape);
    }

    #[test]
    fn constant_coefficient_solutions_check_out(r1 in -3i64..4, r2 in -3i64..4) {
        // (r - r1)(r - r2)
        let text = format!("y'' - ({})*y' + ({})*y = 0", r1 + r2, r1 * r2);
        let result = solve_auto(&text).unwrap();
        prop_assert!(result.verify().unwrap(), "{}", result.solution);
    }
}

use num_traits::Zero;
use odekit::polynomial::Poly;
use odekit::{parse_expr, Rational};

fn poly(input: &str) -> Poly {
    let expr = parse_expr(input).expect("parse polynomial");
    Poly::from_expr(&expr, "x").expect("build polynomial")
}

fn ints(values: &[i64]) -> Vec<Rational> {
    values.iter().map(|&v| Rational::from_integer(v.into())).collect()
}

#[test]
fn characteristic_polynomial_from_coefficients() {
    // y'' - 3y' + 2y  =>  r^2 - 3r + 2
    let p = Poly::from_coeffs(ints(&[2, -3, 1]));
    assert_eq!(p.degree(), Some(2));
    assert_eq!(p, poly("x^2 - 3x + 2"));
    assert!(p.evaluate(&Rational::from_integer(1.into())).is_zero());
    assert!(p.evaluate(&Rational::from_integer(2.into())).is_zero());
}

#[test]
fn division_by_a_root_factor() {
    let p = poly("x^3 - 1");
    let (quotient, remainder) = p.div_rem(&poly("x - 1"));
    assert!(remainder.is_zero());
    assert_eq!(quotient, poly("x^2 + x + 1"));
    assert!(poly("x^2 + 1").div_exact(&poly("x + 1")).is_none());
}

#[test]
fn gcd_is_monic() {
    let gcd = Poly::gcd(&poly("2x^2 + 2x"), &poly("4x"));
    assert_eq!(gcd, poly("x"));
    let gcd = Poly::gcd(&poly("x^2 - 1"), &poly("x^2 - x"));
    assert_eq!(gcd, poly("x - 1"));
}

#[test]
fn content_and_primitive_part() {
    let p = poly("2/3*x^2 + 4/3*x + 2/3");
    let (content, primitive) = p.content_and_primitive_part();
    assert_eq!(content, Rational::new(2.into(), 3.into()));
    assert_eq!(primitive, poly("x^2 + 2x + 1"));
    assert_eq!(primitive.scale(&content), p);
}

#[test]
fn renders_highest_degree_first() {
    let p = Poly::from_coeffs(ints(&[4, 0, 1]));
    assert_eq!(odekit::latex(&p.to_expr("r")), "r^2 + 4");
    let p = Poly::from_coeffs(ints(&[2, -3, 1]));
    assert_eq!(odekit::latex(&p.to_expr("r")), "r^2 - 3r + 2");
}

#[test]
fn constant_subexpressions_fold_into_coefficients() {
    assert_eq!(poly("(1/2)^2*x + 3*2"), poly("x/4 + 6"));
    assert_eq!(poly("x^2/(2 + 1)"), Poly::from_coeffs(vec![
        Rational::zero(),
        Rational::zero(),
        Rational::new(1.into(), 3.into()),
    ]));
}

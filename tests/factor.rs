use odekit::factor::{roots, Root};
use odekit::polynomial::Poly;
use odekit::simplify::equivalent;
use odekit::{parse_expr, Expr, Rational};

fn char_poly(coeffs: &[i64]) -> Poly {
    Poly::from_coeffs(coeffs.iter().map(|&c| Rational::from_integer(c.into())).collect())
}

fn real_roots(found: &[Root]) -> Vec<(Expr, usize)> {
    found
        .iter()
        .filter_map(|r| match r {
            Root::Real { value, multiplicity } => Some((value.clone(), *multiplicity)),
            Root::Complex { .. } => None,
        })
        .collect()
}

fn has_real_root(found: &[Root], value: &str, multiplicity: usize) -> bool {
    let expected = parse_expr(value).expect("parse root");
    real_roots(found)
        .iter()
        .any(|(v, m)| *m == multiplicity && equivalent(v, &expected).unwrap_or(false))
}

#[test]
fn distinct_rational_roots() {
    let found = roots(&char_poly(&[2, -3, 1])).expect("roots");
    assert_eq!(found.len(), 2);
    assert!(has_real_root(&found, "1", 1));
    assert!(has_real_root(&found, "2", 1));
}

#[test]
fn repeated_root_keeps_its_multiplicity() {
    let found = roots(&char_poly(&[1, -2, 1])).expect("roots");
    assert_eq!(found.len(), 1);
    assert!(has_real_root(&found, "1", 2));
    assert_eq!(found[0].multiplicity(), 2);
}

#[test]
fn irrational_pair_uses_square_roots() {
    // r^2 - 2 = 0
    let found = roots(&char_poly(&[-2, 0, 1])).expect("roots");
    assert!(has_real_root(&found, "sqrt(2)", 1));
    assert!(has_real_root(&found, "-sqrt(2)", 1));
}

#[test]
fn complex_pair() {
    // r^2 + 2r + 5 = 0  =>  -1 ± 2i
    let found = roots(&char_poly(&[5, 2, 1])).expect("roots");
    match found.as_slice() {
        [Root::Complex { re, im, multiplicity }] => {
            assert_eq!(*re, Expr::integer(-1));
            assert_eq!(*im, Expr::integer(2));
            assert_eq!(*multiplicity, 1);
        }
        other => panic!("expected one complex pair, got {other:?}"),
    }
}

#[test]
fn higher_degree_with_rational_roots_splits() {
    // (r - 1)(r + 1)(r - 3) = r^3 - 3r^2 - r + 3
    let found = roots(&char_poly(&[3, -1, -3, 1])).expect("roots");
    assert_eq!(found.len(), 3);
    assert!(has_real_root(&found, "3", 1));
    assert!(has_real_root(&found, "-1", 1));
}

#[test]
fn irreducible_cubic_has_no_closed_form_here() {
    // r^3 - 2 has no rational root
    assert!(roots(&char_poly(&[-2, 0, 0, 1])).is_none());
}

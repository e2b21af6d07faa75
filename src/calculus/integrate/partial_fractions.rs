//! Rational functions with rational coefficients.

use num_traits::{One, Signed, Zero};

use crate::expr::{abs, add, atan, div, int, ln, mul, pow, sub, Expr, Rational};
use crate::factor::{factor_polynomial, split_square};
use crate::linear_system::solve_rational;
use crate::polynomial::Poly;
use crate::simplify::{normalize, together};

enum Piece {
    /// `A / (x - r)^j`
    Linear { root: Rational, power: usize },
    /// `(B x + C) / (x^2 + p x + q)`
    Quadratic { p: Rational, q: Rational },
}

pub(super) fn integrate_rational(expr: &Expr, var: &str) -> Option<Expr> {
    let (num, den) = together(expr).ok()?;
    let pn = Poly::from_expr(&num, var)?;
    let pd = Poly::from_expr(&den, var)?;
    if pd.degree()? == 0 {
        return None;
    }
    let (quotient, remainder) = pn.div_rem(&pd);
    let lc = pd.leading_coeff();
    let monic = pd.monic();
    let target = remainder.scale(&(Rational::one() / lc));

    let mut pieces = Vec::new();
    let mut basis = Vec::new();
    for factor in factor_polynomial(&monic) {
        match factor.poly.degree()? {
            1 => {
                let root = factor.poly.linear_root()?;
                for power in 1..=factor.multiplicity {
                    let divisor = factor.poly.pow(power);
                    basis.push(monic.div_exact(&divisor)?);
                    pieces.push(Piece::Linear {
                        root: root.clone(),
                        power,
                    });
                }
            }
            2 if factor.multiplicity == 1 => {
                let cofactor = monic.div_exact(&factor.poly)?;
                let p = factor.poly.coeff(1);
                let q = factor.poly.coeff(0);
                // two unknowns: B multiplies x * cofactor, C multiplies cofactor
                basis.push(cofactor.clone() * Poly::monomial(1, Rational::one()));
                basis.push(cofactor);
                pieces.push(Piece::Quadratic { p, q });
            }
            _ => return None,
        }
    }

    let n = basis.len();
    let matrix: Vec<Vec<Rational>> = (0..n)
        .map(|power| basis.iter().map(|b| b.coeff(power)).collect())
        .collect();
    let rhs: Vec<Rational> = (0..n).map(|power| target.coeff(power)).collect();
    let coeffs = solve_rational(matrix, rhs)?;

    let x = Expr::var(var);
    let mut total = integrate_polynomial(&quotient, var);
    let mut next = coeffs.into_iter();
    for piece in pieces {
        let term = match piece {
            Piece::Linear { root, power } => {
                let a = next.next()?;
                let shifted = sub(x.clone(), Expr::Constant(root));
                if power == 1 {
                    mul(Expr::Constant(a), ln(abs(shifted)))
                } else {
                    let k = Rational::from_integer(1.into()) - Rational::from_integer((power as i64).into());
                    div(
                        mul(Expr::Constant(a), pow(shifted, Expr::Constant(k.clone()))),
                        Expr::Constant(k),
                    )
                }
            }
            Piece::Quadratic { p, q } => {
                let b = next.next()?;
                let c = next.next()?;
                quadratic_term(&x, b, c, p, q)
            }
        };
        total = add(total, term);
    }
    Some(normalize(total))
}

fn integrate_polynomial(poly: &Poly, var: &str) -> Expr {
    poly.coeff_entries()
        .map(|(e, c)| {
            let k = Rational::from_integer(((e + 1) as i64).into());
            mul(
                Expr::Constant(c / &k),
                pow(Expr::var(var), Expr::Constant(k)),
            )
        })
        .fold(Expr::Constant(Rational::zero()), add)
}

/// `∫ (B x + C)/(x^2 + p x + q)` for an irreducible quadratic.
fn quadratic_term(x: &Expr, b: Rational, c: Rational, p: Rational, q: Rational) -> Expr {
    let two = Rational::from_integer(2.into());
    let quad = add(
        add(pow(x.clone(), int(2)), mul(Expr::Constant(p.clone()), x.clone())),
        Expr::Constant(q.clone()),
    );
    let log_part = mul(Expr::Constant(b.clone() / &two), ln(abs(quad)));
    let rest = c - b * &p / &two;
    if rest.is_zero() {
        return log_part;
    }
    // 4q - p^2 > 0 gives an arctangent, otherwise the real roots are irrational
    let disc = Rational::from_integer(4.into()) * &q - p.clone() * &p;
    let (k, n) = split_square(&disc.abs());
    let root = if n.is_one() {
        Expr::Constant(k)
    } else {
        mul(Expr::Constant(k), Expr::sqrt(Expr::integer(n)))
    };
    let linear = add(mul(Expr::Constant(two.clone()), x.clone()), Expr::Constant(p));
    let inverse = if disc.is_positive() {
        mul(div(Expr::Constant(two), root.clone()), atan(div(linear, root)))
    } else {
        mul(
            div(int(1), root.clone()),
            ln(abs(div(
                sub(linear.clone(), root.clone()),
                add(linear, root),
            ))),
        )
    };
    add(log_part, mul(Expr::Constant(rest), inverse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplify::equivalent;

    #[test]
    fn distinct_linear_factors() {
        // 1/(x^2 - 1) = 1/2 ln|x-1| - 1/2 ln|x+1|
        let x = Expr::var("x");
        let e = div(int(1), sub(pow(x.clone(), int(2)), int(1)));
        let result = integrate_rational(&e, "x").unwrap();
        let expected = sub(
            mul(Expr::constant(1, 2), ln(abs(sub(x.clone(), int(1))))),
            mul(Expr::constant(1, 2), ln(abs(add(x, int(1))))),
        );
        assert!(equivalent(&result, &expected).unwrap());
    }

    #[test]
    fn irreducible_quadratic_gives_arctangent() {
        let x = Expr::var("x");
        let e = div(int(1), add(pow(x.clone(), int(2)), int(1)));
        let result = integrate_rational(&e, "x").unwrap();
        assert!(equivalent(&result, &atan(x)).unwrap());
    }
}

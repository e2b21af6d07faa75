//! Root extraction for characteristic polynomials.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::expr::{Expr, Rational};
use crate::polynomial::Poly;

/// A root of a polynomial with rational coefficients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Root {
    /// Real root, rational or of the form `p + q sqrt(d)`.
    Real { value: Expr, multiplicity: usize },
    /// Conjugate pair `re ± im i` with `im > 0`.
    Complex {
        re: Expr,
        im: Expr,
        multiplicity: usize,
    },
}

impl Root {
    pub fn multiplicity(&self) -> usize {
        match self {
            Root::Real { multiplicity, .. } | Root::Complex { multiplicity, .. } => *multiplicity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factor {
    pub poly: Poly,
    pub multiplicity: usize,
}

/// Splits a polynomial into rational linear factors, quadratics and whatever remains.
pub fn factor_polynomial(poly: &Poly) -> Vec<Factor> {
    let mut factors: Vec<Factor> = Vec::new();
    let mut stack = vec![poly.monic()];
    while let Some(current) = stack.pop() {
        match current.degree() {
            None | Some(0) => continue,
            Some(1) | Some(2) if find_rational_root(&current).is_none() => {
                push_factor(&mut factors, current);
                continue;
            }
            _ => {}
        }
        if let Some(root) = find_rational_root(&current) {
            let divider = Poly::from_coeffs(vec![-root, Rational::one()]);
            if let Some(next) = current.div_exact(&divider) {
                push_factor(&mut factors, divider);
                stack.push(next);
                continue;
            }
        }
        if let Some((a, b)) = split_quartic(&current) {
            stack.push(a);
            stack.push(b);
            continue;
        }
        push_factor(&mut factors, current);
    }
    factors.sort_by(|a, b| {
        a.poly
            .degree()
            .cmp(&b.poly.degree())
            .then_with(|| a.poly.coeff(0).cmp(&b.poly.coeff(0)))
    });
    factors
}

fn push_factor(factors: &mut Vec<Factor>, poly: Poly) {
    match factors.iter_mut().find(|f| f.poly == poly) {
        Some(existing) => existing.multiplicity += 1,
        None => factors.push(Factor {
            poly,
            multiplicity: 1,
        }),
    }
}

/// All roots with multiplicities, or `None` when an irreducible factor of degree three or more
/// remains.
pub fn roots(poly: &Poly) -> Option<Vec<Root>> {
    let mut out = Vec::new();
    for factor in factor_polynomial(poly) {
        match factor.poly.degree()? {
            1 => out.push(Root::Real {
                value: Expr::Constant(factor.poly.linear_root()?),
                multiplicity: factor.multiplicity,
            }),
            2 => out.extend(quadratic_roots(&factor.poly, factor.multiplicity)),
            _ => return None,
        }
    }
    Some(out)
}

/// Roots of a monic irreducible quadratic `r^2 + p r + q`.
fn quadratic_roots(poly: &Poly, multiplicity: usize) -> Vec<Root> {
    let two = Rational::from_integer(BigInt::from(2));
    let p = poly.coeff(1);
    let q = poly.coeff(0);
    let half_p = -p.clone() / &two;
    let disc = p.clone() * &p - Rational::from_integer(BigInt::from(4)) * q;
    let (coeff, radicand) = split_square(&disc.abs());
    let offset = coeff / &two;
    if disc.is_negative() {
        return vec![Root::Complex {
            re: Expr::Constant(half_p),
            im: radical(offset, radicand),
            multiplicity,
        }];
    }
    let minus = radical(-offset.clone(), radicand.clone());
    let plus = radical(offset, radicand);
    vec![
        Root::Real {
            value: offset_expr(&half_p, plus),
            multiplicity,
        },
        Root::Real {
            value: offset_expr(&half_p, minus),
            multiplicity,
        },
    ]
}

fn offset_expr(base: &Rational, rad: Expr) -> Expr {
    if base.is_zero() {
        rad
    } else {
        Expr::Add(Expr::Constant(base.clone()).boxed(), rad.boxed())
    }
}

/// `k * sqrt(n)`, or the rational `k` when `n` is one.
fn radical(k: Rational, n: BigInt) -> Expr {
    if n.is_one() {
        return Expr::Constant(k);
    }
    let root = Expr::sqrt(Expr::Constant(Rational::from_integer(n)));
    if k.is_one() {
        root
    } else {
        Expr::Mul(Expr::Constant(k).boxed(), root.boxed())
    }
}

/// Writes `sqrt(r)` as `k * sqrt(n)` with `k` rational and `n` a square-free integer.
pub(crate) fn split_square(r: &Rational) -> (Rational, BigInt) {
    let m = r.numer() * r.denom();
    if m.is_zero() {
        return (Rational::zero(), BigInt::one());
    }
    let mut square = BigInt::one();
    let mut rest = m;
    let mut d = BigInt::from(2);
    let limit = BigInt::from(100_000);
    while &d * &d <= rest && d < limit {
        let dd = &d * &d;
        while (&rest % &dd).is_zero() {
            rest /= &dd;
            square *= &d;
        }
        d += 1;
    }
    (Rational::new(square, r.denom().clone()), rest)
}

pub(crate) fn find_rational_root(poly: &Poly) -> Option<Rational> {
    let degree = poly.degree()?;
    if degree == 0 {
        return None;
    }
    if degree == 1 {
        return poly.linear_root();
    }
    if poly.coeff(0).is_zero() {
        return Some(Rational::zero());
    }
    let coeffs = integer_coeffs(poly);
    let leading = coeffs.last()?;
    let constant = coeffs.first()?;
    let mut candidates = Vec::new();
    for p in divisors(constant) {
        for q in divisors(leading) {
            let candidate = Rational::new(p.clone(), q);
            candidates.push(-candidate.clone());
            candidates.push(candidate);
        }
    }
    candidates.sort_by(|a, b| a.abs().cmp(&b.abs()).then_with(|| b.cmp(a)));
    candidates.dedup();
    candidates
        .into_iter()
        .find(|candidate| poly.evaluate(candidate).is_zero())
}

fn integer_coeffs(poly: &Poly) -> Vec<BigInt> {
    let (_, primitive) = poly.content_and_primitive_part();
    let degree = primitive.degree().unwrap_or(0);
    (0..=degree).map(|e| primitive.coeff(e).to_integer()).collect()
}

fn divisors(n: &BigInt) -> Vec<BigInt> {
    let abs_n = n.abs();
    if abs_n.is_zero() || abs_n > BigInt::from(1_000_000_000_000u64) {
        return vec![BigInt::one()];
    }
    let mut result = Vec::new();
    let mut d = BigInt::one();
    while &d * &d <= abs_n {
        if (&abs_n % &d).is_zero() {
            let other = &abs_n / &d;
            if other != d {
                result.push(other);
            }
            result.push(d.clone());
        }
        d += 1;
    }
    result.sort();
    result
}

fn rational_divisors(r: &Rational) -> Vec<Rational> {
    let mut result = Vec::new();
    for p in divisors(r.numer()) {
        for q in divisors(r.denom()) {
            let frac = Rational::new(p.clone(), q);
            result.push(-frac.clone());
            result.push(frac);
        }
    }
    result.sort();
    result.dedup();
    result
}

fn perfect_square(r: &Rational) -> Option<Rational> {
    if r.is_negative() {
        return None;
    }
    let (k, n) = split_square(r);
    n.is_one().then_some(k)
}

/// Factors a monic quartic as a product of two rational quadratics `(r^2 + a r + b)(r^2 + c r + d)`.
fn split_quartic(poly: &Poly) -> Option<(Poly, Poly)> {
    if poly.degree()? != 4 || !poly.leading_coeff().is_one() {
        return None;
    }
    let p3 = poly.coeff(3);
    let p2 = poly.coeff(2);
    let p1 = poly.coeff(1);
    let p0 = poly.coeff(0);
    let two = Rational::from_integer(BigInt::from(2));
    let four = Rational::from_integer(BigInt::from(4));
    let quadratic = |lin: &Rational, c: &Rational| {
        Poly::from_coeffs(vec![c.clone(), lin.clone(), Rational::one()])
    };

    let candidates = rational_divisors(&p0);
    for b in &candidates {
        for d in &candidates {
            if b * d != p0 {
                continue;
            }
            // a + c = p3, ac = p2 - b - d
            let ac = p2.clone() - b - d;
            let disc = p3.clone() * &p3 - four.clone() * ac;
            let Some(root) = perfect_square(&disc) else {
                continue;
            };
            for sign in [Rational::one(), -Rational::one()] {
                let a = (p3.clone() + sign * &root) / &two;
                let c = p3.clone() - &a;
                if a.clone() * d + b * &c == p1 {
                    return Some((quadratic(&a, b), quadratic(&c, d)));
                }
            }
        }
    }
    None
}

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::expr::{Expr, Rational};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Dense-by-exponent univariate polynomial with rational coefficients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly {
    pub(crate) coeffs: BTreeMap<usize, Rational>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly {
            coeffs: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        Poly::from_constant(Rational::one())
    }

    pub fn from_constant(c: Rational) -> Self {
        Poly::monomial(0, c)
    }

    pub fn monomial(power: usize, c: Rational) -> Self {
        let mut coeffs = BTreeMap::new();
        if !c.is_zero() {
            coeffs.insert(power, c);
        }
        Poly { coeffs }
    }

    /// Builds a polynomial from coefficients listed from the constant term upwards.
    pub fn from_coeffs(coeffs: Vec<Rational>) -> Self {
        Poly {
            coeffs: coeffs
                .into_iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .collect(),
        }
    }

    pub fn degree(&self) -> Option<usize> {
        self.coeffs.keys().next_back().copied()
    }

    pub fn leading_coeff(&self) -> Rational {
        self.coeffs
            .values()
            .next_back()
            .cloned()
            .unwrap_or_else(Rational::zero)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs.get(&0).is_some_and(One::is_one)
    }

    pub fn coeff(&self, power: usize) -> Rational {
        self.coeffs
            .get(&power)
            .cloned()
            .unwrap_or_else(Rational::zero)
    }

    pub fn coeff_entries(&self) -> impl Iterator<Item = (usize, &Rational)> + '_ {
        self.coeffs.iter().map(|(e, c)| (*e, c))
    }

    pub fn pow(&self, exp: usize) -> Self {
        let mut result = Poly::one();
        let mut base = self.clone();
        let mut n = exp;
        while n > 0 {
            if n % 2 == 1 {
                result = result * &base;
            }
            base = base.clone() * &base;
            n /= 2;
        }
        result
    }

    pub fn scale(&self, k: &Rational) -> Self {
        if k.is_zero() {
            return Poly::zero();
        }
        Poly {
            coeffs: self
                .coeffs
                .iter()
                .map(|(e, c)| (*e, c * k))
                .collect(),
        }
    }

    pub fn from_expr(expr: &Expr, var: &str) -> Option<Self> {
        if !expr.contains_var(var) {
            return extract_rational(expr).map(Poly::from_constant);
        }
        match expr {
            Expr::Variable(v) if v == var => Some(Poly::monomial(1, Rational::one())),
            Expr::Add(a, b) => Some(Self::from_expr(a, var)? + Self::from_expr(b, var)?),
            Expr::Sub(a, b) => Some(Self::from_expr(a, var)? - Self::from_expr(b, var)?),
            Expr::Mul(a, b) => Some(Self::from_expr(a, var)? * Self::from_expr(b, var)?),
            Expr::Div(a, b) => {
                let denom = extract_rational(b).filter(|d| !d.is_zero())?;
                Some(Self::from_expr(a, var)?.scale(&(Rational::one() / denom)))
            }
            Expr::Neg(inner) => Some(-Self::from_expr(inner, var)?),
            Expr::Pow(base, exp) => {
                let power = extract_rational(exp)
                    .filter(|k| k.is_integer() && !k.is_negative())?
                    .to_integer()
                    .to_usize()?;
                Some(Self::from_expr(base, var)?.pow(power))
            }
            _ => None,
        }
    }

    pub fn derivative(&self) -> Self {
        Poly {
            coeffs: self
                .coeffs
                .iter()
                .filter(|(e, _)| **e > 0)
                .map(|(e, c)| (e - 1, c * Rational::from_integer(BigInt::from(*e))))
                .collect(),
        }
    }

    pub fn monic(&self) -> Self {
        let lc = self.leading_coeff();
        if lc.is_zero() {
            return self.clone();
        }
        self.scale(&(Rational::one() / lc))
    }

    pub fn evaluate(&self, x: &Rational) -> Rational {
        // Horner over the dense coefficient range.
        let Some(degree) = self.degree() else {
            return Rational::zero();
        };
        let mut acc = Rational::zero();
        for exp in (0..=degree).rev() {
            acc = acc * x + self.coeff(exp);
        }
        acc
    }

    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        let Some(divisor_degree) = divisor.degree() else {
            return (Poly::zero(), self.clone());
        };
        let divisor_lc = divisor.leading_coeff();
        let mut remainder = self.clone();
        let mut quotient = Poly::zero();
        while let Some(r_deg) = remainder.degree() {
            if r_deg < divisor_degree {
                break;
            }
            let term = Poly::monomial(
                r_deg - divisor_degree,
                remainder.leading_coeff() / &divisor_lc,
            );
            quotient = quotient + &term;
            remainder = remainder - &(term * divisor);
        }
        (quotient, remainder)
    }

    pub fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let (q, r) = self.div_rem(divisor);
        r.is_zero().then_some(q)
    }

    pub fn linear_root(&self) -> Option<Rational> {
        if self.degree()? != 1 {
            return None;
        }
        Some(-self.coeff(0) / self.coeff(1))
    }

    /// Highest-degree terms first, matching how characteristic equations are written.
    pub fn to_expr(&self, var: &str) -> Expr {
        let mut terms = self.coeffs.iter().rev().map(|(exp, coeff)| {
            let power = match exp {
                0 => None,
                1 => Some(Expr::var(var)),
                _ => Some(Expr::Pow(
                    Expr::var(var).boxed(),
                    Expr::integer(*exp as u64).boxed(),
                )),
            };
            match power {
                None => Expr::Constant(coeff.clone()),
                Some(p) if coeff.is_one() => p,
                Some(p) if (-coeff).is_one() => Expr::Neg(p.boxed()),
                Some(p) => Expr::Mul(Expr::Constant(coeff.clone()).boxed(), p.boxed()),
            }
        });
        let Some(first) = terms.next() else {
            return Expr::Constant(Rational::zero());
        };
        terms.fold(first, |acc, term| match term {
            Expr::Neg(inner) => Expr::Sub(acc.boxed(), inner),
            Expr::Constant(c) if c.is_negative() => {
                Expr::Sub(acc.boxed(), Expr::Constant(-c).boxed())
            }
            Expr::Mul(c, rest) if matches!(&*c, Expr::Constant(k) if k.is_negative()) => {
                let magnitude = match *c {
                    Expr::Constant(k) => -k,
                    other => return Expr::Add(acc.boxed(), Expr::Mul(other.boxed(), rest).boxed()),
                };
                Expr::Sub(
                    acc.boxed(),
                    Expr::Mul(Expr::Constant(magnitude).boxed(), rest).boxed(),
                )
            }
            other => Expr::Add(acc.boxed(), other.boxed()),
        })
    }

    /// Integer content and primitive part; the primitive part has a positive leading coefficient.
    pub fn content_and_primitive_part(&self) -> (Rational, Self) {
        if self.is_zero() {
            return (Rational::zero(), Poly::zero());
        }
        let lcm = self
            .coeffs
            .values()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let nums: BTreeMap<usize, BigInt> = self
            .coeffs
            .iter()
            .map(|(e, c)| (*e, (c * Rational::from_integer(lcm.clone())).to_integer()))
            .collect();
        let gcd = nums
            .values()
            .fold(BigInt::zero(), |acc, n| acc.gcd(n));
        let mut primitive = Poly {
            coeffs: nums
                .into_iter()
                .map(|(e, n)| (e, Rational::from_integer(n / &gcd)))
                .collect(),
        };
        let mut content = Rational::new(gcd, lcm);
        if primitive.leading_coeff().is_negative() {
            primitive = -primitive;
            content = -content;
        }
        (content, primitive)
    }

    pub fn gcd(a: &Poly, b: &Poly) -> Poly {
        let mut r0 = a.clone();
        let mut r1 = b.clone();
        while !r1.is_zero() {
            let (_, r) = r0.div_rem(&r1);
            r0 = r1;
            r1 = r;
        }
        r0.monic()
    }
}

impl std::ops::Add for Poly {
    type Output = Poly;
    fn add(self, rhs: Poly) -> Poly {
        self + &rhs
    }
}

impl std::ops::Add<&Poly> for Poly {
    type Output = Poly;
    fn add(self, rhs: &Poly) -> Poly {
        let mut coeffs = self.coeffs;
        for (exp, coeff) in &rhs.coeffs {
            match coeffs.entry(*exp) {
                Entry::Vacant(entry) => {
                    entry.insert(coeff.clone());
                }
                Entry::Occupied(mut entry) => {
                    *entry.get_mut() += coeff;
                    if entry.get().is_zero() {
                        entry.remove();
                    }
                }
            }
        }
        Poly { coeffs }
    }
}

impl std::ops::Sub for Poly {
    type Output = Poly;
    fn sub(self, rhs: Poly) -> Poly {
        self + &(-rhs)
    }
}

impl std::ops::Sub<&Poly> for Poly {
    type Output = Poly;
    fn sub(self, rhs: &Poly) -> Poly {
        self + &(-rhs.clone())
    }
}

impl std::ops::Mul for Poly {
    type Output = Poly;
    fn mul(self, rhs: Poly) -> Poly {
        self * &rhs
    }
}

impl std::ops::Mul<&Poly> for Poly {
    type Output = Poly;
    fn mul(self, rhs: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (exp_a, coeff_a) in &self.coeffs {
            for (exp_b, coeff_b) in &rhs.coeffs {
                out = out + Poly::monomial(exp_a + exp_b, coeff_a * coeff_b);
            }
        }
        out
    }
}

impl std::ops::Neg for Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        Poly {
            coeffs: self.coeffs.into_iter().map(|(e, c)| (e, -c)).collect(),
        }
    }
}

/// Folds a constant subtree such as `2/3` or `(1 + 1/2)^2` to a rational.
fn extract_rational(expr: &Expr) -> Option<Rational> {
    match expr {
        Expr::Constant(n) => Some(n.clone()),
        Expr::Neg(inner) => extract_rational(inner).map(|n| -n),
        Expr::Add(a, b) => Some(extract_rational(a)? + extract_rational(b)?),
        Expr::Sub(a, b) => Some(extract_rational(a)? - extract_rational(b)?),
        Expr::Mul(a, b) => Some(extract_rational(a)? * extract_rational(b)?),
        Expr::Div(a, b) => {
            let den = extract_rational(b).filter(|d| !d.is_zero())?;
            Some(extract_rational(a)? / den)
        }
        Expr::Pow(base, exp) => {
            let base = extract_rational(base)?;
            let k = extract_rational(exp).filter(Rational::is_integer)?;
            let k = i32::try_from(k.to_integer()).ok()?;
            if base.is_zero() && k < 0 {
                return None;
            }
            Some(base.pow(k))
        }
        _ => None,
    }
}

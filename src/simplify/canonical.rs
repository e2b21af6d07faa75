//! Canonical sum-of-monomials form.
//!
//! A [`Sum`] maps monomials to rational coefficients. A [`Monomial`] is a product of atoms
//! (variables, derivative markers, function applications, irreducible constants and
//! non-monomial sums) raised to rational powers, times at most one exponential factor whose
//! argument is itself a `Sum`. Positive integer powers of sums are expanded; negative and
//! fractional powers keep the sum as an atom after pulling out its content, so equal
//! denominators line up.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{Result, SolveError};
use crate::expr::{is_arbitrary_constant, Expr, Rational};
use crate::polynomial::Poly;

const MAX_TERMS: usize = 512;
const MAX_EXPAND_POWER: u32 = 12;
const MAX_DIVISION_STEPS: usize = 256;

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Monomial {
    powers: BTreeMap<Expr, Rational>,
    exp: Option<Sum>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Sum {
    terms: BTreeMap<Monomial, Rational>,
}

impl Monomial {
    pub(crate) fn one() -> Self {
        Monomial::default()
    }

    pub(crate) fn atom(atom: Expr) -> Self {
        let mut powers = BTreeMap::new();
        powers.insert(atom, Rational::one());
        Monomial { powers, exp: None }
    }

    pub(crate) fn is_one(&self) -> bool {
        self.powers.is_empty() && self.exp.is_none()
    }

    pub(crate) fn powers(&self) -> &BTreeMap<Expr, Rational> {
        &self.powers
    }

    pub(crate) fn exp_arg(&self) -> Option<&Sum> {
        self.exp.as_ref()
    }

    pub(crate) fn from_parts(powers: BTreeMap<Expr, Rational>, exp: Option<Sum>) -> Self {
        let powers = powers.into_iter().filter(|(_, k)| !k.is_zero()).collect();
        let exp = exp.filter(|s| !s.is_zero());
        Monomial { powers, exp }
    }

    /// Product without expansion or constant folding.
    fn mul_raw(&self, other: &Monomial) -> Monomial {
        let mut powers = self.powers.clone();
        for (atom, k) in &other.powers {
            let entry = powers.entry(atom.clone()).or_insert_with(Rational::zero);
            *entry += k;
            if entry.is_zero() {
                powers.remove(atom);
            }
        }
        let exp = match (&self.exp, &other.exp) {
            (Some(a), Some(b)) => Some(a.add(b)).filter(|s| !s.is_zero()),
            (Some(a), None) | (None, Some(a)) => Some(a.clone()),
            (None, None) => None,
        };
        Monomial { powers, exp }
    }

    fn pow(&self, k: &Rational) -> Monomial {
        let powers = self
            .powers
            .iter()
            .map(|(atom, e)| (atom.clone(), e * k))
            .filter(|(_, e)| !e.is_zero())
            .collect();
        let exp = self.exp.as_ref().map(|s| s.scale(k)).filter(|s| !s.is_zero());
        Monomial { powers, exp }
    }

    pub(crate) fn contains_var(&self, var: &str) -> bool {
        self.powers.keys().any(|a| a.contains_var(var))
            || self.exp.as_ref().is_some_and(|s| s.contains_var(var))
    }

    fn total_degree(&self) -> Rational {
        self.powers
            .iter()
            .filter(|(a, _)| !matches!(a, Expr::Constant(_)))
            .fold(Rational::zero(), |acc, (_, k)| acc + k)
    }

    fn has_arbitrary_constant(&self) -> bool {
        self.powers
            .keys()
            .any(|a| matches!(a, Expr::Variable(v) if is_arbitrary_constant(v)))
    }

    fn is_polynomial_like(&self) -> bool {
        self.exp.is_none()
            && self
                .powers
                .iter()
                .all(|(a, k)| k.is_integer() && k.is_positive() && !is_sum_atom(a))
    }

    fn divide_if_divisible(&self, divisor: &Monomial) -> Option<Monomial> {
        let mut powers = self.powers.clone();
        for (atom, k) in &divisor.powers {
            let have = powers.get(atom).cloned().unwrap_or_else(Rational::zero);
            if have < *k {
                return None;
            }
            let left = have - k;
            if left.is_zero() {
                powers.remove(atom);
            } else {
                powers.insert(atom.clone(), left);
            }
        }
        Some(Monomial { powers, exp: None })
    }

    /// Splits off atoms that are sums with negative exponents, returned with positive magnitudes.
    fn split_sum_denominator(&self) -> (Monomial, BTreeMap<Expr, Rational>) {
        let mut rest = self.clone();
        let mut den = BTreeMap::new();
        for (atom, k) in &self.powers {
            if is_sum_atom(atom) && k.is_negative() {
                den.insert(atom.clone(), -k.clone());
                rest.powers.remove(atom);
            }
        }
        (rest, den)
    }
}

impl Sum {
    pub(crate) fn zero() -> Self {
        Sum::default()
    }

    pub(crate) fn one() -> Self {
        Sum::constant(Rational::one())
    }

    pub(crate) fn constant(c: Rational) -> Self {
        Sum::single(c, Monomial::one())
    }

    pub(crate) fn atom(atom: Expr) -> Self {
        Sum::single(Rational::one(), Monomial::atom(atom))
    }

    pub(crate) fn single(c: Rational, m: Monomial) -> Self {
        let mut terms = BTreeMap::new();
        if !c.is_zero() {
            terms.insert(m, c);
        }
        Sum { terms }
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.terms.len()
    }

    pub(crate) fn terms(&self) -> impl Iterator<Item = (&Monomial, &Rational)> {
        self.terms.iter()
    }

    pub(crate) fn as_constant(&self) -> Option<Rational> {
        match self.terms.len() {
            0 => Some(Rational::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(m, _)| m.is_one())
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    pub(crate) fn single_term(&self) -> Option<(&Monomial, &Rational)> {
        if self.terms.len() == 1 {
            self.terms.iter().next()
        } else {
            None
        }
    }

    pub(crate) fn contains_var(&self, var: &str) -> bool {
        self.terms.keys().any(|m| m.contains_var(var))
    }

    fn leading_coeff(&self) -> Option<&Rational> {
        self.terms.values().next_back()
    }

    fn add_term(&mut self, m: Monomial, c: Rational) {
        if c.is_zero() {
            return;
        }
        let entry = self.terms.entry(m.clone()).or_insert_with(Rational::zero);
        *entry += c;
        if entry.is_zero() {
            self.terms.remove(&m);
        }
    }

    pub(crate) fn add(&self, other: &Sum) -> Sum {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.add_term(m.clone(), c.clone());
        }
        out
    }

    pub(crate) fn neg(&self) -> Sum {
        self.scale(&-Rational::one())
    }

    pub(crate) fn sub(&self, other: &Sum) -> Sum {
        self.add(&other.neg())
    }

    pub(crate) fn scale(&self, k: &Rational) -> Sum {
        if k.is_zero() {
            return Sum::zero();
        }
        Sum {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * k))
                .collect(),
        }
    }

    pub(crate) fn mul(&self, other: &Sum) -> Result<Sum> {
        if self.terms.len() * other.terms.len() > MAX_TERMS {
            return Err(SolveError::unsolvable(
                "expression grew beyond the expansion limit",
            ));
        }
        let mut out = Sum::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                let piece = settle(c1 * c2, m1.mul_raw(m2))?;
                for (m, c) in piece.terms {
                    out.add_term(m, c);
                }
            }
        }
        Ok(out)
    }

    fn mul_plain(&self, other: &Sum) -> Sum {
        let mut out = Sum::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                out.add_term(m1.mul_raw(m2), c1 * c2);
            }
        }
        out
    }

    pub(crate) fn pow(&self, k: &Rational) -> Result<Sum> {
        if k.is_zero() {
            return Ok(Sum::one());
        }
        if self.is_zero() {
            return if k.is_positive() {
                Ok(Sum::zero())
            } else {
                Err(SolveError::unsolvable("division by zero"))
            };
        }
        if let Some((m, c)) = self.single_term() {
            let mut mono = m.pow(k);
            let coeff = match rational_power(c, k) {
                Some(r) => r,
                None => {
                    let entry = mono
                        .powers
                        .entry(Expr::Constant(c.clone()))
                        .or_insert_with(Rational::zero);
                    *entry += k;
                    Rational::one()
                }
            };
            return settle(coeff, mono);
        }
        if let Some(n) = small_positive_integer(k) {
            let mut acc = Sum::one();
            for _ in 0..n {
                acc = acc.mul(self)?;
            }
            return Ok(acc);
        }
        let (c, g, prim) = self.split_content();
        let (c, prim) = if !k.is_integer() && c.is_negative() {
            (-c, prim.neg())
        } else {
            (c, prim)
        };
        let mut mono = g.pow(k);
        let entry = mono
            .powers
            .entry(prim.to_expr())
            .or_insert_with(Rational::zero);
        *entry += k;
        let scalar = Sum::constant(c).pow(k)?;
        scalar.mul(&settle(Rational::one(), mono)?)
    }

    /// Writes a sum with several terms as `c * g * p` where `g` is the common monomial factor
    /// and `p` has leading coefficient one.
    pub(crate) fn split_content(&self) -> (Rational, Monomial, Sum) {
        let mut keys = self.terms.keys();
        let Some(first) = keys.next() else {
            return (Rational::zero(), Monomial::one(), Sum::zero());
        };
        let mut common = first.powers.clone();
        let mut all_exp = first.exp.is_some();
        for m in keys {
            common = common
                .into_iter()
                .filter_map(|(a, k)| {
                    m.powers
                        .get(&a)
                        .map(|k2| if *k2 < k { (a, k2.clone()) } else { (a, k) })
                })
                .collect();
            all_exp &= m.exp.is_some();
        }
        let g = Monomial::from_parts(common, if all_exp { first.exp.clone() } else { None });
        let inverse = g.pow(&-Rational::one());
        let mut divided = Sum::zero();
        for (m, c) in &self.terms {
            divided.add_term(m.mul_raw(&inverse), c.clone());
        }
        let lead = divided.leading_coeff().cloned().unwrap_or_else(Rational::one);
        let prim = divided.scale(&(Rational::one() / lead.clone()));
        (lead, g, prim)
    }

    /// Numerator and denominator over the least common denominator of the negative powers.
    pub(crate) fn together(&self) -> Result<(Sum, Sum)> {
        let mut lcd: BTreeMap<Expr, Rational> = BTreeMap::new();
        for m in self.terms.keys() {
            for (atom, k) in &m.powers {
                if k.is_negative() {
                    let need = -k.clone();
                    let entry = lcd.entry(atom.clone()).or_insert_with(Rational::zero);
                    if need > *entry {
                        *entry = need;
                    }
                }
            }
        }
        if lcd.is_empty() {
            return Ok((self.clone(), Sum::one()));
        }
        let den_mono = Monomial {
            powers: lcd,
            exp: None,
        };
        let mut num = Sum::zero();
        for (m, c) in &self.terms {
            let piece = settle(c.clone(), m.mul_raw(&den_mono))?;
            num = num.add(&piece);
        }
        Ok((num, settle(Rational::one(), den_mono)?))
    }

    /// Cancels common factors between numerator and denominator when this can be done exactly.
    pub(crate) fn cancel(&self) -> Result<Sum> {
        let has_sum_denominator = self
            .terms
            .keys()
            .any(|m| m.powers.iter().any(|(a, k)| is_sum_atom(a) && k.is_negative()));
        if !has_sum_denominator {
            return Ok(self.clone());
        }
        let (num, den) = self.together()?;
        if num.is_zero() {
            return Ok(Sum::zero());
        }
        if let Some(q) = num.div_exact(&den) {
            return Ok(q);
        }
        if let Some(var) = single_variable(&num, &den) {
            if let (Some(pn), Some(pd)) = (num.to_poly(&var), den.to_poly(&var)) {
                let g = Poly::gcd(&pn, &pd);
                if g.degree().unwrap_or(0) > 0 {
                    let (qn, _) = pn.div_rem(&g);
                    let (qd, _) = pd.div_rem(&g);
                    let n = Sum::from_expr(&qn.to_expr(&var))?;
                    let d = Sum::from_expr(&qd.to_expr(&var))?;
                    return n.mul(&d.pow(&-Rational::one())?);
                }
            }
        }
        Ok(self.clone())
    }

    fn leading_grlex(&self) -> Option<(&Monomial, &Rational)> {
        self.terms.iter().max_by(|a, b| grlex(a.0, b.0))
    }

    /// Exact multivariate division; `None` when the divisor does not divide evenly.
    pub(crate) fn div_exact(&self, divisor: &Sum) -> Option<Sum> {
        let polynomial = |s: &Sum| s.terms.keys().all(|m| m.is_polynomial_like() || m.is_one());
        if !polynomial(self) || !polynomial(divisor) {
            return None;
        }
        let (lead_m, lead_c) = divisor.leading_grlex()?;
        let (lead_m, lead_c) = (lead_m.clone(), lead_c.clone());
        let mut rem = self.clone();
        let mut quotient = Sum::zero();
        for _ in 0..MAX_DIVISION_STEPS {
            let Some((m, c)) = rem.leading_grlex() else {
                return Some(quotient);
            };
            let factor = m.divide_if_divisible(&lead_m)?;
            let step = Sum::single(c / &lead_c, factor);
            quotient = quotient.add(&step);
            rem = rem.sub(&step.mul_plain(divisor));
        }
        None
    }

    pub(crate) fn to_poly(&self, var: &str) -> Option<Poly> {
        let mut poly = Poly::zero();
        for (m, c) in &self.terms {
            if m.exp.is_some() {
                return None;
            }
            let power = match m.powers.len() {
                0 => 0,
                1 => {
                    let (atom, k) = m.powers.iter().next()?;
                    if atom.as_variable() != Some(var) || !k.is_integer() || k.is_negative() {
                        return None;
                    }
                    k.to_integer().to_usize()?
                }
                _ => return None,
            };
            poly = poly + Poly::monomial(power, c.clone());
        }
        Some(poly)
    }

    /// Coefficients of each power of `var`, or `None` when `var` also appears inside another atom.
    pub(crate) fn collect_powers(&self, var: &str) -> Option<BTreeMap<Rational, Sum>> {
        let key = Expr::Variable(var.to_string());
        let mut out: BTreeMap<Rational, Sum> = BTreeMap::new();
        for (m, c) in &self.terms {
            let mut rest = m.clone();
            let power = rest.powers.remove(&key).unwrap_or_else(Rational::zero);
            if rest.contains_var(var) {
                return None;
            }
            out.entry(power).or_default().add_term(rest, c.clone());
        }
        out.retain(|_, s| !s.is_zero());
        Some(out)
    }

    pub(crate) fn to_expr(&self) -> Expr {
        let mut entries: Vec<(&Monomial, &Rational)> = self.terms.iter().collect();
        entries.sort_by(|a, b| display_order(a.0, b.0));

        let mut groups: Vec<(BTreeMap<Expr, Rational>, Vec<(Monomial, Rational)>)> = Vec::new();
        for (m, c) in entries {
            let (rest, den) = m.split_sum_denominator();
            match groups.iter_mut().find(|(d, _)| *d == den) {
                Some((_, items)) => items.push((rest, c.clone())),
                None => groups.push((den, vec![(rest, c.clone())])),
            }
        }

        let mut pieces = Vec::new();
        for (den, items) in groups {
            if den.is_empty() || items.len() == 1 {
                let den_mono = Monomial {
                    powers: den.iter().map(|(a, k)| (a.clone(), -k.clone())).collect(),
                    exp: None,
                };
                for (rest, c) in items {
                    pieces.push(term_expr(&c, &rest.mul_raw(&den_mono)));
                }
            } else {
                let mut numerator = Sum::zero();
                for (rest, c) in items {
                    numerator.add_term(rest, c);
                }
                let den_expr = product(
                    den.iter()
                        .map(|(a, k)| power_expr(a, k))
                        .collect(),
                );
                pieces.push(Expr::Div(numerator.to_expr().boxed(), den_expr.boxed()));
            }
        }

        let mut iter = pieces.into_iter();
        let Some(first) = iter.next() else {
            return Expr::Constant(Rational::zero());
        };
        iter.fold(first, |acc, piece| match piece {
            Expr::Neg(inner) => Expr::Sub(acc.boxed(), inner),
            Expr::Constant(c) if c.is_negative() => Expr::Sub(acc.boxed(), Expr::Constant(-c).boxed()),
            other => Expr::Add(acc.boxed(), other.boxed()),
        })
    }

    pub(crate) fn from_expr(expr: &Expr) -> Result<Sum> {
        match expr {
            Expr::Constant(c) => Ok(Sum::constant(c.clone())),
            Expr::Variable(_) | Expr::Derivative { .. } => Ok(Sum::atom(expr.clone())),
            Expr::Add(a, b) => Ok(Sum::from_expr(a)?.add(&Sum::from_expr(b)?)),
            Expr::Sub(a, b) => Ok(Sum::from_expr(a)?.sub(&Sum::from_expr(b)?)),
            Expr::Neg(a) => Ok(Sum::from_expr(a)?.neg()),
            Expr::Mul(a, b) => Sum::from_expr(a)?.mul(&Sum::from_expr(b)?),
            Expr::Div(a, b) => Sum::from_expr(a)?.mul(&power_of(b, &-Rational::one())?),
            Expr::Pow(base, e) => {
                let exponent = Sum::from_expr(e)?;
                match exponent.as_constant() {
                    Some(k) => power_of(base, &k),
                    None => general_power(base, exponent),
                }
            }
            Expr::Exp(a) => exp_of(Sum::from_expr(a)?),
            Expr::Log(a) => log_of(a),
            Expr::Abs(a) => abs_of(Sum::from_expr(a)?),
            Expr::Sin(a) | Expr::Tan(a) | Expr::Asin(a) | Expr::Atan(a) => {
                let arg = Sum::from_expr(a)?;
                if arg.is_zero() {
                    return Ok(Sum::zero());
                }
                if arg.leading_coeff().is_some_and(Signed::is_negative) {
                    return Ok(Sum::atom(expr.with_unary_arg(arg.neg().to_expr())).neg());
                }
                Ok(Sum::atom(expr.with_unary_arg(arg.to_expr())))
            }
            Expr::Cos(a) => {
                let arg = Sum::from_expr(a)?;
                if arg.is_zero() {
                    return Ok(Sum::one());
                }
                let arg = if arg.leading_coeff().is_some_and(Signed::is_negative) {
                    arg.neg()
                } else {
                    arg
                };
                Ok(Sum::atom(Expr::Cos(arg.to_expr().boxed())))
            }
            Expr::Acos(a) => Ok(Sum::atom(Expr::Acos(Sum::from_expr(a)?.to_expr().boxed()))),
        }
    }
}

/// Products of atoms may need constant folding or expansion of sums raised to integer powers.
fn settle(coeff: Rational, mono: Monomial) -> Result<Sum> {
    if coeff.is_zero() {
        return Ok(Sum::zero());
    }
    let mut coeff = coeff;
    let mut powers = BTreeMap::new();
    let mut expand = Vec::new();
    for (atom, k) in mono.powers {
        if k.is_zero() {
            continue;
        }
        if let Expr::Constant(c) = &atom {
            if let Some(r) = rational_power(c, &k) {
                coeff *= r;
                continue;
            }
        }
        if is_sum_atom(&atom) && small_positive_integer(&k).is_some() {
            expand.push((atom, k));
            continue;
        }
        powers.insert(atom, k);
    }
    let mut out = Sum::single(
        coeff,
        Monomial {
            powers,
            exp: mono.exp.filter(|s| !s.is_zero()),
        },
    );
    for (atom, k) in expand {
        out = out.mul(&Sum::from_expr(&atom)?.pow(&k)?)?;
    }
    Ok(out)
}

fn power_of(base: &Expr, k: &Rational) -> Result<Sum> {
    if k.is_integer() {
        match base {
            Expr::Mul(a, b) => return power_of(a, k)?.mul(&power_of(b, k)?),
            Expr::Div(a, b) => return power_of(a, k)?.mul(&power_of(b, &-k.clone())?),
            Expr::Pow(inner, e) => {
                if let Expr::Constant(e) = &**e {
                    return power_of(inner, &(e * k));
                }
            }
            _ => {}
        }
    }
    Sum::from_expr(base)?.pow(k)
}

fn general_power(base: &Expr, exponent: Sum) -> Result<Sum> {
    let b = Sum::from_expr(base)?;
    if let Some((m, c)) = b.single_term() {
        if c.is_one() && m.powers.is_empty() {
            if let Some(arg) = &m.exp {
                return exp_of(arg.mul(&exponent)?);
            }
        }
    }
    if let Some(c) = b.as_constant() {
        if c.is_positive() {
            let log_c = Sum::atom(Expr::Log(Expr::Constant(c).boxed()));
            return exp_of(log_c.mul(&exponent)?);
        }
    }
    Ok(Sum::atom(Expr::Pow(
        b.to_expr().boxed(),
        exponent.to_expr().boxed(),
    )))
}

fn exp_of(arg: Sum) -> Result<Sum> {
    let mut rest = Sum::zero();
    let mut logs = Vec::new();
    for (m, c) in &arg.terms {
        if m.exp.is_none() && m.powers.len() == 1 {
            if let Some((Expr::Log(inner), k)) = m.powers.iter().next() {
                if k.is_one() {
                    logs.push(((**inner).clone(), c.clone()));
                    continue;
                }
            }
        }
        rest.add_term(m.clone(), c.clone());
    }
    let mut out = Sum::single(
        Rational::one(),
        Monomial {
            powers: BTreeMap::new(),
            exp: (!rest.is_zero()).then_some(rest),
        },
    );
    for (inner, k) in logs {
        out = out.mul(&power_of(&inner, &k)?)?;
    }
    Ok(out)
}

fn log_of(arg: &Expr) -> Result<Sum> {
    if let Expr::Abs(inner) = arg {
        return log_abs(&Sum::from_expr(inner)?);
    }
    let s = Sum::from_expr(arg)?;
    if let Some(c) = s.as_constant() {
        if c.is_zero() {
            return Err(SolveError::unsolvable("logarithm of zero"));
        }
        if c.is_one() {
            return Ok(Sum::zero());
        }
        return Ok(Sum::atom(Expr::Log(Expr::Constant(c).boxed())));
    }
    if let Some((m, c)) = s.single_term() {
        if c.is_one() && m.powers.is_empty() {
            if let Some(w) = &m.exp {
                return Ok(w.clone());
            }
        }
    }
    Ok(Sum::atom(Expr::Log(s.to_expr().boxed())))
}

fn log_abs(s: &Sum) -> Result<Sum> {
    if s.is_zero() {
        return Err(SolveError::unsolvable("logarithm of zero"));
    }
    if s.len() > 1 {
        let (c, g, prim) = s.split_content();
        let outer = log_abs(&Sum::single(c, g))?;
        return Ok(outer.add(&Sum::atom(Expr::Log(
            Expr::Abs(prim.to_expr().boxed()).boxed(),
        ))));
    }
    let Some((m, c)) = s.single_term() else {
        return Ok(Sum::zero());
    };
    let mut out = log_abs_constant(c);
    for (atom, k) in &m.powers {
        let piece = match atom {
            Expr::Constant(v) => log_abs_constant(v),
            Expr::Abs(inner) => Sum::atom(Expr::Log(Expr::Abs(inner.clone()).boxed())),
            Expr::Exp(_) => Sum::from_expr(&Expr::Log(atom.clone().boxed()))?,
            other => Sum::atom(Expr::Log(Expr::Abs(other.clone().boxed()).boxed())),
        };
        out = out.add(&piece.scale(k));
    }
    if let Some(w) = &m.exp {
        out = out.add(w);
    }
    Ok(out)
}

fn log_abs_constant(c: &Rational) -> Sum {
    let c = c.abs();
    if c.is_one() {
        Sum::zero()
    } else {
        Sum::atom(Expr::Log(Expr::Constant(c).boxed()))
    }
}

fn abs_of(s: Sum) -> Result<Sum> {
    if let Some(c) = s.as_constant() {
        return Ok(Sum::constant(c.abs()));
    }
    if s.len() > 1 {
        let (c, g, prim) = s.split_content();
        let outer = abs_of(Sum::single(c, g))?;
        return outer.mul(&Sum::atom(Expr::Abs(prim.to_expr().boxed())));
    }
    let Some((m, c)) = s.single_term() else {
        return Ok(Sum::zero());
    };
    let mut powers = BTreeMap::new();
    for (atom, k) in &m.powers {
        let even = k.is_integer() && k.to_integer() % BigInt::from(2) == BigInt::zero();
        let key = match atom {
            Expr::Abs(_) | Expr::Exp(_) => atom.clone(),
            Expr::Constant(v) if v.is_positive() => atom.clone(),
            _ if even => atom.clone(),
            other => Expr::Abs(other.clone().boxed()),
        };
        *powers.entry(key).or_insert_with(Rational::zero) += k;
    }
    settle(
        c.abs(),
        Monomial {
            powers,
            exp: m.exp.clone(),
        },
    )
}

pub(crate) fn is_sum_atom(atom: &Expr) -> bool {
    matches!(
        atom,
        Expr::Add(..) | Expr::Sub(..) | Expr::Mul(..) | Expr::Div(..) | Expr::Neg(..)
    )
}

fn small_positive_integer(k: &Rational) -> Option<u32> {
    if !k.is_integer() || !k.is_positive() {
        return None;
    }
    k.to_integer().to_u32().filter(|n| *n <= MAX_EXPAND_POWER)
}

/// `c^k` when it is rational.
pub(crate) fn rational_power(c: &Rational, k: &Rational) -> Option<Rational> {
    if c.is_zero() {
        return if k.is_positive() {
            Some(Rational::zero())
        } else {
            None
        };
    }
    if c.is_one() {
        return Some(Rational::one());
    }
    if *c == -Rational::one() && k.is_integer() {
        let even = (k.numer() % BigInt::from(2)).is_zero();
        return Some(if even { Rational::one() } else { -Rational::one() });
    }
    let p = k.numer().to_i64()?;
    let q = k.denom().to_u32()?;
    if p.unsigned_abs() > 64 {
        return None;
    }
    let root = if q == 1 {
        c.clone()
    } else {
        let num = integer_root(c.numer(), q)?;
        let den = integer_root(c.denom(), q)?;
        Rational::new(num, den)
    };
    let mut out = Rational::one();
    for _ in 0..p.unsigned_abs() {
        out *= &root;
    }
    if p < 0 {
        out = Rational::one() / out;
    }
    Some(out)
}

fn integer_root(n: &BigInt, q: u32) -> Option<BigInt> {
    if n.is_negative() {
        if q % 2 == 0 {
            return None;
        }
        return integer_root(&-n.clone(), q).map(|r| -r);
    }
    let r = n.nth_root(q);
    if r.pow(q) == *n {
        Some(r)
    } else {
        None
    }
}

fn single_variable(a: &Sum, b: &Sum) -> Option<String> {
    let mut found: Option<String> = None;
    for m in a.terms.keys().chain(b.terms.keys()) {
        for atom in m.powers.keys() {
            let name = atom.as_variable()?;
            match &found {
                Some(f) if f != name => return None,
                Some(_) => {}
                None => found = Some(name.to_string()),
            }
        }
    }
    found
}

/// Graded lexicographic order on monomials.
fn grlex(a: &Monomial, b: &Monomial) -> Ordering {
    a.total_degree()
        .cmp(&b.total_degree())
        .then_with(|| {
            let mut atoms: Vec<&Expr> = a.powers.keys().chain(b.powers.keys()).collect();
            atoms.sort();
            atoms.dedup();
            for atom in atoms {
                let ka = a.powers.get(atom).cloned().unwrap_or_else(Rational::zero);
                let kb = b.powers.get(atom).cloned().unwrap_or_else(Rational::zero);
                match ka.cmp(&kb) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        })
        .then_with(|| a.cmp(b))
}

/// Terms print with higher degree first and arbitrary constants last.
fn display_order(a: &Monomial, b: &Monomial) -> Ordering {
    a.has_arbitrary_constant()
        .cmp(&b.has_arbitrary_constant())
        .then_with(|| a.exp.is_some().cmp(&b.exp.is_some()))
        .then_with(|| grlex(b, a))
}

fn factor_rank(atom: &Expr) -> u8 {
    match atom {
        Expr::Constant(_) => 0,
        Expr::Variable(v) if is_arbitrary_constant(v) => 1,
        Expr::Variable(_) => 2,
        _ => 3,
    }
}

fn power_expr(atom: &Expr, k: &Rational) -> Expr {
    if k.is_one() {
        atom.clone()
    } else {
        Expr::Pow(atom.clone().boxed(), Expr::Constant(k.clone()).boxed())
    }
}

fn product(items: Vec<Expr>) -> Expr {
    let mut iter = items.into_iter();
    let Some(first) = iter.next() else {
        return Expr::Constant(Rational::one());
    };
    iter.fold(first, |acc, item| Expr::Mul(acc.boxed(), item.boxed()))
}

fn term_expr(coeff: &Rational, mono: &Monomial) -> Expr {
    if mono.is_one() {
        return Expr::Constant(coeff.clone());
    }
    let magnitude = coeff.abs();
    let mut num = Vec::new();
    let mut den = Vec::new();
    if !magnitude.numer().is_one() {
        num.push(Expr::Constant(Rational::from_integer(magnitude.numer().clone())));
    }
    if !magnitude.denom().is_one() {
        den.push(Expr::Constant(Rational::from_integer(magnitude.denom().clone())));
    }
    let mut atoms: Vec<(&Expr, &Rational)> = mono.powers.iter().collect();
    atoms.sort_by(|a, b| factor_rank(a.0).cmp(&factor_rank(b.0)).then_with(|| a.0.cmp(b.0)));
    for (atom, k) in atoms {
        if k.is_positive() {
            num.push(power_expr(atom, k));
        } else {
            den.push(power_expr(atom, &-k.clone()));
        }
    }
    if let Some(arg) = &mono.exp {
        num.push(Expr::Exp(arg.to_expr().boxed()));
    }
    let body = if den.is_empty() {
        product(num)
    } else {
        Expr::Div(product(num).boxed(), product(den).boxed())
    };
    if coeff.is_negative() {
        Expr::Neg(body.boxed())
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, div, exp, int, mul, pow, sub};

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn expands_integer_powers_of_sums() {
        let s = Sum::from_expr(&pow(add(x(), int(1)), int(2))).unwrap();
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn exponentials_merge() {
        let e = mul(exp(mul(int(2), x())), exp(mul(int(-2), x())));
        assert_eq!(Sum::from_expr(&e).unwrap(), Sum::one());
    }

    #[test]
    fn together_detects_hidden_zero() {
        // x/(x+1) + 1/(x+1) - 1
        let d = add(x(), int(1));
        let e = sub(add(div(x(), d.clone()), div(int(1), d)), int(1));
        let (num, _) = Sum::from_expr(&e).unwrap().together().unwrap();
        assert!(num.is_zero());
    }

    #[test]
    fn cancel_divides_exactly() {
        let y = Expr::var("y");
        let e = div(add(mul(x(), x()), mul(x(), y.clone())), add(x(), y));
        let s = Sum::from_expr(&e).unwrap().cancel().unwrap();
        assert_eq!(s, Sum::atom(x()));
    }

    #[test]
    fn perfect_roots_fold_to_rationals() {
        assert_eq!(
            rational_power(&Rational::from_integer(BigInt::from(8)), &Rational::new(BigInt::from(2), BigInt::from(3))),
            Some(Rational::from_integer(BigInt::from(4)))
        );
        assert_eq!(rational_power(&Rational::from_integer(BigInt::from(2)), &Rational::new(BigInt::from(1), BigInt::from(2))), None);
    }

    #[test]
    fn unit_bases_fold_for_any_exponent() {
        let huge = Rational::from_integer(BigInt::from(12_000_008));
        assert_eq!(rational_power(&Rational::one(), &huge), Some(Rational::one()));
        assert_eq!(rational_power(&-Rational::one(), &huge), Some(Rational::one()));
        assert_eq!(
            rational_power(&-Rational::one(), &(huge + Rational::one())),
            Some(-Rational::one())
        );
    }
}

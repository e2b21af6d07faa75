use std::collections::{BTreeMap, HashMap};

use crate::expr::{one, zero, Expr, Rational};
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

const DISTRIBUTE_TERM_LIMIT: usize = 64;

#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
struct CanonKey(Vec<Expr>);

/// One bottom-up pass of local rewrites: constant folding, like-term collection, identities.
/// This keeps the shape of the input readable; use `normalize` for a canonical form.
pub fn simplify(expr: Expr) -> Expr {
    let mut cache = HashMap::new();
    simplify_cached(expr, &mut cache)
}

fn simplify_cached(expr: Expr, cache: &mut HashMap<Expr, Expr>) -> Expr {
    if let Some(hit) = cache.get(&expr) {
        return hit.clone();
    }

    let key = expr.clone();
    let result = match expr {
        Expr::Add(a, b) => simplify_add(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Sub(a, b) => simplify_sub(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Mul(a, b) => simplify_mul(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Div(a, b) => simplify_div(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Pow(a, b) => simplify_pow(simplify_cached(*a, cache), simplify_cached(*b, cache)),
        Expr::Neg(a) => simplify_neg(simplify_cached(*a, cache)),

        Expr::Sin(a) => match simplify_cached(*a, cache) {
            x if x.is_zero() => zero(),
            Expr::Neg(inner) => simplify_neg(Expr::Sin(inner)),
            x => Expr::Sin(x.boxed()),
        },
        Expr::Cos(a) => match simplify_cached(*a, cache) {
            x if x.is_zero() => one(),
            Expr::Neg(inner) => Expr::Cos(inner),
            x => Expr::Cos(x.boxed()),
        },
        Expr::Tan(a) => match simplify_cached(*a, cache) {
            x if x.is_zero() => zero(),
            Expr::Neg(inner) => simplify_neg(Expr::Tan(inner)),
            x => Expr::Tan(x.boxed()),
        },
        Expr::Asin(a) => match simplify_cached(*a, cache) {
            x if x.is_zero() => zero(),
            Expr::Neg(inner) => simplify_neg(Expr::Asin(inner)),
            x => Expr::Asin(x.boxed()),
        },
        Expr::Acos(a) => Expr::Acos(simplify_cached(*a, cache).boxed()),
        Expr::Atan(a) => match simplify_cached(*a, cache) {
            x if x.is_zero() => zero(),
            Expr::Neg(inner) => simplify_neg(Expr::Atan(inner)),
            x => Expr::Atan(x.boxed()),
        },
        Expr::Exp(a) => match simplify_cached(*a, cache) {
            x if x.is_zero() => one(),
            Expr::Log(inner) => *inner,
            x => Expr::Exp(x.boxed()),
        },
        Expr::Log(a) => match simplify_cached(*a, cache) {
            x if x.is_one() => zero(),
            Expr::Exp(inner) => *inner,
            x => Expr::Log(x.boxed()),
        },
        Expr::Abs(a) => match simplify_cached(*a, cache) {
            Expr::Constant(c) => Expr::Constant(c.abs()),
            Expr::Neg(inner) => Expr::Abs(inner),
            x @ Expr::Abs(_) => x,
            x @ Expr::Exp(_) => x,
            x => Expr::Abs(x.boxed()),
        },

        e => e,
    };

    cache.insert(key, result.clone());
    result
}

/// Apply simplification passes until the expression stops changing or we hit the iteration cap.
pub fn simplify_fully(expr: Expr) -> Expr {
    simplify_with_limit(expr, 64)
}

/// Apply simplification passes up to `max_iters`, returning the last value if convergence is not reached.
pub fn simplify_with_limit(expr: Expr, max_iters: usize) -> Expr {
    let mut cache = HashMap::new();
    let mut current = expr;
    for _ in 0..max_iters {
        let next = simplify_cached(current.clone(), &mut cache);
        if next == current {
            return current;
        }
        current = next;
    }
    tracing::debug!(target: "simplify", max_iters, "simplification did not converge");
    current
}

pub fn simplify_add(x: Expr, y: Expr) -> Expr {
    rebuild_sum(collect_sum(flatten_sum(&x).into_iter().chain(flatten_sum(&y))))
}

pub fn simplify_sub(x: Expr, y: Expr) -> Expr {
    simplify_add(x, simplify_neg(y))
}

fn flatten_sum(expr: &Expr) -> Vec<Expr> {
    match expr {
        Expr::Add(a, b) => {
            let mut out = flatten_sum(a);
            out.extend(flatten_sum(b));
            out
        }
        Expr::Sub(a, b) => {
            let mut out = flatten_sum(a);
            out.extend(flatten_sum(b).into_iter().map(simplify_neg));
            out
        }
        Expr::Neg(a) => flatten_sum(a).into_iter().map(simplify_neg).collect(),
        other => vec![other.clone()],
    }
}

fn count_sum_terms(expr: &Expr) -> usize {
    match expr {
        Expr::Add(a, b) | Expr::Sub(a, b) => count_sum_terms(a) + count_sum_terms(b),
        Expr::Neg(inner) => count_sum_terms(inner),
        _ => 1,
    }
}

fn split_coeff(expr: &Expr) -> (Rational, Expr) {
    match expr {
        Expr::Constant(c) => (c.clone(), one()),
        Expr::Neg(e) => {
            let (c, b) = split_coeff(e);
            (-c, b)
        }
        Expr::Mul(a, b) => {
            let (ca, ba) = split_coeff(a);
            let (cb, bb) = split_coeff(b);
            (ca * cb, mul_norm(ba, bb))
        }
        other => (Rational::one(), other.clone()),
    }
}

fn mul_norm(a: Expr, b: Expr) -> Expr {
    let mut items: Vec<Expr> = factors(&a).into_iter().chain(factors(&b)).collect();
    items.sort();
    mk_product(items)
}

fn factors(expr: &Expr) -> Vec<Expr> {
    match expr {
        Expr::Mul(a, b) => {
            let mut out = factors(a);
            out.extend(factors(b));
            out
        }
        t if t.is_one() => vec![],
        t => vec![t.clone()],
    }
}

fn collect_sum<I>(terms: I) -> Vec<(CanonKey, Rational)>
where
    I: IntoIterator<Item = Expr>,
{
    // Insertion order is kept so the rebuilt sum reads like the input.
    let mut order: Vec<CanonKey> = Vec::new();
    let mut map: BTreeMap<CanonKey, Rational> = BTreeMap::new();
    for term in terms {
        let (c, b) = split_coeff(&term);
        if c.is_zero() {
            continue;
        }
        let key = CanonKey(factors(&b));
        match map.get_mut(&key) {
            Some(acc) => *acc += c,
            None => {
                order.push(key.clone());
                map.insert(key, c);
            }
        }
    }
    order
        .into_iter()
        .filter_map(|key| {
            let coeff = map.remove(&key)?;
            (!coeff.is_zero()).then_some((key, coeff))
        })
        .collect()
}

fn rebuild_sum(items: Vec<(CanonKey, Rational)>) -> Expr {
    let mut constant = Rational::zero();
    let mut terms = Vec::new();
    for (CanonKey(fs), coeff) in items {
        if fs.is_empty() {
            constant += coeff;
        } else {
            terms.push(term_from(&coeff, mk_product(fs)));
        }
    }
    if !constant.is_zero() {
        terms.push(Expr::Constant(constant));
    }
    let mut iter = terms.into_iter();
    let Some(first) = iter.next() else {
        return zero();
    };
    iter.fold(first, |acc, term| match term {
        Expr::Neg(inner) => Expr::Sub(acc.boxed(), inner),
        Expr::Constant(c) if c.is_negative() => Expr::Sub(acc.boxed(), Expr::Constant(-c).boxed()),
        Expr::Mul(c, rest) if matches!(&*c, Expr::Constant(k) if k.is_negative()) => {
            let Expr::Constant(k) = *c else { unreachable!() };
            Expr::Sub(acc.boxed(), term_from(&-k, *rest).boxed())
        }
        other => Expr::Add(acc.boxed(), other.boxed()),
    })
}

fn term_from(coef: &Rational, base: Expr) -> Expr {
    if coef.is_zero() {
        return zero();
    }
    if base.is_one() {
        return Expr::Constant(coef.clone());
    }
    if coef.is_one() {
        return base;
    }
    if coef == &-Rational::one() {
        return simplify_neg(base);
    }
    Expr::Mul(Expr::Constant(coef.clone()).boxed(), base.boxed())
}

pub fn simplify_mul(x: Expr, y: Expr) -> Expr {
    match (x, y) {
        (Expr::Constant(xc), Expr::Constant(yc)) => Expr::Constant(xc * yc),
        (x, y) if x.is_zero() || y.is_zero() => zero(),
        (x, y) if x.is_one() => y,
        (x, y) if y.is_one() => x,
        (Expr::Constant(c), sum @ (Expr::Add(..) | Expr::Sub(..)))
        | (sum @ (Expr::Add(..) | Expr::Sub(..)), Expr::Constant(c))
            if count_sum_terms(&sum) <= DISTRIBUTE_TERM_LIMIT =>
        {
            let terms = flatten_sum(&sum)
                .into_iter()
                .map(|t| simplify_mul(Expr::Constant(c.clone()), t));
            rebuild_sum(collect_sum(terms))
        }
        (x, y) => {
            let (c, b) = split_coeff(&Expr::Mul(x.boxed(), y.boxed()));
            let b = merge_powers(b);
            term_from(&c, b)
        }
    }
}

/// Combine repeated factors `a*a^k` into `a^(k+1)` inside a product.
fn merge_powers(product: Expr) -> Expr {
    let mut exponents: Vec<(Expr, Rational)> = Vec::new();
    for f in factors(&product) {
        let (base, e) = match f {
            Expr::Pow(b, e) => match *e {
                Expr::Constant(k) => (*b, k),
                other => (Expr::Pow(b, other.boxed()), Rational::one()),
            },
            other => (other, Rational::one()),
        };
        match exponents.iter_mut().find(|(b, _)| *b == base) {
            Some((_, acc)) => *acc += e,
            None => exponents.push((base, e)),
        }
    }
    let items = exponents
        .into_iter()
        .filter(|(_, e)| !e.is_zero())
        .map(|(b, e)| simplify_pow(b, Expr::Constant(e)))
        .collect();
    mk_product(items)
}

pub fn simplify_div(x: Expr, y: Expr) -> Expr {
    match (x, y) {
        (Expr::Constant(n), Expr::Constant(d)) => {
            if d.is_zero() {
                Expr::Div(Expr::Constant(n).boxed(), Expr::Constant(d).boxed())
            } else {
                Expr::Constant(n / d)
            }
        }
        (x, _) if x.is_zero() => zero(),
        (x, y) if y.is_one() => x,
        (x, y) => {
            let (cx, bx) = split_coeff(&x);
            let (cy, by) = split_coeff(&y);
            if cy.is_zero() {
                return Expr::Div(x.boxed(), y.boxed());
            }
            let c = cx / cy;
            if bx == by {
                return Expr::Constant(c);
            }
            let core = if by.is_one() {
                bx
            } else {
                Expr::Div(bx.boxed(), by.boxed())
            };
            term_from(&c, core)
        }
    }
}

pub fn simplify_pow(x: Expr, y: Expr) -> Expr {
    match (x, y) {
        (_, Expr::Constant(e)) if e.is_zero() => one(),
        (base, Expr::Constant(e)) if e.is_one() => base,
        (Expr::Constant(b), _) if b.is_one() => one(),
        (Expr::Constant(b), Expr::Constant(e)) => {
            if e.is_integer() {
                let k: BigInt = e.to_integer();
                if let Some(power) = k.abs().to_u32() {
                    if !k.is_negative() {
                        return Expr::Constant(Rational::new(b.numer().pow(power), b.denom().pow(power)));
                    } else if !b.is_zero() {
                        return Expr::Constant(Rational::new(b.denom().pow(power), b.numer().pow(power)));
                    }
                }
            }
            Expr::Pow(Expr::Constant(b).boxed(), Expr::Constant(e).boxed())
        }
        (Expr::Pow(inner, k1), Expr::Constant(k2)) if k2.is_integer() => match *k1 {
            Expr::Constant(k1) => simplify_pow(*inner, Expr::Constant(k1 * k2)),
            other => Expr::Pow(Expr::Pow(inner, other.boxed()).boxed(), Expr::Constant(k2).boxed()),
        },
        (x, y) => Expr::Pow(x.boxed(), y.boxed()),
    }
}

pub fn simplify_neg(expr: Expr) -> Expr {
    match expr {
        Expr::Constant(x) => Expr::Constant(-x),
        Expr::Neg(x) => *x,
        Expr::Mul(a, b) if matches!(&*a, Expr::Constant(_)) => {
            let Expr::Constant(c) = *a else { unreachable!() };
            term_from(&-c, *b)
        }
        other => Expr::Neg(other.boxed()),
    }
}

fn mk_product(items: Vec<Expr>) -> Expr {
    let mut iter = items.into_iter().filter(|e| !e.is_one());
    let Some(first) = iter.next() else {
        return one();
    };
    iter.fold(first, |acc, item| Expr::Mul(acc.boxed(), item.boxed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, int, mul, pow};

    #[test]
    fn collects_like_terms_and_folds_constants() {
        let x = Expr::var("x");
        let expr = add(add(mul(int(2), x.clone()), int(3)), x.clone());
        assert_eq!(simplify_fully(expr), add(mul(int(3), x), int(3)));
    }

    #[test]
    fn merges_repeated_factors() {
        let x = Expr::var("x");
        let expr = mul(x.clone(), pow(x.clone(), int(2)));
        assert_eq!(simplify(expr), pow(x, int(3)));
    }
}

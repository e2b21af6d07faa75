mod common;
mod direct;
mod partial_fractions;
mod parts;
mod substitution;
mod types;

use crate::error::{Result, SolveError};
use crate::expr::{add, mul, Expr, Rational};
use crate::simplify::{decompose, normalize, Term};
use crate::simplify::canonical::{is_sum_atom, Sum};

pub(crate) use common::linear_parts;
pub use types::{
    AttemptStatus, IntegrandKind, IntegrandReport, IntegrationAttempt, IntegrationResult,
    NonElementaryKind, ReasonCode, Strategy,
};

/// Substitution is not nested: the inner integral is solved by table, parts or partial fractions.
const MAX_SUBSTITUTION_DEPTH: usize = 1;

/// Integrate `expr` with respect to `var`. No constant of integration is added.
pub fn integrate(var: &str, expr: &Expr) -> IntegrationResult {
    let kind = classify_integrand(expr, var);
    let mut attempts = Vec::new();
    match integrate_expr(var, expr, 0, &mut attempts) {
        Some(result) => IntegrationResult::Integrated {
            result: normalize(result),
            report: IntegrandReport {
                kind,
                reason: None,
                attempts,
            },
        },
        None => {
            let (kind, reason) = match detect_non_elementary(expr, var) {
                Some(found) => (
                    IntegrandKind::NonElementary(found.clone()),
                    ReasonCode::NonElementary(found),
                ),
                None => (kind, ReasonCode::UnknownStructure),
            };
            IntegrationResult::NotIntegrable(IntegrandReport {
                kind,
                reason: Some(reason),
                attempts,
            })
        }
    }
}

/// Antiderivative or an `Unsolvable` error naming the integrand.
pub fn antiderivative(var: &str, expr: &Expr) -> Result<Expr> {
    match integrate(var, expr) {
        IntegrationResult::Integrated { result, report } => {
            tracing::debug!(
                target: "integrate",
                integrand = %expr,
                %result,
                attempts = report.attempts.len(),
                "integrated"
            );
            Ok(result)
        }
        IntegrationResult::NotIntegrable(report) => {
            tracing::warn!(target: "integrate", integrand = %expr, reason = ?report.reason, "not integrable");
            Err(SolveError::unsolvable(format!(
                "no elementary antiderivative found for {expr} with respect to {var}"
            )))
        }
    }
}

fn integrate_expr(
    var: &str,
    expr: &Expr,
    depth: usize,
    attempts: &mut Vec<IntegrationAttempt>,
) -> Option<Expr> {
    let terms = decompose(expr).ok()?;
    let (rational, rest): (Vec<Term>, Vec<Term>) = terms
        .into_iter()
        .partition(|t| is_rational_term(t, var) && has_sum_denominator(t));

    let mut total = Expr::Constant(Rational::from_integer(0.into()));
    if !rational.is_empty() {
        let combined = rational
            .iter()
            .map(Term::to_expr)
            .fold(Expr::Constant(Rational::from_integer(0.into())), add);
        match partial_fractions::integrate_rational(&combined, var) {
            Some(result) => {
                record(attempts, Strategy::PartialFractions, AttemptStatus::Succeeded);
                total = add(total, result);
            }
            None => {
                record(
                    attempts,
                    Strategy::PartialFractions,
                    AttemptStatus::Failed(ReasonCode::StrategyNotAvailable(
                        "denominator does not split over the rationals",
                    )),
                );
                for term in &rational {
                    total = add(total, integrate_term(term, var, depth, attempts)?);
                }
            }
        }
    }
    for term in &rest {
        total = add(total, integrate_term(term, var, depth, attempts)?);
    }
    Some(total)
}

fn integrate_term(
    term: &Term,
    var: &str,
    depth: usize,
    attempts: &mut Vec<IntegrationAttempt>,
) -> Option<Expr> {
    let (constant, factors, exp_arg) = split_constant(term, var);
    if let Some(anti) = direct::integrate_factors(&factors, exp_arg.as_ref(), var) {
        record(attempts, Strategy::Direct, AttemptStatus::Succeeded);
        return Some(mul(constant, anti));
    }
    if let Some(anti) = parts::integrate_by_parts(&factors, exp_arg.as_ref(), var) {
        record(attempts, Strategy::IntegrationByParts, AttemptStatus::Succeeded);
        return Some(mul(constant, anti));
    }
    if depth < MAX_SUBSTITUTION_DEPTH {
        let var_part = Term {
            coeff: Rational::from_integer(1.into()),
            factors: factors.clone(),
            exp: exp_arg.clone(),
        };
        let found = substitution::integrate_by_substitution(&var_part, var, &|in_u| {
            integrate_expr(substitution::U, in_u, depth + 1, &mut Vec::new())
        });
        if let Some(anti) = found {
            record(attempts, Strategy::Substitution, AttemptStatus::Succeeded);
            return Some(mul(constant, anti));
        }
    }
    if is_rational_term(term, var) {
        if let Some(anti) = partial_fractions::integrate_rational(&term.to_expr(), var) {
            record(attempts, Strategy::PartialFractions, AttemptStatus::Succeeded);
            return Some(anti);
        }
    }
    record(
        attempts,
        Strategy::Direct,
        AttemptStatus::Failed(ReasonCode::UnknownStructure),
    );
    None
}

fn record(attempts: &mut Vec<IntegrationAttempt>, strategy: Strategy, status: AttemptStatus) {
    attempts.push(IntegrationAttempt {
        strategy,
        status,
        note: None,
    });
}

/// Separates the factors free of `var` into a constant multiplier.
fn split_constant(term: &Term, var: &str) -> (Expr, Vec<(Expr, Rational)>, Option<Expr>) {
    let mut constant = Term {
        coeff: term.coeff.clone(),
        factors: Vec::new(),
        exp: None,
    };
    let mut factors = Vec::new();
    for (atom, k) in &term.factors {
        if atom.contains_var(var) {
            factors.push((atom.clone(), k.clone()));
        } else {
            constant.factors.push((atom.clone(), k.clone()));
        }
    }
    let mut exp_arg = None;
    if let Some(arg) = &term.exp {
        // e^(a x + b) keeps e^b with the constant part
        match decompose(arg) {
            Ok(parts) => {
                let (dep, free): (Vec<Term>, Vec<Term>) =
                    parts.into_iter().partition(|t| t.contains_var(var));
                let join = |ts: Vec<Term>| {
                    ts.iter()
                        .map(Term::to_expr)
                        .fold(Expr::Constant(Rational::from_integer(0.into())), add)
                };
                if !free.is_empty() {
                    constant.exp = Some(normalize(join(free)));
                }
                if !dep.is_empty() {
                    exp_arg = Some(normalize(join(dep)));
                }
            }
            Err(_) => exp_arg = Some(arg.clone()),
        }
    }
    (constant.to_expr(), factors, exp_arg)
}

fn is_rational_term(term: &Term, var: &str) -> bool {
    term.exp.is_none()
        && term.factors.iter().all(|(atom, k)| {
            k.is_integer()
                && (atom.as_variable() == Some(var)
                    || (is_sum_atom(atom)
                        && Sum::from_expr(atom)
                            .ok()
                            .and_then(|s| s.to_poly(var))
                            .is_some()))
        })
}

fn has_sum_denominator(term: &Term) -> bool {
    term.factors
        .iter()
        .any(|(atom, k)| is_sum_atom(atom) && k < &Rational::from_integer(0.into()))
}

fn classify_integrand(expr: &Expr, var: &str) -> IntegrandKind {
    let Ok(terms) = decompose(expr) else {
        return IntegrandKind::Unknown;
    };
    if terms.len() > 1 {
        return IntegrandKind::Sum;
    }
    let Some(term) = terms.first() else {
        return IntegrandKind::Constant;
    };
    if !term.contains_var(var) {
        return IntegrandKind::Constant;
    }
    if is_rational_term(term, var) {
        return if has_sum_denominator(term) {
            IntegrandKind::Rational
        } else {
            IntegrandKind::Polynomial
        };
    }
    let dependent: Vec<&Expr> = term
        .factors
        .iter()
        .filter(|(a, _)| a.contains_var(var))
        .map(|(a, _)| a)
        .collect();
    match (dependent.as_slice(), term.exp.is_some()) {
        ([], true) => IntegrandKind::Exponential,
        ([Expr::Sin(_) | Expr::Cos(_) | Expr::Tan(_)], false) => IntegrandKind::Trig,
        ([Expr::Log(_)], false) => IntegrandKind::Logarithmic,
        _ => IntegrandKind::Product,
    }
}

fn detect_non_elementary(expr: &Expr, var: &str) -> Option<NonElementaryKind> {
    let terms = decompose(expr).ok()?;
    terms.iter().find_map(|term| {
        let dependent: Vec<&(Expr, Rational)> = term
            .factors
            .iter()
            .filter(|(a, _)| a.contains_var(var))
            .collect();
        if let Some(arg) = &term.exp {
            if dependent.is_empty() && linear_parts(arg, var).is_none() {
                return Some(NonElementaryKind::ExpOfPolynomial);
            }
        }
        match dependent.as_slice() {
            [(Expr::Sin(_) | Expr::Cos(_), one), (x, minus_one)]
            | [(x, minus_one), (Expr::Sin(_) | Expr::Cos(_), one)]
                if x.as_variable() == Some(var)
                    && *one == Rational::from_integer(1.into())
                    && *minus_one == Rational::from_integer((-1).into()) =>
            {
                Some(NonElementaryKind::TrigOverArgument)
            }
            _ => None,
        }
    })
}

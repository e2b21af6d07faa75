//! `∫ g(u(x)) u'(x) dx` by recognising an inner function whose derivative divides out.

use crate::calculus::differentiate;
use crate::expr::{div, Expr};
use crate::simplify::{decompose, replace, substitute, try_normalize, Term};

/// Placeholder for the substituted variable; never produced by the parser.
pub(super) const U: &str = "_u";

pub(super) fn integrate_by_substitution(
    term: &Term,
    var: &str,
    integrate_in_u: &dyn Fn(&Expr) -> Option<Expr>,
) -> Option<Expr> {
    let expr = term.to_expr();
    for candidate in candidates(term, var) {
        let du = differentiate(var, &candidate);
        let Ok(du) = try_normalize(&du) else { continue };
        if du.is_zero() {
            continue;
        }
        let Ok(ratio) = try_normalize(&div(expr.clone(), du)) else {
            continue;
        };
        let in_u = replace(&ratio, &|e| (*e == candidate).then(|| Expr::var(U)));
        if in_u.contains_var(var) {
            continue;
        }
        if let Some(anti) = integrate_in_u(&in_u) {
            tracing::trace!(target: "integrate", u = %candidate, "substitution applied");
            return Some(substitute(&anti, U, &candidate));
        }
    }
    None
}

/// Inner expressions worth trying as `u`, most structured first.
fn candidates(term: &Term, var: &str) -> Vec<Expr> {
    let x = Expr::var(var);
    let mut out: Vec<Expr> = Vec::new();
    let mut push = |e: Expr| {
        if e.contains_var(var) && e != x && !out.contains(&e) {
            out.push(e);
        }
    };
    for (atom, _) in &term.factors {
        match atom {
            Expr::Log(inner) => {
                push(atom.clone());
                if let Expr::Abs(u) = &**inner {
                    push((**u).clone());
                }
            }
            Expr::Variable(_) | Expr::Constant(_) | Expr::Derivative { .. } => {}
            Expr::Add(..) | Expr::Sub(..) | Expr::Mul(..) | Expr::Div(..) | Expr::Neg(..) => {
                push(atom.clone())
            }
            other => {
                push(other.clone());
                if let Some(inner) = other.unary_arg() {
                    push(inner.clone());
                }
            }
        }
    }
    if let Some(arg) = &term.exp {
        push(arg.clone());
        if let Ok(parts) = decompose(arg) {
            if parts.len() == 1 {
                for (atom, _) in &parts[0].factors {
                    push(atom.clone());
                }
            }
        }
    }
    out
}

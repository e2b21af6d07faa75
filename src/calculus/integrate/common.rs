use crate::expr::Expr;
use crate::simplify::{linear_coefficients, normalize};

/// `(a, b)` with `expr = a*var + b`, `a` nonzero and free of `var`.
pub(crate) fn linear_parts(expr: &Expr, var: &str) -> Option<(Expr, Expr)> {
    let (a, b) = linear_coefficients(expr, var).ok()??;
    if a.is_zero() || a.contains_var(var) || b.contains_var(var) {
        return None;
    }
    Some((a, b))
}

/// Coefficient of `var` in a linear argument.
pub(crate) fn coeff_of_var(expr: &Expr, var: &str) -> Option<Expr> {
    linear_parts(expr, var).map(|(a, _)| a)
}

pub(crate) fn over(expr: Expr, divisor: Expr) -> Expr {
    normalize(crate::expr::div(expr, divisor))
}

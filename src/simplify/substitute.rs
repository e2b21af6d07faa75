use crate::expr::Expr;

/// Rebuilds `expr` bottom-up, replacing every node for which `rule` returns a value.
/// Replacements are not revisited.
pub fn replace(expr: &Expr, rule: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
    if let Some(out) = rule(expr) {
        return out;
    }
    match expr {
        Expr::Add(a, b) => Expr::Add(replace(a, rule).boxed(), replace(b, rule).boxed()),
        Expr::Sub(a, b) => Expr::Sub(replace(a, rule).boxed(), replace(b, rule).boxed()),
        Expr::Mul(a, b) => Expr::Mul(replace(a, rule).boxed(), replace(b, rule).boxed()),
        Expr::Div(a, b) => Expr::Div(replace(a, rule).boxed(), replace(b, rule).boxed()),
        Expr::Pow(a, b) => Expr::Pow(replace(a, rule).boxed(), replace(b, rule).boxed()),
        other => match other.unary_arg() {
            Some(a) => other.with_unary_arg(replace(a, rule)),
            None => other.clone(),
        },
    }
}

/// Substitute variable `var` with `replacement` throughout `expr`.
pub fn substitute(expr: &Expr, var: &str, replacement: &Expr) -> Expr {
    replace(expr, &|e| match e {
        Expr::Variable(name) if name == var => Some(replacement.clone()),
        _ => None,
    })
}

/// Replaces the derivative marker `d^order var / d wrt^order` with `replacement`.
pub fn substitute_derivative(expr: &Expr, var: &str, order: u32, replacement: &Expr) -> Expr {
    replace(expr, &|e| match e {
        Expr::Derivative { var: v, order: o, .. } if v == var && *o == order => {
            Some(replacement.clone())
        }
        _ => None,
    })
}

/// Substitutes several variables at once.
pub fn substitute_many(expr: &Expr, pairs: &[(String, Expr)]) -> Expr {
    replace(expr, &|e| match e {
        Expr::Variable(name) => pairs
            .iter()
            .find(|(v, _)| v == name)
            .map(|(_, value)| value.clone()),
        _ => None,
    })
}

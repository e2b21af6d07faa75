//! Parsed differential equations.

use std::fmt;

use crate::error::{Result, SolveError};
use crate::expr::{self, Expr};
use crate::format;
use crate::parser::Grammar;
use crate::simplify::{is_zero, linear_coefficients, normalize};

/// `M dx + N dy = 0`, kept separately because the exact method needs both parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifferentialForm {
    pub m: Expr,
    pub n: Expr,
}

impl DifferentialForm {
    pub fn latex(&self, independent: &str, dependent: &str) -> String {
        let lhs = expr::add(
            expr::mul(self.m.clone(), Expr::differential(independent)),
            expr::mul(self.n.clone(), Expr::differential(dependent)),
        );
        format::equation(&lhs, &expr::zero())
    }
}

/// `y^(order)(at) = value`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitialCondition {
    pub order: u32,
    pub at: Expr,
    pub value: Expr,
}

impl InitialCondition {
    pub fn latex(&self, dependent: &str) -> String {
        format!(
            "{dependent}{}({}) = {}",
            "'".repeat(self.order as usize),
            format::latex(&self.at),
            format::latex(&self.value)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equation {
    /// Sides as written, before any rearrangement.
    pub lhs: Expr,
    pub rhs: Expr,
    pub independent: String,
    pub dependent: String,
    /// Present when the equation was written with differentials.
    pub form: Option<DifferentialForm>,
    pub conditions: Vec<InitialCondition>,
}

impl Equation {
    pub(crate) fn from_sides(
        lhs: Expr,
        rhs: Expr,
        grammar: &Grammar,
        conditions: Vec<InitialCondition>,
    ) -> Result<Self> {
        let dx = format!("d{}", grammar.independent);
        let dy = format!("d{}", grammar.dependent);
        let written_with_differentials = [&lhs, &rhs]
            .iter()
            .any(|side| side.contains_var(&dx) || side.contains_var(&dy));
        let form = if written_with_differentials {
            if lhs.contains_derivative() || rhs.contains_derivative() {
                return Err(SolveError::parse(
                    "differentials and derivatives cannot be mixed",
                    1,
                ));
            }
            Some(split_differentials(
                &expr::sub(lhs.clone(), rhs.clone()),
                &dx,
                &dy,
            )?)
        } else {
            None
        };
        Ok(Equation {
            lhs,
            rhs,
            independent: grammar.independent.clone(),
            dependent: grammar.dependent.clone(),
            form,
            conditions,
        })
    }

    /// Highest derivative order of the dependent variable; differential forms are first order.
    pub fn order(&self) -> u32 {
        if self.form.is_some() {
            return 1;
        }
        self.residual().max_derivative_order().unwrap_or(0)
    }

    /// Expression that vanishes on solutions: `N y' + M` for differential forms, `lhs - rhs`
    /// otherwise.
    pub fn residual(&self) -> Expr {
        match &self.form {
            Some(form) => expr::add(
                expr::mul(form.n.clone(), self.derivative(1)),
                form.m.clone(),
            ),
            None => expr::sub(self.lhs.clone(), self.rhs.clone()),
        }
    }

    pub fn derivative(&self, order: u32) -> Expr {
        Expr::derivative(&self.dependent, &self.independent, order)
    }

    pub fn x(&self) -> Expr {
        Expr::var(&self.independent)
    }

    pub fn y(&self) -> Expr {
        Expr::var(&self.dependent)
    }

    /// The equation as written, in LaTeX.
    pub fn latex(&self) -> String {
        format::equation(&self.lhs, &self.rhs)
    }

    pub fn with_conditions(mut self, conditions: Vec<InitialCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// Reads `M` and `N` off `M dx + N dy` (everything moved to one side).
fn split_differentials(residual: &Expr, dx: &str, dy: &str) -> Result<DifferentialForm> {
    let invalid = || SolveError::parse("expected the form M dx + N dy = 0", 1);
    let (m, rest) = linear_coefficients(residual, dx)?.ok_or_else(invalid)?;
    let (n, rest) = linear_coefficients(&rest, dy)?.ok_or_else(invalid)?;
    if !is_zero(&rest)? {
        return Err(invalid());
    }
    let (m, n) = (normalize(m), normalize(n));
    if [&m, &n]
        .iter()
        .any(|e| e.contains_var(dx) || e.contains_var(dy))
    {
        return Err(invalid());
    }
    if n.is_zero() {
        return Err(SolveError::parse(
            format!("the {dy} term is missing, so there is no derivative to solve for"),
            1,
        ));
    }
    Ok(DifferentialForm { m, n })
}

#[cfg(test)]
mod tests {
    use crate::expr::{add, int, mul, Expr};
    use crate::parser::parse_equation;
    use crate::simplify::equivalent;

    #[test]
    fn differential_form_is_split() {
        let eq = parse_equation("(2*x+y)dx + (x+2*y)dy = 0").unwrap();
        let form = eq.form.clone().unwrap();
        let (x, y) = (Expr::var("x"), Expr::var("y"));
        assert!(equivalent(&form.m, &add(mul(int(2), x.clone()), y.clone())).unwrap());
        assert!(equivalent(&form.n, &add(x, mul(int(2), y))).unwrap());
        assert_eq!(eq.order(), 1);
    }

    #[test]
    fn differentials_on_both_sides() {
        let eq = parse_equation("y dx = x dy").unwrap();
        let form = eq.form.unwrap();
        assert_eq!(form.m, Expr::var("y"));
        assert!(equivalent(&form.n, &crate::expr::neg(Expr::var("x"))).unwrap());
    }

    #[test]
    fn order_follows_highest_derivative() {
        assert_eq!(parse_equation("y'' + y' = x").unwrap().order(), 2);
        assert_eq!(parse_equation("x + y = 1").unwrap().order(), 0);
    }
}

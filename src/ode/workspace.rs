//! State threaded through a single solve: the step trace, the arbitrary constants handed out so
//! far and the limits in force.

use num_traits::{One, Zero};

use crate::config::SolverConfig;
use crate::error::{Result, SolveError};
use crate::expr::{div, Expr};
use crate::simplify::{
    factor_content, linear_coefficients, normalize, simplify_with_limit, split_coefficient,
    substitute,
};
use crate::steps::StepTrace;

/// Hands out `C` for first-order problems and `C1, C2, ...` otherwise.
#[derive(Clone, Debug)]
pub(crate) struct ConstantPool {
    names: Vec<String>,
    next: usize,
}

impl ConstantPool {
    pub(crate) fn for_order(order: u32) -> Self {
        let names = if order <= 1 {
            vec!["C".to_string()]
        } else {
            (1..=order).map(|k| format!("C{k}")).collect()
        };
        ConstantPool { names, next: 0 }
    }

    pub(crate) fn fresh(&mut self) -> Result<Expr> {
        let name = self.names.get(self.next).ok_or_else(|| {
            SolveError::invariant(format!(
                "method needs more than {} arbitrary constants",
                self.names.len()
            ))
        })?;
        self.next += 1;
        Ok(Expr::var(name.clone()))
    }

    /// Constants handed out so far, in order.
    pub(crate) fn used(&self) -> Vec<String> {
        self.names[..self.next].to_vec()
    }
}

pub(crate) struct Workspace {
    pub(crate) trace: StepTrace,
    pub(crate) constants: ConstantPool,
    pub(crate) config: SolverConfig,
}

impl Workspace {
    pub(crate) fn new(order: u32, config: SolverConfig) -> Self {
        Workspace {
            trace: StepTrace::new(),
            constants: ConstantPool::for_order(order),
            config,
        }
    }

    /// Canonical form with a common factor pulled out, or bounded local rewriting when the
    /// canonical form is out of reach.
    pub(crate) fn polish(&self, expr: &Expr) -> Expr {
        factor_content(expr)
            .unwrap_or_else(|_| simplify_with_limit(expr.clone(), self.config.max_rewrite_passes))
    }

    /// Renames constants so numeric multiples disappear: `2 C x` becomes `C x`.
    pub(crate) fn absorb(&self, expr: &Expr) -> Expr {
        let mut out = normalize(expr.clone());
        for name in self.constants.used() {
            let Ok(Some((coeff, _))) = linear_coefficients(&out, &name) else {
                continue;
            };
            if coeff.is_zero() {
                continue;
            }
            let Ok((k, _)) = split_coefficient(&coeff) else {
                continue;
            };
            if k.is_one() || k.is_zero() {
                continue;
            }
            let c = Expr::var(name.clone());
            out = normalize(substitute(&out, &name, &div(c, Expr::Constant(k))));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, int, mul};
    use crate::simplify::equivalent;

    #[test]
    fn constants_follow_the_order() {
        let mut pool = ConstantPool::for_order(1);
        assert_eq!(pool.fresh().unwrap(), Expr::var("C"));
        assert!(pool.fresh().is_err());

        let mut pool = ConstantPool::for_order(2);
        pool.fresh().unwrap();
        assert_eq!(pool.fresh().unwrap(), Expr::var("C2"));
        assert_eq!(pool.used(), ["C1", "C2"]);
    }

    #[test]
    fn numeric_multiples_are_absorbed() {
        let mut ws = Workspace::new(2, SolverConfig::default());
        let c1 = ws.constants.fresh().unwrap();
        let c2 = ws.constants.fresh().unwrap();
        let x = Expr::var("x");
        let e = add(mul(int(2), mul(c1.clone(), x.clone())), mul(int(-3), c2.clone()));
        let out = ws.absorb(&e);
        assert!(equivalent(&out, &add(mul(c1, x), c2)).unwrap());
    }
}

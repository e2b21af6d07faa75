use crate::expr::{int, one, pow, Expr, Rational};
use crate::simplify::{simplify, simplify_add, simplify_sub};
use num_traits::{One, Zero};

/// Partial derivative with respect to `var`; every other symbol is held constant.
pub fn differentiate(var: &str, expr: &Expr) -> Expr {
    Differentiator {
        var,
        dependent: None,
    }
    .derive(expr)
}

/// Total derivative with respect to `var` where `dependent` is an unknown function of `var`.
/// Occurrences of `dependent` produce derivative markers.
pub fn total_derivative(var: &str, dependent: &str, expr: &Expr) -> Expr {
    Differentiator {
        var,
        dependent: Some(dependent),
    }
    .derive(expr)
}

struct Differentiator<'a> {
    var: &'a str,
    dependent: Option<&'a str>,
}

impl<'a> Differentiator<'a> {
    fn derive(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Variable(name) if name == self.var => Expr::Constant(Rational::one()),
            Expr::Variable(name) if Some(name.as_str()) == self.dependent => {
                Expr::derivative(name.clone(), self.var, 1)
            }
            Expr::Variable(_) | Expr::Constant(_) => Expr::Constant(Rational::zero()),
            Expr::Derivative { var, wrt, order } => {
                if Some(var.as_str()) == self.dependent && wrt == self.var {
                    Expr::derivative(var.clone(), wrt.clone(), order + 1)
                } else {
                    Expr::Constant(Rational::zero())
                }
            }

            Expr::Add(a, b) => simplify_add(self.derive(a), self.derive(b)),
            Expr::Sub(a, b) => simplify_sub(self.derive(a), self.derive(b)),
            Expr::Mul(a, b) => self.product_rule(a, b),
            Expr::Div(a, b) => self.quotient_rule(a, b),
            Expr::Pow(a, b) => self.power_rule(a, b),
            Expr::Neg(a) => simplify(Expr::Neg(self.derive(a).boxed())),

            Expr::Sin(a) => self.chain_rule(a, |inner| Expr::Cos(inner.boxed())),
            Expr::Cos(a) => simplify(Expr::Neg(
                self.chain_rule(a, |inner| Expr::Sin(inner.boxed())).boxed(),
            )),
            Expr::Tan(a) => self.chain_rule(a, |inner| {
                Expr::Div(one().boxed(), pow(Expr::Cos(inner.boxed()), int(2)).boxed())
            }),
            Expr::Asin(a) => self.chain_rule(a, |inner| {
                Expr::Div(one().boxed(), Expr::sqrt(one_minus_square(inner)).boxed())
            }),
            Expr::Acos(a) => simplify(Expr::Neg(
                self.chain_rule(a, |inner| {
                    Expr::Div(one().boxed(), Expr::sqrt(one_minus_square(inner)).boxed())
                })
                .boxed(),
            )),
            Expr::Atan(a) => self.chain_rule(a, |inner| {
                Expr::Div(
                    one().boxed(),
                    Expr::Add(one().boxed(), pow(inner, int(2)).boxed()).boxed(),
                )
            }),

            Expr::Exp(a) => self.chain_rule(a, |inner| Expr::Exp(inner.boxed())),
            // d/dx ln|u| = u'/u
            Expr::Log(a) => {
                let inner = match &**a {
                    Expr::Abs(u) => &**u,
                    other => other,
                };
                simplify(Expr::Div(self.derive(inner).boxed(), inner.clone().boxed()))
            }
            Expr::Abs(a) => self.chain_rule(a, |inner| {
                Expr::Div(inner.clone().boxed(), Expr::Abs(inner.boxed()).boxed())
            }),
        }
    }

    fn product_rule(&self, a: &Expr, b: &Expr) -> Expr {
        let da = self.derive(a);
        let db = self.derive(b);
        simplify(Expr::Add(
            strip_one(Expr::Mul(da.boxed(), b.clone().boxed())).boxed(),
            strip_one(Expr::Mul(a.clone().boxed(), db.boxed())).boxed(),
        ))
    }

    fn quotient_rule(&self, a: &Expr, b: &Expr) -> Expr {
        let db = self.derive(b);
        if db.is_zero() {
            return simplify(Expr::Div(self.derive(a).boxed(), b.clone().boxed()));
        }
        simplify(Expr::Div(
            Expr::Sub(
                Expr::Mul(self.derive(a).boxed(), b.clone().boxed()).boxed(),
                Expr::Mul(a.clone().boxed(), db.boxed()).boxed(),
            )
            .boxed(),
            pow(b.clone(), int(2)).boxed(),
        ))
    }

    fn power_rule(&self, base: &Expr, exp: &Expr) -> Expr {
        match exp {
            Expr::Constant(n) => {
                let db = self.derive(base);
                simplify(Expr::Mul(
                    Expr::Mul(
                        Expr::Constant(n.clone()).boxed(),
                        Expr::Pow(
                            base.clone().boxed(),
                            Expr::Constant(n - Rational::one()).boxed(),
                        )
                        .boxed(),
                    )
                    .boxed(),
                    db.boxed(),
                ))
            }
            _ => {
                // d(b^e) = b^e (e' ln b + e b'/b)
                let f = Expr::Pow(base.clone().boxed(), exp.clone().boxed());
                let da = self.derive(base);
                let db = self.derive(exp);
                simplify(Expr::Mul(
                    f.boxed(),
                    Expr::Add(
                        Expr::Mul(db.boxed(), Expr::Log(base.clone().boxed()).boxed()).boxed(),
                        Expr::Div(
                            Expr::Mul(exp.clone().boxed(), da.boxed()).boxed(),
                            base.clone().boxed(),
                        )
                        .boxed(),
                    )
                    .boxed(),
                ))
            }
        }
    }

    fn chain_rule<F>(&self, arg: &Expr, outer: F) -> Expr
    where
        F: Fn(Expr) -> Expr,
    {
        let da = strip_one(self.derive(arg));
        if da.is_zero() {
            return Expr::Constant(Rational::zero());
        }
        simplify(Expr::Mul(da.boxed(), outer(arg.clone()).boxed()))
    }
}

fn one_minus_square(inner: Expr) -> Expr {
    Expr::Sub(one().boxed(), pow(inner, int(2)).boxed())
}

fn flatten_mul(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            flatten_mul(a, out);
            flatten_mul(b, out);
        }
        other => out.push(other.clone()),
    }
}

fn strip_one(expr: Expr) -> Expr {
    let mut factors = Vec::new();
    flatten_mul(&expr, &mut factors);
    if !factors.iter().any(Expr::is_one) {
        return expr;
    }
    factors
        .into_iter()
        .filter(|e| !e.is_one())
        .reduce(|a, b| Expr::Mul(a.boxed(), b.boxed()))
        .unwrap_or_else(one)
}

//! Deciding which method applies, and why.
//!
//! A declared class is always checked against the equation's structure; nothing is taken on
//! trust. Without a declared class the recognisers run in precedence order, most specific first.

use crate::config::SolverConfig;
use crate::equation::Equation;
use crate::error::{Result, SolveError};
use crate::format::pretty;
use crate::simplify::is_zero;

use super::{forms, undetermined, EquationClass, Shape};

/// A class together with the data its method needs and a one-line justification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub class: EquationClass,
    pub shape: Shape,
    pub reason: String,
}

enum Verdict {
    Match(Shape, String),
    Miss(String),
}

const WRITTEN_FORM_ORDER: [EquationClass; 6] = [
    EquationClass::Exact,
    EquationClass::Separable,
    EquationClass::Linear,
    EquationClass::Bernoulli,
    EquationClass::Homogeneous,
    EquationClass::IntegratingFactor,
];

const DERIVATIVE_ORDER: [EquationClass; 6] = [
    EquationClass::Separable,
    EquationClass::Linear,
    EquationClass::Bernoulli,
    EquationClass::Homogeneous,
    EquationClass::Exact,
    EquationClass::IntegratingFactor,
];

const HIGHER_ORDER: [EquationClass; 3] = [
    EquationClass::ConstantCoefficient,
    EquationClass::UndeterminedCoefficients,
    EquationClass::Reducible,
];

/// Checks that `eq` really is of the declared class.
pub fn classify(
    eq: &Equation,
    hint: EquationClass,
    config: &SolverConfig,
) -> Result<Classification> {
    check_order(eq, config)?;
    match recognise(eq, hint, config)? {
        Verdict::Match(shape, reason) => {
            tracing::debug!(target: "classify", class = %hint, %reason, "declared class confirmed");
            Ok(Classification {
                class: hint,
                shape,
                reason,
            })
        }
        Verdict::Miss(reason) => {
            tracing::warn!(target: "classify", class = %hint, %reason, "declared class rejected");
            Err(SolveError::classification(format!("not {}: {reason}", hint.id())))
        }
    }
}

/// First class that matches, in precedence order.
pub fn detect(eq: &Equation, config: &SolverConfig) -> Result<Classification> {
    check_order(eq, config)?;
    let candidates: &[EquationClass] = match (eq.order(), eq.form.is_some()) {
        (1, true) => &WRITTEN_FORM_ORDER,
        (1, false) => &DERIVATIVE_ORDER,
        _ => &HIGHER_ORDER,
    };
    let mut first_miss = None;
    for &class in candidates {
        match recognise(eq, class, config) {
            Ok(Verdict::Match(shape, reason)) => {
                tracing::debug!(target: "classify", %class, %reason, "detected");
                return Ok(Classification {
                    class,
                    shape,
                    reason,
                });
            }
            Ok(Verdict::Miss(reason)) => {
                tracing::trace!(target: "classify", %class, %reason, "no match");
                first_miss.get_or_insert_with(|| format!("not {}: {reason}", class.id()));
            }
            Err(err) => {
                tracing::debug!(target: "classify", %class, error = %err, "recogniser gave up");
            }
        }
    }
    let detail = first_miss.unwrap_or_else(|| "no recogniser could decide".to_string());
    tracing::warn!(target: "classify", equation = %eq, %detail, "unsupported equation");
    Err(SolveError::classification(format!(
        "the equation does not match any supported class ({detail})"
    )))
}

fn check_order(eq: &Equation, config: &SolverConfig) -> Result<()> {
    match eq.order() {
        0 => Err(SolveError::classification(format!(
            "no derivative of {} appears, so this is not a differential equation",
            eq.dependent
        ))),
        n if n > config.max_order => Err(SolveError::classification(format!(
            "order {n} exceeds the supported maximum of {}",
            config.max_order
        ))),
        _ => Ok(()),
    }
}

fn recognise(eq: &Equation, class: EquationClass, config: &SolverConfig) -> Result<Verdict> {
    let (x, y) = (eq.independent.as_str(), eq.dependent.as_str());
    let order = eq.order();
    let first_order = !matches!(
        class,
        EquationClass::Reducible
            | EquationClass::ConstantCoefficient
            | EquationClass::UndeterminedCoefficients
    );
    if first_order && order != 1 {
        return Ok(Verdict::Miss(format!(
            "the method applies to first-order equations and this one has order {order}"
        )));
    }
    let form = if first_order {
        match forms::differential_form(eq)? {
            Some(form) => Some(form),
            None => {
                return Ok(Verdict::Miss(format!(
                    "{y}' does not enter linearly, so the equation cannot be solved for it"
                )))
            }
        }
    } else {
        None
    };

    let verdict = match (class, form) {
        (EquationClass::Separable, Some((m, n))) => {
            let f = forms::slope(&m, &n);
            match forms::separate(&f, x, y)? {
                Some((g, h)) => Verdict::Match(
                    Shape::Separable {
                        g: g.clone(),
                        h: h.clone(),
                    },
                    format!(
                        "the right side factors as g({x}) h({y}) with g = {}, h = {}",
                        pretty(&g),
                        pretty(&h)
                    ),
                ),
                None => Verdict::Miss(format!(
                    "right side does not factor into g({x})·h({y})"
                )),
            }
        }
        (EquationClass::Linear, Some((m, n))) => {
            let f = forms::slope(&m, &n);
            match forms::linear(&f, y)? {
                Some((p, q)) => Verdict::Match(
                    Shape::Linear {
                        p: p.clone(),
                        q: q.clone(),
                    },
                    format!(
                        "it has the form {y}' + P({x}) {y} = Q({x}) with P = {}, Q = {}",
                        pretty(&p),
                        pretty(&q)
                    ),
                ),
                None => Verdict::Miss(format!(
                    "{y} does not appear linearly, so there is no form {y}' + P({x}) {y} = Q({x})"
                )),
            }
        }
        (EquationClass::Bernoulli, Some((m, n))) => {
            let f = forms::slope(&m, &n);
            match forms::bernoulli(&f, y)? {
                Some((p, q, n)) => Verdict::Match(
                    Shape::Bernoulli {
                        p,
                        q,
                        n: n.clone(),
                    },
                    format!("it has the form {y}' + P({x}) {y} = Q({x}) {y}^n with n = {n}"),
                ),
                None => Verdict::Miss(format!(
                    "not of the form {y}' + P({x}) {y} = Q({x}) {y}^n with n other than 0 and 1"
                )),
            }
        }
        (EquationClass::Homogeneous, Some((m, n))) => {
            let f = forms::slope(&m, &n);
            if forms::is_homogeneous(&f, x, y)? {
                Verdict::Match(
                    Shape::Homogeneous { f },
                    format!("the right side is unchanged by {x} -> λ{x}, {y} -> λ{y}"),
                )
            } else {
                Verdict::Miss(format!(
                    "the right side changes under {x} -> λ{x}, {y} -> λ{y}"
                ))
            }
        }
        (EquationClass::Exact, Some((m, n))) => {
            let defect = forms::exactness_defect(&m, &n, x, y);
            if is_zero(&defect)? {
                Verdict::Match(
                    Shape::Exact { m, n },
                    format!("∂M/∂{y} = ∂N/∂{x}"),
                )
            } else {
                Verdict::Miss(format!(
                    "∂M/∂{y} - ∂N/∂{x} = {}, not zero",
                    pretty(&defect)
                ))
            }
        }
        (EquationClass::IntegratingFactor, Some((m, n))) => {
            if is_zero(&forms::exactness_defect(&m, &n, x, y))? {
                Verdict::Miss("the equation is already exact".to_string())
            } else {
                match forms::integrating_factor(&m, &n, x, y)? {
                    Some(factor) => {
                        let reason = format!(
                            "the factor μ({}) = {} makes it exact",
                            factor.var,
                            pretty(&factor.mu)
                        );
                        Verdict::Match(Shape::IntegratingFactor { m, n, factor }, reason)
                    }
                    None => Verdict::Miss(format!(
                        "no integrating factor depending on {x} alone or {y} alone was found"
                    )),
                }
            }
        }
        (EquationClass::Reducible, _) => {
            if order != 2 {
                Verdict::Miss(format!(
                    "reduction of order applies to second-order equations, this one has order {order}"
                ))
            } else {
                match forms::reducible(eq)? {
                    Some(case) => Verdict::Match(
                        Shape::Reducible { case },
                        match case {
                            forms::ReducibleCase::MissingDependent => {
                                format!("{y} itself does not appear")
                            }
                            forms::ReducibleCase::MissingIndependent => {
                                format!("{x} does not appear")
                            }
                        },
                    ),
                    None => Verdict::Miss(format!(
                        "both {x} and {y} appear, so neither substitution lowers the order"
                    )),
                }
            }
        }
        (EquationClass::ConstantCoefficient, _) => match forms::constant_coefficients(eq)? {
            Some((coeffs, forcing)) if forcing.is_zero() => Verdict::Match(
                Shape::ConstantCoefficient { coeffs },
                "linear and homogeneous with numeric coefficients".to_string(),
            ),
            Some(_) => Verdict::Miss(
                "the right side is not zero; this needs undetermined coefficients".to_string(),
            ),
            None => Verdict::Miss(
                "the equation is not linear with numeric coefficients".to_string(),
            ),
        },
        (EquationClass::UndeterminedCoefficients, _) => {
            match forms::constant_coefficients(eq)? {
                Some((_, forcing)) if forcing.is_zero() => Verdict::Miss(
                    "there is no forcing term; the equation is homogeneous".to_string(),
                ),
                Some((coeffs, forcing)) => {
                    match undetermined::families(&forcing, x, config.max_trial_degree)? {
                        Some(_) => Verdict::Match(
                            Shape::UndeterminedCoefficients {
                                coeffs,
                                forcing: forcing.clone(),
                            },
                            format!("numeric coefficients with forcing term {}", pretty(&forcing)),
                        ),
                        None => Verdict::Miss(format!(
                            "the forcing term {} is not built from polynomials, exponentials, \
                             sines and cosines of degree at most {}",
                            pretty(&forcing),
                            config.max_trial_degree
                        )),
                    }
                }
                None => Verdict::Miss(
                    "the equation is not linear with numeric coefficients".to_string(),
                ),
            }
        }
        (_, None) => {
            return Err(SolveError::invariant(format!(
                "first-order recogniser for {class} ran without a differential form"
            )))
        }
    };
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_equation;

    fn detected(text: &str) -> EquationClass {
        detect(&parse_equation(text).unwrap(), &SolverConfig::default())
            .unwrap()
            .class
    }

    #[test]
    fn precedence_prefers_the_specific_class() {
        assert_eq!(detected("dy/dx = x*y"), EquationClass::Separable);
        assert_eq!(detected("dy/dx + 2*y = 4*x"), EquationClass::Linear);
        assert_eq!(detected("(2*x+y)dx + (x+2*y)dy = 0"), EquationClass::Exact);
        assert_eq!(detected("y'' - 3y' + 2y = 0"), EquationClass::ConstantCoefficient);
        assert_eq!(detected("y'' + y = x"), EquationClass::UndeterminedCoefficients);
        assert_eq!(detected("y*y'' + (y')^2 = 0"), EquationClass::Reducible);
    }

    #[test]
    fn mismatch_names_the_reason() {
        let eq = parse_equation("dy/dx = x*y").unwrap();
        let err = classify(&eq, EquationClass::Exact, &SolverConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "classification_error");
        assert!(err.message().starts_with("not exact:"));
    }

    #[test]
    fn order_limits_apply() {
        let eq = parse_equation("x + y = 1").unwrap();
        assert!(detect(&eq, &SolverConfig::default()).is_err());
        let config = SolverConfig {
            max_order: 1,
            ..SolverConfig::default()
        };
        let eq = parse_equation("y'' + y = 0").unwrap();
        assert!(detect(&eq, &config).is_err());
    }
}

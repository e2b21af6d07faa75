use std::collections::BTreeMap;

use num_traits::{One, Signed, Zero};

use crate::calculus::differentiate;
use crate::error::{Result, SolveError};
use crate::expr::{self, add, cos, exp, int, mul, pow, sin, sub, Expr, Rational};
use crate::format::latex;
use crate::linear_system::{solve_linear, LinearResult};
use crate::polynomial::Poly;
use crate::simplify::{
    decompose, linear_coefficients, normalize, split_coefficient, substitute_many, terms, Term,
};
use crate::steps::Math;

use super::constant_coefficient::complementary;
use super::{Solution, Workspace};

/// One block of the trial solution: `x^j e^(rate x) {cos, sin}(frequency x)` for `j <= degree`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Family {
    pub(crate) rate: Rational,
    pub(crate) frequency: Rational,
    pub(crate) degree: u32,
}

/// Splits a forcing term into trial families, or `None` when some term is outside
/// polynomial × exponential × sine/cosine.
pub(crate) fn families(forcing: &Expr, x: &str, max_degree: u32) -> Result<Option<Vec<Family>>> {
    let mut grouped: BTreeMap<(Rational, Rational), u32> = BTreeMap::new();
    for term in decompose(&linearize_trig(forcing, x)?)? {
        let Some(family) = family_of(&term, x, max_degree)? else {
            tracing::debug!(target: "classify", term = %term.to_expr(), "forcing term has no trial form");
            return Ok(None);
        };
        let degree = grouped
            .entry((family.rate, family.frequency))
            .or_insert(0);
        *degree = (*degree).max(family.degree);
    }
    Ok(Some(
        grouped
            .into_iter()
            .map(|((rate, frequency), degree)| Family {
                rate,
                frequency,
                degree,
            })
            .collect(),
    ))
}

/// Highest power of a single sine or cosine that is expanded into multiple angles.
const MAX_WAVE_POWER: u32 = 8;

#[derive(Clone, Debug)]
enum Wave {
    One,
    Sin(Expr),
    Cos(Expr),
}

impl Wave {
    fn to_expr(&self) -> Expr {
        match self {
            Wave::One => expr::one(),
            Wave::Sin(angle) => sin(angle.clone()),
            Wave::Cos(angle) => cos(angle.clone()),
        }
    }
}

/// Rewrites products and powers of sines and cosines of `x` as sums of single waves,
/// `sin a cos b = (sin(a + b) + sin(a - b))/2` and so on, so each term has at most one.
pub(crate) fn linearize_trig(forcing: &Expr, x: &str) -> Result<Expr> {
    let mut out = expr::zero();
    for term in decompose(forcing)? {
        let mut waves = vec![(Rational::one(), Wave::One)];
        let mut rest = Vec::new();
        let mut sinusoids = 0u32;
        for (atom, power) in &term.factors {
            let count = match atom {
                Expr::Sin(_) | Expr::Cos(_) if atom.contains_var(x) && power.is_integer() => {
                    u32::try_from(power.to_integer()).ok().filter(|n| (1..=MAX_WAVE_POWER).contains(n))
                }
                _ => None,
            };
            let Some(count) = count else {
                rest.push((atom.clone(), power.clone()));
                continue;
            };
            sinusoids += count;
            for _ in 0..count {
                waves = times(&waves, atom)?;
            }
        }
        if sinusoids < 2 {
            out = add(out, term.to_expr());
            continue;
        }
        let base = Term {
            coeff: term.coeff.clone(),
            factors: rest,
            exp: term.exp.clone(),
        }
        .to_expr();
        for (c, wave) in waves {
            out = add(out, mul(mul(Expr::Constant(c), base.clone()), wave.to_expr()));
        }
    }
    Ok(normalize(out))
}

/// Product of a sum of waves with `sin(b)` or `cos(b)`.
fn times(waves: &[(Rational, Wave)], factor: &Expr) -> Result<Vec<(Rational, Wave)>> {
    let half = Rational::new(1.into(), 2.into());
    let mut out = Vec::new();
    for (c, wave) in waves {
        let pieces: Vec<(Rational, bool, Expr)> = match (wave, factor) {
            (Wave::One, Expr::Sin(b)) => vec![(c.clone(), true, (**b).clone())],
            (Wave::One, Expr::Cos(b)) => vec![(c.clone(), false, (**b).clone())],
            (Wave::Sin(a), Expr::Sin(b)) => vec![
                (c * &half, false, sub(a.clone(), (**b).clone())),
                (-(c * &half), false, add(a.clone(), (**b).clone())),
            ],
            (Wave::Cos(a), Expr::Cos(b)) => vec![
                (c * &half, false, sub(a.clone(), (**b).clone())),
                (c * &half, false, add(a.clone(), (**b).clone())),
            ],
            (Wave::Sin(a), Expr::Cos(b)) => vec![
                (c * &half, true, add(a.clone(), (**b).clone())),
                (c * &half, true, sub(a.clone(), (**b).clone())),
            ],
            (Wave::Cos(a), Expr::Sin(b)) => vec![
                (c * &half, true, add(a.clone(), (**b).clone())),
                (-(c * &half), true, sub(a.clone(), (**b).clone())),
            ],
            _ => return Err(SolveError::invariant(format!("{factor} is not a sine or cosine"))),
        };
        for (c, is_sin, angle) in pieces {
            if let Some(piece) = single_wave(c, is_sin, angle)? {
                out.push(piece);
            }
        }
    }
    Ok(out)
}

/// `c sin(angle)` or `c cos(angle)` with the angle's sign made positive; `None` for `sin(0)`.
fn single_wave(c: Rational, is_sin: bool, angle: Expr) -> Result<Option<(Rational, Wave)>> {
    let angle = normalize(angle);
    if angle.is_zero() {
        return Ok((!is_sin).then_some((c, Wave::One)));
    }
    let (k, _) = split_coefficient(&angle)?;
    let (c, angle) = if k.is_negative() {
        let flipped = normalize(expr::neg(angle));
        (if is_sin { -c } else { c }, flipped)
    } else {
        (c, angle)
    };
    Ok(Some((c, if is_sin { Wave::Sin(angle) } else { Wave::Cos(angle) })))
}

fn family_of(term: &Term, x: &str, max_degree: u32) -> Result<Option<Family>> {
    let mut degree = 0u32;
    let mut frequency: Option<Rational> = None;
    for (atom, power) in &term.factors {
        if !atom.contains_var(x) {
            continue;
        }
        match atom {
            Expr::Variable(v) if v == x => {
                if !power.is_integer() || power.is_negative() {
                    return Ok(None);
                }
                let Ok(k) = u32::try_from(power.to_integer()) else {
                    return Ok(None);
                };
                degree = k;
            }
            Expr::Sin(arg) | Expr::Cos(arg) if power.is_one() && frequency.is_none() => {
                let Some(b) = rate_of(arg, x, false)? else {
                    return Ok(None);
                };
                frequency = Some(b.abs());
            }
            _ => return Ok(None),
        }
    }
    if degree > max_degree {
        return Ok(None);
    }
    let rate = match &term.exp {
        Some(arg) if arg.contains_var(x) => match rate_of(arg, x, true)? {
            Some(a) => a,
            None => return Ok(None),
        },
        _ => Rational::zero(),
    };
    Ok(Some(Family {
        rate,
        frequency: frequency.unwrap_or_else(Rational::zero),
        degree,
    }))
}

/// `b` from `b x + c`; the offset `c` must be zero unless `offset_allowed`.
fn rate_of(arg: &Expr, x: &str, offset_allowed: bool) -> Result<Option<Rational>> {
    let Some((a, c)) = linear_coefficients(arg, x)? else {
        return Ok(None);
    };
    if c.contains_var(x) || (!offset_allowed && !c.is_zero()) {
        return Ok(None);
    }
    Ok(a.as_constant().cloned())
}

/// `Σ a_k y^(k) = g(x)`: complementary solution plus a trial particular solution fitted by
/// matching coefficients.
pub(super) fn solve(
    coeffs: &[Rational],
    forcing: &Expr,
    x: &str,
    y: &str,
    ws: &mut Workspace,
) -> Result<Solution> {
    let yc = complementary(coeffs, x, ws)?;
    ws.trace.push(
        "Complementary solution",
        "The homogeneous equation is solved first.",
        Math::Equation(Expr::var(format!("{y}_c")), yc.clone()),
    );

    let linearized = linearize_trig(forcing, x)?;
    if linearized != normalize(forcing.clone()) {
        ws.trace.push(
            "Rewrite the forcing term",
            "Products and powers of sines and cosines become sums of single waves.",
            Math::Equation(Expr::var("g"), linearized.clone()),
        );
    }
    let forcing = &linearized;
    let Some(families) = families(forcing, x, ws.config.max_trial_degree)? else {
        return Err(SolveError::invariant(format!(
            "forcing term {forcing} has no trial form"
        )));
    };
    let poly = Poly::from_coeffs(coeffs.to_vec());
    let var = Expr::var(x);
    let mut unknowns: Vec<String> = Vec::new();
    let mut trial: Option<Expr> = None;
    let mut notes = Vec::new();
    for family in &families {
        let s = resonance(&poly, family);
        if s > 0 {
            notes.push(format!(
                "the block with rate {} and frequency {} already solves the homogeneous equation, so it is multiplied by {x}^{s}",
                family.rate, family.frequency
            ));
        }
        let waves: Vec<Option<Expr>> = if family.frequency.is_zero() {
            vec![None]
        } else {
            let angle = normalize(mul(Expr::Constant(family.frequency.clone()), var.clone()));
            vec![Some(cos(angle.clone())), Some(sin(angle))]
        };
        for j in 0..=family.degree {
            for wave in &waves {
                let name = format!("A{}", unknowns.len() + 1);
                let mut term = Expr::var(name.as_str());
                match j + s {
                    0 => {}
                    1 => term = mul(term, var.clone()),
                    k => term = mul(term, pow(var.clone(), int(i64::from(k)))),
                }
                if !family.rate.is_zero() {
                    term = mul(
                        term,
                        exp(normalize(mul(Expr::Constant(family.rate.clone()), var.clone()))),
                    );
                }
                if let Some(wave) = wave {
                    term = mul(term, wave.clone());
                }
                unknowns.push(name);
                trial = Some(match trial {
                    Some(acc) => add(acc, term),
                    None => term,
                });
            }
        }
    }
    let trial = trial.ok_or_else(|| SolveError::invariant("empty trial solution"))?;
    let description = if notes.is_empty() {
        "The trial solution mirrors the forcing term.".to_string()
    } else {
        format!("The trial solution mirrors the forcing term; {}.", notes.join("; "))
    };
    let yp_symbol = Expr::var(format!("{y}_p"));
    ws.trace.push(
        "Choose a trial solution",
        description,
        Math::Equation(yp_symbol.clone(), trial.clone()),
    );

    let mut applied = expr::zero();
    let mut derivative = trial.clone();
    for (k, a) in coeffs.iter().enumerate() {
        if k > 0 {
            derivative = normalize(differentiate(x, &derivative));
        }
        if !a.is_zero() {
            applied = add(applied, mul(Expr::Constant(a.clone()), derivative.clone()));
        }
    }
    let residual = normalize(sub(applied, forcing.clone()));
    let equations = match_coefficients(&residual, &unknowns)?;
    ws.trace.push(
        "Match coefficients",
        format!("Substitute {y}_p into the equation and compare like terms."),
        Math::Latex(format!(
            "\\begin{{cases}} {} \\end{{cases}}",
            equations
                .iter()
                .map(|e| format!("{} = 0", latex(e)))
                .collect::<Vec<_>>()
                .join(" \\\\ ")
        )),
    );

    let values = match solve_linear(&unknowns, &equations)? {
        LinearResult::Unique(values) => values,
        LinearResult::Underdetermined { values, free } => {
            let zeros: Vec<(String, Expr)> =
                free.into_iter().map(|name| (name, expr::zero())).collect();
            values
                .iter()
                .map(|v| normalize(substitute_many(v, &zeros)))
                .collect()
        }
        LinearResult::Inconsistent => {
            return Err(SolveError::unsolvable(
                "the trial solution cannot match the forcing term",
            ))
        }
    };
    let assignment: Vec<(String, Expr)> = unknowns.iter().cloned().zip(values).collect();
    let yp = ws.polish(&substitute_many(&trial, &assignment));
    ws.trace.push(
        "Particular solution",
        "Insert the coefficients into the trial solution.",
        Math::Equation(yp_symbol, yp.clone()),
    );

    let rhs = terms(&yp)?.into_iter().fold(yc, add);
    ws.trace.push(
        "Assemble the general solution",
        format!("{y} = {y}_c + {y}_p"),
        Math::Equation(Expr::var(y), rhs.clone()),
    );
    Ok(Solution {
        lhs: Expr::var(y),
        rhs,
        constants: ws.constants.used(),
    })
}

/// How many times `e^(ax) cos(bx)` (or `e^(ax)`) already solves the homogeneous equation.
fn resonance(poly: &Poly, family: &Family) -> u32 {
    let a = &family.rate;
    let b = &family.frequency;
    let factor = if b.is_zero() {
        Poly::from_coeffs(vec![-a.clone(), Rational::one()])
    } else {
        let two = Rational::from_integer(2.into());
        Poly::from_coeffs(vec![
            a.clone() * a + b.clone() * b,
            -(two * a),
            Rational::one(),
        ])
    };
    let mut rest = poly.clone();
    let mut s = 0;
    loop {
        let (quotient, remainder) = rest.div_rem(&factor);
        if !remainder.is_zero() || rest.degree().unwrap_or(0) < factor.degree().unwrap_or(0) {
            return s;
        }
        rest = quotient;
        s += 1;
    }
}

/// One linear equation per basis function: the unknowns' combined coefficient must vanish.
fn match_coefficients(residual: &Expr, unknowns: &[String]) -> Result<Vec<Expr>> {
    let mut groups: Vec<(Expr, Expr)> = Vec::new();
    for term in decompose(residual)? {
        let mut unknown = None;
        let mut basis = Vec::new();
        for (atom, power) in term.factors {
            match atom.as_variable() {
                Some(name) if unknowns.iter().any(|u| u == name) => {
                    if !power.is_one() || unknown.is_some() {
                        return Err(SolveError::invariant(format!(
                            "residual {residual} is not linear in the trial coefficients"
                        )));
                    }
                    unknown = Some(atom);
                }
                _ => basis.push((atom, power)),
            }
        }
        let key = Term {
            coeff: Rational::one(),
            factors: basis,
            exp: term.exp,
        }
        .to_expr();
        let value = match unknown {
            Some(u) => mul(Expr::Constant(term.coeff), u),
            None => Expr::Constant(term.coeff),
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, acc)) => *acc = add(acc.clone(), value),
            None => groups.push((key, value)),
        }
    }
    Ok(groups.into_iter().map(|(_, v)| normalize(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::parser::parse_expr;
    use crate::simplify::equivalent;

    fn ints(values: &[i64]) -> Vec<Rational> {
        values.iter().map(|&v| Rational::from_integer(v.into())).collect()
    }

    #[test]
    fn forcing_terms_group_into_families() {
        let forcing = parse_expr("x^2 + 3*x*exp(2*x) + sin(3*x)").unwrap();
        let found = families(&forcing, "x", 6).unwrap().unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.contains(&Family {
            rate: Rational::zero(),
            frequency: Rational::zero(),
            degree: 2
        }));
        assert!(found.contains(&Family {
            rate: Rational::from_integer(2.into()),
            frequency: Rational::zero(),
            degree: 1
        }));
        assert!(families(&parse_expr("ln(x)").unwrap(), "x", 6).unwrap().is_none());
        assert!(families(&parse_expr("x^7").unwrap(), "x", 6).unwrap().is_none());
    }

    #[test]
    fn sinusoid_products_become_single_waves() {
        // sin(3x) cos(x) = (sin(4x) + sin(2x))/2
        let forcing = parse_expr("sin(3*x)*cos(x)").unwrap();
        let linear = linearize_trig(&forcing, "x").unwrap();
        let expected = parse_expr("sin(4*x)/2 + sin(2*x)/2").unwrap();
        assert!(equivalent(&linear, &expected).unwrap());
        let found = families(&forcing, "x", 6).unwrap().unwrap();
        let frequencies: Vec<Rational> = found.iter().map(|f| f.frequency.clone()).collect();
        assert_eq!(frequencies, ints(&[2, 4]));

        // sin(x)^2 = 1/2 - cos(2x)/2
        let square = linearize_trig(&parse_expr("sin(x)^2").unwrap(), "x").unwrap();
        assert!(equivalent(&square, &parse_expr("1/2 - cos(2*x)/2").unwrap()).unwrap());
    }

    #[test]
    fn polynomial_forcing() {
        // y'' - 3y' + 2y = 4x  =>  y_p = 2x + 3
        let mut ws = Workspace::new(2, SolverConfig::default());
        let forcing = mul(int(4), Expr::var("x"));
        let solution = solve(&ints(&[2, -3, 1]), &forcing, "x", "y", &mut ws).unwrap();
        let particular = substitute_many(
            &solution.rhs,
            &[("C1".to_string(), expr::zero()), ("C2".to_string(), expr::zero())],
        );
        let expected = add(mul(int(2), Expr::var("x")), int(3));
        assert!(equivalent(&particular, &expected).unwrap());
    }

    #[test]
    fn resonant_exponential_gains_a_factor_of_x() {
        // y'' - y = e^x  =>  y_p = x e^x / 2
        let mut ws = Workspace::new(2, SolverConfig::default());
        let x = Expr::var("x");
        let solution = solve(&ints(&[-1, 0, 1]), &exp(x.clone()), "x", "y", &mut ws).unwrap();
        let particular = substitute_many(
            &solution.rhs,
            &[("C1".to_string(), expr::zero()), ("C2".to_string(), expr::zero())],
        );
        let expected = mul(Expr::constant(1, 2), mul(x.clone(), exp(x)));
        assert!(equivalent(&particular, &expected).unwrap());
    }

    #[test]
    fn resonance_counts_repeated_roots() {
        let poly = Poly::from_coeffs(ints(&[1, -2, 1]));
        let family = Family {
            rate: Rational::one(),
            frequency: Rational::zero(),
            degree: 0,
        };
        assert_eq!(resonance(&poly, &family), 2);
    }
}

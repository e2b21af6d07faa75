use crate::error::{Result, SolveError};
use crate::expr::{add, cos, exp, int, mul, pow, sin, Expr, Rational};
use crate::factor::{roots, Root};
use crate::format::latex;
use crate::polynomial::Poly;
use crate::simplify::normalize;
use crate::steps::Math;

use super::{Solution, Workspace};

/// `a_n y^(n) + ... + a_0 y = 0` via the roots of the characteristic polynomial.
pub(super) fn solve(coeffs: &[Rational], x: &str, y: &str, ws: &mut Workspace) -> Result<Solution> {
    let yc = complementary(coeffs, x, ws)?;
    ws.trace.push(
        "Assemble the general solution",
        "Each root contributes one independent solution per unit of multiplicity.",
        Math::Equation(Expr::var(y), yc.clone()),
    );
    Ok(Solution {
        lhs: Expr::var(y),
        rhs: yc,
        constants: ws.constants.used(),
    })
}

/// General solution of the homogeneous equation, with its characteristic-equation steps.
pub(super) fn complementary(coeffs: &[Rational], x: &str, ws: &mut Workspace) -> Result<Expr> {
    let poly = Poly::from_coeffs(coeffs.to_vec());
    ws.trace.push(
        "Characteristic equation",
        format!("Trying e^(r{x}) turns the equation into a polynomial in r."),
        Math::Equation(poly.to_expr("r"), crate::expr::zero()),
    );

    let roots = roots(&poly).ok_or_else(|| {
        SolveError::unsolvable(format!(
            "the characteristic polynomial {} has no roots in closed form",
            poly.to_expr("r")
        ))
    })?;
    tracing::debug!(target: "solver", count = roots.len(), "characteristic roots");
    ws.trace.push(
        "Find the roots",
        describe(&roots),
        Math::Latex(
            roots
                .iter()
                .map(root_latex)
                .collect::<Vec<_>>()
                .join(",\\quad "),
        ),
    );

    let mut solution: Option<Expr> = None;
    for root in &roots {
        for factors in basis(root, x) {
            let term = factors
                .into_iter()
                .fold(ws.constants.fresh()?, mul);
            solution = Some(match solution {
                Some(acc) => add(acc, term),
                None => term,
            });
        }
    }
    solution.ok_or_else(|| SolveError::invariant("characteristic polynomial without roots"))
}

fn describe(roots: &[Root]) -> String {
    let repeated = roots.iter().any(|r| r.multiplicity() > 1);
    let complex = roots.iter().any(|r| matches!(r, Root::Complex { .. }));
    match (repeated, complex) {
        (false, false) => "The roots are real and distinct.".to_string(),
        (true, false) => "A repeated root r contributes e^(rx), x e^(rx), ...".to_string(),
        (_, true) => {
            "A complex pair a ± bi contributes e^(ax) cos(bx) and e^(ax) sin(bx).".to_string()
        }
    }
}

fn root_latex(root: &Root) -> String {
    let (body, multiplicity) = match root {
        Root::Real {
            value,
            multiplicity,
        } => (format!("r = {}", latex(value)), *multiplicity),
        Root::Complex {
            re,
            im,
            multiplicity,
        } => {
            let im = if im.is_one() {
                "i".to_string()
            } else {
                format!("{} i", latex(im))
            };
            let body = if re.is_zero() {
                format!("r = \\pm {im}")
            } else {
                format!("r = {} \\pm {im}", latex(re))
            };
            (body, *multiplicity)
        }
    };
    if multiplicity > 1 {
        format!("{body} \\text{{ (multiplicity {multiplicity})}}")
    } else {
        body
    }
}

/// Non-constant factors of each basis function a root contributes.
fn basis(root: &Root, x: &str) -> Vec<Vec<Expr>> {
    let var = Expr::var(x);
    let power = |j: usize| -> Option<Expr> {
        match j {
            0 => None,
            1 => Some(var.clone()),
            _ => Some(pow(var.clone(), int(j as i64))),
        }
    };
    let growth = |rate: &Expr| -> Option<Expr> {
        if rate.is_zero() {
            None
        } else {
            Some(exp(normalize(mul(rate.clone(), var.clone()))))
        }
    };

    let mut out = Vec::new();
    match root {
        Root::Real {
            value,
            multiplicity,
        } => {
            for j in 0..*multiplicity {
                out.push(power(j).into_iter().chain(growth(value)).collect());
            }
        }
        Root::Complex {
            re,
            im,
            multiplicity,
        } => {
            let angle = normalize(mul(im.clone(), var.clone()));
            for j in 0..*multiplicity {
                for wave in [cos(angle.clone()), sin(angle.clone())] {
                    out.push(
                        power(j)
                            .into_iter()
                            .chain(growth(re))
                            .chain(std::iter::once(wave))
                            .collect(),
                    );
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::expr::rational;
    use crate::simplify::equivalent;

    fn run(coeffs: &[i64]) -> Expr {
        let coeffs: Vec<Rational> = coeffs.iter().map(|&c| rational(c, 1)).collect();
        let mut ws = Workspace::new((coeffs.len() - 1) as u32, SolverConfig::default());
        solve(&coeffs, "x", "y", &mut ws).unwrap().rhs
    }

    #[test]
    fn distinct_real_roots() {
        // y'' - 3y' + 2y = 0
        let rhs = run(&[2, -3, 1]);
        let x = Expr::var("x");
        let expected = add(
            mul(Expr::var("C1"), exp(mul(int(2), x.clone()))),
            mul(Expr::var("C2"), exp(x)),
        );
        assert!(equivalent(&rhs, &expected).unwrap());
    }

    #[test]
    fn repeated_root_gains_a_power_of_x() {
        // y'' - 2y' + y = 0
        let rhs = run(&[1, -2, 1]);
        let x = Expr::var("x");
        let expected = add(
            mul(Expr::var("C1"), exp(x.clone())),
            mul(mul(Expr::var("C2"), x.clone()), exp(x)),
        );
        assert!(equivalent(&rhs, &expected).unwrap());
    }

    #[test]
    fn complex_pair_oscillates() {
        // y'' + 4y = 0
        let rhs = run(&[4, 0, 1]);
        let two_x = mul(int(2), Expr::var("x"));
        let expected = add(
            mul(Expr::var("C1"), cos(two_x.clone())),
            mul(Expr::var("C2"), sin(two_x)),
        );
        assert!(equivalent(&rhs, &expected).unwrap());
        assert!(latex(&rhs).starts_with("C_{1} \\cos"));
    }
}

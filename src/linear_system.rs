//! Exact Gaussian elimination for the small linear systems that come up while solving:
//! undetermined coefficients, partial fraction numerators and integration constants.

use crate::error::{Result, SolveError};
use crate::expr::{div, mul, sub, Expr, Rational};
use crate::simplify::{collect_powers, is_zero, normalize};
use num_traits::{One, Signed, Zero};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearResult {
    Unique(Vec<Expr>),
    /// Pivot unknowns written in terms of the free ones; free unknowns map to themselves.
    Underdetermined { values: Vec<Expr>, free: Vec<String> },
    Inconsistent,
}

/// Arithmetic needed by row reduction.
trait Field: Clone {
    fn is_zero(&self) -> bool;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    fn div(&self, other: &Self) -> Self;
    /// Preference when choosing a pivot; larger is better.
    fn weight(&self) -> Rational;
    fn to_expr(&self) -> Expr;
}

impl Field for Rational {
    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul(&self, other: &Self) -> Self {
        self * other
    }

    fn div(&self, other: &Self) -> Self {
        self / other
    }

    fn weight(&self) -> Rational {
        self.abs()
    }

    fn to_expr(&self) -> Expr {
        Expr::Constant(self.clone())
    }
}

impl Field for Expr {
    fn is_zero(&self) -> bool {
        Expr::is_zero(self) || is_zero(self).unwrap_or(false)
    }

    fn sub(&self, other: &Self) -> Self {
        normalize(sub(self.clone(), other.clone()))
    }

    fn mul(&self, other: &Self) -> Self {
        normalize(mul(self.clone(), other.clone()))
    }

    fn div(&self, other: &Self) -> Self {
        normalize(div(self.clone(), other.clone()))
    }

    // Symbolic entries: prefer plain numbers, then smaller trees.
    fn weight(&self) -> Rational {
        match self {
            Expr::Constant(c) => c.abs() + Rational::from_integer(1_000_000.into()),
            other => Rational::new(1.into(), (other.size() as i64).into()),
        }
    }

    fn to_expr(&self) -> Expr {
        self.clone()
    }
}

struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Field> Matrix<T> {
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for offset in 0..self.cols {
            self.data.swap(a * self.cols + offset, b * self.cols + offset);
        }
    }

    /// Reduced row echelon form; returns the pivot columns.
    fn rref(&mut self, n_vars: usize) -> Vec<usize> {
        let mut pivots = Vec::new();
        let mut row = 0;
        for col in 0..n_vars {
            if row >= self.rows {
                break;
            }
            let pivot_row = (row..self.rows)
                .filter(|r| !self.get(*r, col).is_zero())
                .max_by(|a, b| self.get(*a, col).weight().cmp(&self.get(*b, col).weight()));
            let Some(pivot_idx) = pivot_row else {
                continue;
            };
            self.swap_rows(row, pivot_idx);

            let pivot_value = self.get(row, col).clone();
            for c in col..self.cols {
                let idx = row * self.cols + c;
                self.data[idx] = self.data[idx].div(&pivot_value);
            }
            for r in 0..self.rows {
                if r == row {
                    continue;
                }
                let factor = self.get(r, col).clone();
                if factor.is_zero() {
                    continue;
                }
                for c in col..self.cols {
                    let scaled = factor.mul(self.get(row, c));
                    let idx = r * self.cols + c;
                    self.data[idx] = self.data[idx].sub(&scaled);
                }
            }
            pivots.push(col);
            row += 1;
        }
        pivots
    }

    fn solve(mut self, unknowns: &[String]) -> LinearResult {
        let n_vars = unknowns.len();
        let pivots = self.rref(n_vars);
        let rank = pivots.len();
        for r in rank..self.rows {
            if !self.get(r, n_vars).is_zero() {
                return LinearResult::Inconsistent;
            }
        }
        let free: Vec<usize> = (0..n_vars).filter(|c| !pivots.contains(c)).collect();
        let mut values: Vec<Expr> = unknowns.iter().map(Expr::var).collect();
        for (row, &col) in pivots.iter().enumerate() {
            let mut value = self.get(row, n_vars).to_expr();
            for &f in &free {
                let coeff = self.get(row, f);
                if !coeff.is_zero() {
                    value = sub(value, mul(coeff.to_expr(), Expr::var(&unknowns[f])));
                }
            }
            values[col] = normalize(value);
        }
        if free.is_empty() {
            LinearResult::Unique(values)
        } else {
            LinearResult::Underdetermined {
                values,
                free: free.iter().map(|&f| unknowns[f].clone()).collect(),
            }
        }
    }
}

/// Coefficients of each unknown and the constant term of `expr`, which must be linear in them.
fn decompose_linear(expr: &Expr, unknowns: &[String]) -> Result<(Vec<Expr>, Expr)> {
    let mut rest = normalize(expr.clone());
    let mut coeffs = Vec::with_capacity(unknowns.len());
    for unknown in unknowns {
        let powers = collect_powers(&rest, unknown)?.ok_or_else(|| {
            SolveError::unsolvable(format!("{unknown} enters {expr} non-linearly"))
        })?;
        let one = Rational::one();
        let zero = Rational::zero();
        if powers.keys().any(|k| *k != one && *k != zero) {
            return Err(SolveError::unsolvable(format!(
                "{unknown} enters {expr} non-linearly"
            )));
        }
        let coeff = powers.get(&one).cloned().unwrap_or_else(crate::expr::zero);
        if unknowns.iter().any(|u| coeff.contains_var(u)) {
            return Err(SolveError::unsolvable(format!(
                "{expr} is not linear in the unknowns"
            )));
        }
        coeffs.push(coeff);
        rest = powers.get(&zero).cloned().unwrap_or_else(crate::expr::zero);
    }
    Ok((coeffs, rest))
}

/// Solves `equations[i] = 0` for `unknowns`.
pub fn solve_linear(unknowns: &[String], equations: &[Expr]) -> Result<LinearResult> {
    let mut rows = Vec::with_capacity(equations.len());
    for eq in equations {
        rows.push(decompose_linear(eq, unknowns)?);
    }
    let cols = unknowns.len() + 1;
    let numeric: Option<Vec<Rational>> = rows
        .iter()
        .flat_map(|(coeffs, constant)| {
            coeffs
                .iter()
                .map(|c| c.as_constant().cloned())
                .chain(std::iter::once(constant.as_constant().map(|c| -c.clone())))
        })
        .collect();
    let result = match numeric {
        Some(data) => Matrix {
            rows: rows.len(),
            cols,
            data,
        }
        .solve(unknowns),
        None => {
            let data = rows
                .into_iter()
                .flat_map(|(coeffs, constant)| {
                    coeffs
                        .into_iter()
                        .chain(std::iter::once(normalize(crate::expr::neg(constant))))
                })
                .collect();
            Matrix {
                rows: equations.len(),
                cols,
                data,
            }
            .solve(unknowns)
        }
    };
    tracing::trace!(target: "solver", unknowns = unknowns.len(), ?result, "linear system solved");
    Ok(result)
}

/// Solves a square rational system `matrix * x = rhs`.
pub fn solve_rational(matrix: Vec<Vec<Rational>>, rhs: Vec<Rational>) -> Option<Vec<Rational>> {
    let n_vars = matrix.first().map_or(0, Vec::len);
    let rows = matrix.len();
    let data = matrix
        .into_iter()
        .zip(rhs)
        .flat_map(|(row, b)| row.into_iter().chain(std::iter::once(b)))
        .collect();
    let mut m = Matrix {
        rows,
        cols: n_vars + 1,
        data,
    };
    let pivots = m.rref(n_vars);
    if pivots.len() != n_vars || (n_vars..rows).any(|r| !Field::is_zero(m.get(r, n_vars))) {
        return None;
    }
    Some((0..n_vars).map(|r| m.get(r, n_vars).clone()).collect())
}

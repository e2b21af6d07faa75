//! Symbolic solver for ordinary differential equations: parses an equation, decides which
//! classical method applies, and solves it with a LaTeX derivation for every step.

pub mod api;
pub mod calculus;
pub mod config;
pub mod equation;
pub mod error;
pub mod expr;
pub mod factor;
pub mod format;
pub mod linear_system;
pub mod ode;
pub mod parser;
pub mod polynomial;
pub mod simplify;
pub mod solve;
pub mod steps;

pub use calculus::{antiderivative, differentiate, integrate, IntegrationResult};
pub use config::{ConfigError, SolverConfig};
pub use equation::{DifferentialForm, Equation, InitialCondition};
pub use error::{Result, SolveError};
pub use expr::{add, div, mul, neg, one, pow, rational, sub, zero, Expr, Rational};
pub use format::{latex, pretty, solve_summary};
pub use ode::{classify, detect, verify, Classification, EquationClass, Shape, Solution};
pub use parser::{parse_equation, parse_expr, Grammar};
pub use simplify::{normalize, simplify, simplify_fully, simplify_with_limit, substitute};
pub use solve::{solve, solve_auto, SolutionResult, Solver};
pub use steps::{Math, Step};

//! Plain-text and LaTeX rendering of expressions and solutions.

pub mod expr;
pub mod latex;
mod summary;

pub use expr::pretty;
pub use latex::{equation, integral, latex};
pub use summary::solve_summary;

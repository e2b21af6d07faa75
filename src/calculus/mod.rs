//! Calculus routines (differentiation and integration).

pub mod differentiate;
pub mod integrate;

pub use differentiate::{differentiate, total_derivative};
pub use integrate::{
    antiderivative, integrate, AttemptStatus, IntegrandKind, IntegrandReport, IntegrationAttempt,
    IntegrationResult, NonElementaryKind, ReasonCode, Strategy,
};

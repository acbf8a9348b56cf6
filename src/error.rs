//! Error types for optimization operations

use thiserror::Error;

/// Errors that can occur during layout optimization
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Design failed structural validation
    #[error("invalid design: {0}")]
    InvalidDesign(String),

    /// Caller requested an optimization type the engine does not know
    #[error("unsupported optimization type: {0}")]
    UnsupportedOptimizationType(String),

    /// Iteration budget exhausted without reaching a stable result
    #[error("algorithm failed to converge: {0}")]
    NonConvergence(String),

    /// Wall-clock timeout or cancellation hit before completion
    #[error("optimization budget exceeded: {0}")]
    BudgetExceeded(String),

    /// Unexpected algorithm failure
    #[error("internal fault: {0}")]
    InternalFault(String),
}

impl OptimizeError {
    /// Short machine-readable tag for the error class
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizeError::InvalidDesign(_) => "invalid_design",
            OptimizeError::UnsupportedOptimizationType(_) => "unsupported_optimization_type",
            OptimizeError::NonConvergence(_) => "non_convergence",
            OptimizeError::BudgetExceeded(_) => "budget_exceeded",
            OptimizeError::InternalFault(_) => "internal_fault",
        }
    }
}

/// Result type for optimization operations
pub type Result<T> = std::result::Result<T, OptimizeError>;

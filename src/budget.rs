//! Iteration budgets and cooperative cancellation
//!
//! Long-running algorithms check a [`Budget`] at iteration boundaries so a
//! timeout or an external cancellation yields a structured error instead of
//! hanging.

use crate::error::{OptimizeError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag
///
/// Cloning yields a handle to the same flag; any clone can cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Wall-clock deadline plus cancellation, checked at iteration boundaries
#[derive(Debug, Clone)]
pub struct Budget {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Budget {
    /// Create a budget with an optional timeout counted from now
    pub fn new(timeout: Option<Duration>, cancel: CancelToken) -> Self {
        Self {
            deadline: timeout.map(|t| Instant::now() + t),
            cancel,
        }
    }

    /// Budget without timeout or cancellation, for callers that only rely on
    /// iteration counts
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            cancel: CancelToken::new(),
        }
    }

    /// Check the budget; errors with `BudgetExceeded` when blown
    pub fn check(&self, what: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(OptimizeError::BudgetExceeded(format!("{what}: cancelled")));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(OptimizeError::BudgetExceeded(format!(
                    "{what}: wall-clock timeout"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_budget_never_trips() {
        let budget = Budget::unbounded();
        for _ in 0..100 {
            assert!(budget.check("test").is_ok());
        }
    }

    #[test]
    fn cancelled_token_trips_budget() {
        let token = CancelToken::new();
        let budget = Budget::new(None, token.clone());
        assert!(budget.check("test").is_ok());
        token.cancel();
        let err = budget.check("test").unwrap_err();
        assert_eq!(err.kind(), "budget_exceeded");
    }

    #[test]
    fn zero_timeout_trips_budget() {
        let budget = Budget::new(Some(Duration::from_secs(0)), CancelToken::new());
        let err = budget.check("test").unwrap_err();
        assert_eq!(err.kind(), "budget_exceeded");
    }
}

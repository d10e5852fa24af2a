use crate::error::{ConvertError, Result};
use std::time::{Duration, Instant};

/// Wall-clock budget for one conversion request.
///
/// Kernel calls cannot be interrupted mid-flight, so the deadline is checked
/// around each call and between per-path iterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self { expires_at: None }
    }

    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::after).unwrap_or_default()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| Instant::now() >= at)
            .unwrap_or(false)
    }

    /// Fail with [`ConvertError::Timeout`] naming `stage` once expired.
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_expired() {
            tracing::warn!(stage, "deadline expired");
            return Err(ConvertError::Timeout { stage });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_deadline_never_expires() {
        assert!(Deadline::none().check("union").is_ok());
        assert!(Deadline::from_timeout(None).check("union").is_ok());
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let deadline = Deadline::after(Duration::ZERO);
        match deadline.check("offset") {
            Err(ConvertError::Timeout { stage }) => assert_eq!(stage, "offset"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn generous_budget_is_not_expired() {
        let deadline = Deadline::after(Duration::from_secs(3600));
        assert!(!deadline.is_expired());
    }
}

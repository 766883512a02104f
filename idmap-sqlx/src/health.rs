//! Bounded-time liveness probe.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{HealthCheckError, ProbeFailure};

/// Fixed probe timeout.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can prove the database is reachable.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run one liveness round-trip.
    async fn probe(&self) -> Result<(), sqlx::Error>;
}

/// Runs a single probe under a timeout. Never retries.
#[derive(Debug, Clone, Copy)]
pub struct HealthChecker {
    timeout: Duration,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self {
            timeout: PING_TIMEOUT,
        }
    }
}

impl HealthChecker {
    /// Create a checker with the standard 5 second timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe the target, returning how long the round-trip took.
    pub async fn ping(&self, target: &dyn Probe) -> Result<Duration, HealthCheckError> {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, target.probe()).await {
            Ok(Ok(())) => Ok(start.elapsed()),
            Ok(Err(e)) => Err(HealthCheckError {
                elapsed: start.elapsed(),
                cause: ProbeFailure::Driver(e),
            }),
            Err(_) => Err(HealthCheckError {
                elapsed: start.elapsed(),
                cause: ProbeFailure::Timeout(self.timeout),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Scripted probe outcome.
    pub(crate) enum Outcome {
        Healthy,
        Hang,
        Refused,
    }

    pub(crate) struct ScriptedProbe {
        pub(crate) outcome: Outcome,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedProbe {
        pub(crate) fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn probe(&self) -> Result<(), sqlx::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Healthy => Ok(()),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
                Outcome::Refused => Err(sqlx::Error::PoolTimedOut),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Outcome, ScriptedProbe};
    use super::*;

    #[tokio::test]
    async fn test_healthy_probe() {
        let probe = ScriptedProbe::new(Outcome::Healthy);
        let elapsed = HealthChecker::new().ping(&probe).await.unwrap();
        assert!(elapsed < PING_TIMEOUT);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_times_out_after_five_seconds() {
        let probe = ScriptedProbe::new(Outcome::Hang);
        let err = HealthChecker::new().ping(&probe).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(err.elapsed >= PING_TIMEOUT - Duration::from_millis(10));
        assert!(err.elapsed < PING_TIMEOUT + Duration::from_secs(1));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_driver_failure_is_not_retried() {
        let probe = ScriptedProbe::new(Outcome::Refused);
        let err = HealthChecker::new().ping(&probe).await.unwrap_err();

        assert!(matches!(err.cause, ProbeFailure::Driver(sqlx::Error::PoolTimedOut)));
        assert_eq!(probe.calls(), 1);
    }

    #[test]
    fn test_custom_timeout() {
        let checker = HealthChecker::new().with_timeout(Duration::from_millis(250));
        assert_eq!(checker.timeout(), Duration::from_millis(250));
        assert_eq!(HealthChecker::default().timeout(), PING_TIMEOUT);
    }
}

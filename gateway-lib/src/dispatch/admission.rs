use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::error::{GatewayError, Result};
use crate::telemetry::Metrics;

const BUSY_WAIT: Duration = Duration::from_millis(100);

/// Admission gate over the configured concurrency limit. Mirrors the
/// connection-guard idiom: acquiring returns an RAII guard that releases
/// the permit when the caller's request scope ends, regardless of how it
/// ends.
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    metrics: Arc<Metrics>,
}

pub struct AdmissionGuard {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(concurrency: usize, metrics: Arc<Metrics>) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(concurrency.max(1))), metrics }
    }

    /// Tries a non-blocking acquire first; on contention, waits up to
    /// 100ms before giving up with `ServerBusy`.
    pub async fn acquire(&self) -> Result<AdmissionGuard> {
        let started = Instant::now();

        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            self.metrics.admission_wait_seconds.record(started.elapsed().as_secs_f64(), &[]);
            return Ok(AdmissionGuard { _permit: permit });
        }

        let outcome = tokio::time::timeout(BUSY_WAIT, self.semaphore.clone().acquire_owned()).await;
        self.metrics.admission_wait_seconds.record(started.elapsed().as_secs_f64(), &[]);
        match outcome {
            Ok(Ok(permit)) => Ok(AdmissionGuard { _permit: permit }),
            Ok(Err(_)) => {
                self.metrics.admission_busy_total.add(1, &[]);
                Err(GatewayError::ServerBusy)
            }
            Err(_) => {
                self.metrics.admission_busy_total.add(1, &[]);
                Err(GatewayError::ServerBusy)
            }
        }
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_metrics() -> Arc<Metrics> {
        crate::telemetry::init_metrics().unwrap().0
    }

    #[tokio::test]
    async fn acquires_up_to_capacity_then_reports_busy() {
        let gate = AdmissionGate::new(1, test_metrics());
        let first = gate.acquire().await.unwrap();
        let second = gate.acquire().await;
        assert!(matches!(second, Err(GatewayError::ServerBusy)));
        drop(first);
        assert!(gate.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn releasing_a_guard_frees_the_permit() {
        let gate = AdmissionGate::new(2, test_metrics());
        assert_eq!(gate.available_permits(), 2);
        let guard = gate.acquire().await.unwrap();
        assert_eq!(gate.available_permits(), 1);
        drop(guard);
        assert_eq!(gate.available_permits(), 2);
    }
}

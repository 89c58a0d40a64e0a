//! Host loop: samples process-host capacity into `host:resources` on an
//! interval. The utilization limits stored in the record survive every
//! refresh; only the explicit limits update operation changes them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use shared::models::{
    DEFAULT_CPU_LIMIT_PERCENT, DEFAULT_MEMORY_LIMIT_PERCENT, HostResource,
};
use sysinfo::System;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::errors::ApiError;
use crate::state::{Fleet, State};

use super::ERROR_BACKOFF;

/// One reading of the process host.
pub struct HostSample {
    pub cpu_count: u32,
    pub memory_total: u64,
    pub memory_available: u64,
}

/// Source of host readings, separated from the loop so tests can feed a
/// fixed sample.
pub trait HostSampler: Send + Sync {
    fn sample(&self) -> HostSample;
}

pub struct SysinfoSampler {
    system: Mutex<System>,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl HostSampler for SysinfoSampler {
    fn sample(&self) -> HostSample {
        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_all();
        HostSample {
            cpu_count: system.cpus().len() as u32,
            memory_total: system.total_memory(),
            memory_available: system.available_memory(),
        }
    }
}

pub(super) async fn run(
    state: State,
    sampler: Arc<dyn HostSampler>,
    interval: Duration,
    token: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Starting host monitor");
    let mut ticker = time::interval(interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Host monitor stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = tick(&state, sampler.as_ref()).await {
                    tracing::error!(error=%err, "Host monitor iteration failed");
                    time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }
}

/// Writes a fresh host record, carrying the stored limits forward.
pub(crate) async fn tick(state: &Fleet, sampler: &dyn HostSampler) -> Result<(), ApiError> {
    let sample = sampler.sample();
    let (cpu_limit_percent, memory_limit_percent) = match state.store.get_host().await? {
        Some(previous) => (previous.cpu_limit_percent, previous.memory_limit_percent),
        None => (DEFAULT_CPU_LIMIT_PERCENT, DEFAULT_MEMORY_LIMIT_PERCENT),
    };

    state
        .store
        .put_host(&HostResource {
            cpu_count: sample.cpu_count,
            memory_total: sample.memory_total,
            memory_available: sample.memory_available,
            cpu_limit_percent,
            memory_limit_percent,
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    //! - test_first_sample_uses_default_limits
    //! - test_refresh_preserves_stored_limits

    use super::*;
    use crate::runtime::test_runtime::TestRuntime;
    use crate::state::new_state;
    use crate::store::test_store::TestStore;

    struct FixedSampler;

    impl HostSampler for FixedSampler {
        fn sample(&self) -> HostSample {
            HostSample {
                cpu_count: 8,
                memory_total: 16 * 1024 * 1024 * 1024,
                memory_available: 4 * 1024 * 1024 * 1024,
            }
        }
    }

    #[tokio::test]
    async fn test_first_sample_uses_default_limits() {
        let state = new_state(
            Arc::new(TestStore::new()),
            Arc::new(TestRuntime::new()),
        );

        tick(&state, &FixedSampler).await.unwrap();

        let host = state.store.get_host().await.unwrap().unwrap();
        assert_eq!(host.cpu_count, 8);
        assert_eq!(host.cpu_limit_percent, 50.0);
        assert_eq!(host.memory_limit_percent, 90.0);
    }

    #[tokio::test]
    async fn test_refresh_preserves_stored_limits() {
        let state = new_state(
            Arc::new(TestStore::new()),
            Arc::new(TestRuntime::new()),
        );

        tick(&state, &FixedSampler).await.unwrap();
        let mut host = state.store.get_host().await.unwrap().unwrap();
        host.cpu_limit_percent = 40.0;
        host.memory_limit_percent = 60.0;
        state.store.put_host(&host).await.unwrap();

        tick(&state, &FixedSampler).await.unwrap();
        let refreshed = state.store.get_host().await.unwrap().unwrap();
        assert_eq!(refreshed.cpu_limit_percent, 40.0);
        assert_eq!(refreshed.memory_limit_percent, 60.0);
    }
}

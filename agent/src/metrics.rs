//! Metric collection for the heartbeat payload.
//!
//! Readings come from the in-container view of the system, which on most
//! runtimes is the host's. When the runtime driver handed us the pinned
//! allocation via environment, those values win; the control plane clamps
//! whatever we send anyway.

use std::sync::Mutex;

use shared::models::NodeResources;
use sysinfo::System;

pub struct Collector {
    system: Mutex<System>,
    cpu_override: Option<u32>,
    memory_override_mb: Option<u64>,
}

impl Collector {
    pub fn new(cpu_override: Option<u32>, memory_override_mb: Option<u64>) -> Self {
        Self {
            system: Mutex::new(System::new()),
            cpu_override,
            memory_override_mb,
        }
    }

    pub fn collect(&self) -> NodeResources {
        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_all();

        let cpu_count = self
            .cpu_override
            .unwrap_or(system.cpus().len() as u32);
        let memory_total = self
            .memory_override_mb
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or_else(|| system.total_memory());
        let memory_available = system.available_memory().min(memory_total);

        NodeResources {
            cpu_count,
            memory_total,
            memory_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_sampling() {
        let collector = Collector::new(Some(2), Some(512));
        let resources = collector.collect();
        assert_eq!(resources.cpu_count, 2);
        assert_eq!(resources.memory_total, 512 * 1024 * 1024);
        assert!(resources.memory_available <= resources.memory_total);
    }

    #[test]
    fn sampled_availability_never_exceeds_total() {
        let collector = Collector::new(None, None);
        let resources = collector.collect();
        assert!(resources.cpu_count > 0);
        assert!(resources.memory_available <= resources.memory_total);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::errors::RuntimeError;
use super::{NodeProvision, NodeRuntime};

/// Canned `NodeRuntime` used by unit tests. When `fail` is set every call
/// errors, so callers can assert that no partial records are written.
pub struct TestRuntime {
    pub fail: bool,
    created: AtomicUsize,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self {
            fail: false,
            created: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            created: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NodeRuntime for TestRuntime {
    async fn create_node(
        &self,
        _cpu_count: u32,
        _memory_mb: Option<u64>,
    ) -> Result<NodeProvision, RuntimeError> {
        if self.fail {
            return Err(RuntimeError::ContainerCreationError(
                "runtime refused".to_string(),
            ));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(NodeProvision {
            container_id: format!("test-container-{}", n),
            hostname: format!("fleet-node-{}", n),
            address: format!("172.20.0.{}", n + 2),
        })
    }

    async fn stop_node(&self, container_id: &str) -> Result<(), RuntimeError> {
        if self.fail {
            return Err(RuntimeError::ContainerStopError(container_id.to_string()));
        }
        Ok(())
    }

    async fn restart_node(&self, container_id: &str) -> Result<(), RuntimeError> {
        if self.fail {
            return Err(RuntimeError::ContainerRestartError(
                container_id.to_string(),
            ));
        }
        Ok(())
    }

    async fn delete_node(&self, container_id: &str) -> Result<(), RuntimeError> {
        if self.fail {
            return Err(RuntimeError::ContainerRemovalError(
                container_id.to_string(),
            ));
        }
        Ok(())
    }
}

mod docker;
mod errors;
#[cfg(test)]
pub mod test_runtime;

use async_trait::async_trait;
pub use docker::DockerRuntime;
pub use errors::RuntimeError;

/// Identifiers reported by the runtime driver for a freshly created worker.
#[derive(Debug, Clone)]
pub struct NodeProvision {
    pub container_id: String,
    pub hostname: String,
    pub address: String,
}

/// A trait for the container operations the node manager needs.
#[async_trait]
pub trait NodeRuntime: Send + Sync {
    /// Create and start a worker container with pinned cpu/memory limits.
    async fn create_node(
        &self,
        cpu_count: u32,
        memory_mb: Option<u64>,
    ) -> Result<NodeProvision, RuntimeError>;

    async fn stop_node(&self, container_id: &str) -> Result<(), RuntimeError>;

    async fn restart_node(&self, container_id: &str) -> Result<(), RuntimeError>;

    /// Force-remove the worker container.
    async fn delete_node(&self, container_id: &str) -> Result<(), RuntimeError>;
}

//! # Docker Runtime
//!
//! Provides an abstraction over the Docker API to provision worker containers.
//! Implements the `NodeRuntime` trait: workers are created with pinned
//! nano-CPU and memory limits and carry the agent environment so the
//! in-container heartbeat client can find the control plane.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use bollard::{
    Docker,
    query_parameters::{
        CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
        RestartContainerOptions, StartContainerOptions, StopContainerOptions,
    },
    secret::{ContainerCreateBody, HostConfig},
};
use uuid::Uuid;

use super::errors::RuntimeError;
use super::{NodeProvision, NodeRuntime};

const DEFAULT_NODE_IMAGE: &str = "fleet-agent:latest";
const DEFAULT_NODE_API_URL: &str = "http://host.docker.internal:8000";

/// Drives worker containers through the bollard docker client.
#[derive(Debug)]
pub struct DockerRuntime {
    client: Docker,
    image: String,
    api_url: String,
}

impl DockerRuntime {
    const OP_TIMEOUT: Duration = Duration::from_secs(5);

    /// Initialize a new `DockerRuntime` using local Docker defaults.
    ///
    /// `NODE_IMAGE` selects the worker image (must be present locally) and
    /// `NODE_API_URL` is the control-plane address handed to the agent.
    pub fn start() -> Result<Self, RuntimeError> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::ConnectionError(e.to_string()))?;

        Ok(DockerRuntime {
            client,
            image: env::var("NODE_IMAGE").unwrap_or_else(|_| DEFAULT_NODE_IMAGE.to_string()),
            api_url: env::var("NODE_API_URL")
                .unwrap_or_else(|_| DEFAULT_NODE_API_URL.to_string()),
        })
    }

    /// Clone-safe getter for the internal Docker client.
    fn client(&self) -> Docker {
        self.client.clone()
    }
}

#[async_trait]
impl NodeRuntime for DockerRuntime {
    async fn create_node(
        &self,
        cpu_count: u32,
        memory_mb: Option<u64>,
    ) -> Result<NodeProvision, RuntimeError> {
        let docker = self.client();

        let suffix = Uuid::new_v4().to_string();
        let name = format!("fleet-node-{}", &suffix[..8]);

        let nano_cpus = cpu_count as i64 * 1_000_000_000;
        let memory_bytes = memory_mb.map(|mb| (mb * 1024 * 1024) as i64);

        let mut environment = vec![
            format!("NODE_ID={}", name),
            format!("API_URL={}", self.api_url),
            format!("NODE_CPU_COUNT={}", cpu_count),
        ];
        if let Some(mb) = memory_mb {
            environment.push(format!("NODE_MEMORY_MB={}", mb));
        }

        let config = ContainerCreateBody {
            image: Some(self.image.clone()),
            env: Some(environment),
            host_config: Some(HostConfig {
                nano_cpus: Some(nano_cpus),
                memory: memory_bytes,
                // same value disables swap
                memory_swap: memory_bytes,
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = Some(CreateContainerOptions {
            name: Some(name.clone()),
            platform: "linux/amd64".to_string(),
        });

        let container_id = tokio::time::timeout(
            Self::OP_TIMEOUT,
            docker.create_container(options, config),
        )
        .await
        .map_err(|_| RuntimeError::Timeout(name.clone()))?
        .map_err(|e| RuntimeError::ContainerCreationError(e.to_string()))?
        .id;

        tokio::time::timeout(
            Self::OP_TIMEOUT,
            docker.start_container(&container_id, None::<StartContainerOptions>),
        )
        .await
        .map_err(|_| RuntimeError::Timeout(container_id.clone()))?
        .map_err(|e| RuntimeError::ContainerStartError(e.to_string()))?;

        let inspection = tokio::time::timeout(
            Self::OP_TIMEOUT,
            docker.inspect_container(&container_id, None::<InspectContainerOptions>),
        )
        .await
        .map_err(|_| RuntimeError::Timeout(container_id.clone()))?
        .map_err(|e| RuntimeError::ContainerInspectError(e.to_string()))?;

        let address = inspection
            .network_settings
            .and_then(|settings| settings.networks)
            .and_then(|networks| networks.into_values().next())
            .and_then(|endpoint| endpoint.ip_address)
            .unwrap_or_else(|| "unknown".to_string());

        tracing::info!(container=%short_id(&container_id), %name, %address, "Created worker container");

        Ok(NodeProvision {
            container_id,
            hostname: name,
            address,
        })
    }

    async fn stop_node(&self, container_id: &str) -> Result<(), RuntimeError> {
        let docker = self.client();
        tokio::time::timeout(
            Self::OP_TIMEOUT,
            docker.stop_container(container_id, None::<StopContainerOptions>),
        )
        .await
        .map_err(|_| RuntimeError::Timeout(container_id.to_string()))?
        .map_err(|e| {
            tracing::warn!(id=%short_id(container_id), error=%e, "Failed to stop container");
            RuntimeError::ContainerStopError(e.to_string())
        })
    }

    async fn restart_node(&self, container_id: &str) -> Result<(), RuntimeError> {
        let docker = self.client();
        tokio::time::timeout(
            Self::OP_TIMEOUT,
            docker.restart_container(container_id, None::<RestartContainerOptions>),
        )
        .await
        .map_err(|_| RuntimeError::Timeout(container_id.to_string()))?
        .map_err(|e| {
            tracing::warn!(id=%short_id(container_id), error=%e, "Failed to restart container");
            RuntimeError::ContainerRestartError(e.to_string())
        })
    }

    async fn delete_node(&self, container_id: &str) -> Result<(), RuntimeError> {
        let docker = self.client();
        let options = Some(RemoveContainerOptions {
            force: true,
            ..Default::default()
        });
        tokio::time::timeout(
            Self::OP_TIMEOUT,
            docker.remove_container(container_id, options),
        )
        .await
        .map_err(|_| RuntimeError::Timeout(container_id.to_string()))?
        .map_err(|e| {
            tracing::warn!(id=%short_id(container_id), error=%e, "Failed to remove container");
            RuntimeError::ContainerRemovalError(e.to_string())
        })?;
        tracing::debug!(id=%short_id(container_id), "Removed container");
        Ok(())
    }
}

fn short_id(id: &str) -> &str {
    id.get(0..8).unwrap_or(id)
}

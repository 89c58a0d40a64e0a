mod host;
mod node;
mod pod;

pub use host::{DEFAULT_CPU_LIMIT_PERCENT, DEFAULT_MEMORY_LIMIT_PERCENT, HostResource};
pub use node::{AllocatedResources, Node, NodeResources, NodeStatus};
pub use pod::{Pod, PodResources, PodStatus};

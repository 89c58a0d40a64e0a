use serde::{Deserialize, Serialize};

/// Process-host capacity and the utilization limits enforced by the cluster
/// monitor. The limits survive metric refreshes and change only through the
/// explicit limits update operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostResource {
    pub cpu_count: u32,
    pub memory_total: u64,
    pub memory_available: u64,
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit_percent: f64,
    #[serde(default = "default_memory_limit")]
    pub memory_limit_percent: f64,
}

pub const DEFAULT_CPU_LIMIT_PERCENT: f64 = 50.0;
pub const DEFAULT_MEMORY_LIMIT_PERCENT: f64 = 90.0;

fn default_cpu_limit() -> f64 {
    DEFAULT_CPU_LIMIT_PERCENT
}

fn default_memory_limit() -> f64 {
    DEFAULT_MEMORY_LIMIT_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_when_absent() {
        let host: HostResource = serde_json::from_str(
            r#"{"cpu_count": 8, "memory_total": 1024, "memory_available": 512}"#,
        )
        .unwrap();
        assert_eq!(host.cpu_limit_percent, 50.0);
        assert_eq!(host.memory_limit_percent, 90.0);
    }
}

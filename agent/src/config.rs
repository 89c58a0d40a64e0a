use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub node_id: String,
    pub interval: u64,
    pub cpu_count: Option<u32>,
    pub memory_mb: Option<u64>,
}

/// Loads agent configuration from environment variables.
///
/// `API_URL` and `NODE_ID` are injected by the runtime driver at container
/// creation and are required. `NODE_CPU_COUNT` / `NODE_MEMORY_MB` carry the
/// pinned allocation, which in-container sampling cannot see.
pub fn load_config() -> Config {
    let api_url = env::var("API_URL").expect("API_URL environment variable is required");

    let node_id = env::var("NODE_ID").expect("NODE_ID environment variable is required");

    let interval = env::var("HEARTBEAT_INTERVAL")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(30);

    let cpu_count = env::var("NODE_CPU_COUNT")
        .ok()
        .and_then(|s| s.parse::<u32>().ok());

    let memory_mb = env::var("NODE_MEMORY_MB")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());

    Config {
        api_url,
        node_id,
        interval,
        cpu_count,
        memory_mb,
    }
}

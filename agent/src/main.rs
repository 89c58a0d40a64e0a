//! fleet-agent entrypoint.
//! Runs inside a worker container: reports metrics on an interval and asks
//! the control plane to clean up on shutdown.

use std::time::Duration;

use tracing_subscriber::{self, EnvFilter};

mod config;
mod heartbeat;
mod metrics;

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fleetagt=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = config::load_config();
    let node_id = heartbeat::detect_container_id(&config.node_id);
    tracing::info!(%node_id, api_url=%config.api_url, "Initializing heartbeat agent");

    let collector = metrics::Collector::new(config.cpu_count, config.memory_mb);
    let client = heartbeat::HeartbeatClient::new(config.api_url.clone(), node_id);

    tokio::select! {
        _ = client.run(&collector, Duration::from_secs(config.interval)) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
            client.cleanup().await;
        }
    }
}

#[cfg(test)]
mod test_setup {
    use std::sync::Once;
    static INIT: Once = Once::new();

    #[ctor::ctor]
    fn init_tracing() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .init();
        });
    }
}

//! fleet-server entrypoint.
//! Starts the Actix-web apiserver and launches the host and cluster monitor
//! loops. On shutdown the loops are cancelled and joined, then offline-node
//! state is purged.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use tracing_subscriber::{self, EnvFilter};

mod endpoints;
mod errors;
mod fault;
mod manager;
mod monitor;
mod runtime;
mod scheduler;
mod state;
mod store;

use monitor::{Monitor, MonitorConfig, SysinfoSampler};
use runtime::DockerRuntime;
use state::new_state;
use store::RedisStore;

const DEFAULT_PORT: u16 = 8000;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("actix_server=warn,actix_web=warn,server=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env();
    let store = Arc::new(RedisStore::new().await);
    let runtime =
        Arc::new(DockerRuntime::start().expect("Failed to connect to container runtime"));
    let state = new_state(store, runtime);

    // Start background monitor loops
    let monitor = Monitor::start(
        state.clone(),
        Arc::new(SysinfoSampler::new()),
        config.monitor,
    );

    // Start apiserver
    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(endpoints::config)
            .route("/", web::get().to(root))
    })
    .bind(("0.0.0.0", config.port))?;

    server.run().await?;

    // Graceful stop: join the loops, then sweep offline-node state
    monitor.shutdown().await;
    if let Err(err) = state.faults.cleanup_stale_resources().await {
        tracing::error!(error=%err, "Stale resource cleanup failed");
    }
    Ok(())
}

async fn root() -> impl Responder {
    HttpResponse::Ok().body("Hello from fleet-server")
}

// ------------

struct Config {
    port: u16,
    monitor: MonitorConfig,
}

impl Config {
    fn from_env() -> Self {
        let defaults = MonitorConfig::default();
        Self {
            port: env::var("FLEET_SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            monitor: MonitorConfig {
                host_interval: env::var("HOST_MONITOR_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.host_interval),
                cluster_interval: env::var("CLUSTER_MONITOR_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.cluster_interval),
                liveness_threshold: env::var("LIVENESS_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.liveness_threshold),
            },
        }
    }
}

//! CLI `cluster` command group: health overview and utilization limits.

use clap::{Parser, Subcommand};
use shared::api::{ClusterHealth, HostLimits};
use shared::models::HostResource;
use tabled::{Table, Tabled, settings::Style};

use super::format_gb;
use crate::config::Config;

#[derive(Parser, Debug)]
pub struct ClusterArgs {
    #[command(subcommand)]
    command: ClusterCommands,
}

#[derive(Subcommand, Debug)]
enum ClusterCommands {
    /// Show host metrics and cluster utilization
    Health,
    /// Update cluster resource usage limits
    Limits {
        /// CPU usage limit in percent
        #[arg(long)]
        cpu: Option<f64>,
        /// Memory usage limit in percent
        #[arg(long)]
        memory: Option<f64>,
    },
}

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "CPU CORES")]
    cpu: u32,
    #[tabled(rename = "MEMORY TOTAL")]
    memory_total: String,
    #[tabled(rename = "MEMORY AVAILABLE")]
    memory_available: String,
    #[tabled(rename = "CPU LIMIT")]
    cpu_limit: String,
    #[tabled(rename = "MEMORY LIMIT")]
    memory_limit: String,
}

#[derive(Tabled)]
struct UtilizationRow {
    #[tabled(rename = "NODE")]
    node: String,
    #[tabled(rename = "CPU %")]
    cpu: String,
    #[tabled(rename = "MEMORY %")]
    memory: String,
}

#[tokio::main]
pub async fn handle(config: &Config, args: &ClusterArgs) {
    match &args.command {
        ClusterCommands::Health => health(config).await,
        ClusterCommands::Limits { cpu, memory } => limits(config, *cpu, *memory).await,
    }
}

async fn health(config: &Config) {
    match reqwest::get(format!("{}/host/resources", config.url)).await {
        Ok(resp) if resp.status().is_success() => match resp.json::<HostResource>().await {
            Ok(host) => {
                println!("Host system resources:");
                let row = HostRow {
                    cpu: host.cpu_count,
                    memory_total: format_gb(host.memory_total),
                    memory_available: format_gb(host.memory_available),
                    cpu_limit: format!("{}%", host.cpu_limit_percent),
                    memory_limit: format!("{}%", host.memory_limit_percent),
                };
                let mut table = Table::new(vec![row]);
                table.with(Style::blank());
                println!("{}", table);
            }
            Err(e) => eprintln!("Failed to parse host resources: {}", e),
        },
        Ok(resp) => eprintln!("Failed to get host metrics: {}", resp.status()),
        Err(e) => eprintln!("Request failed: {}", e),
    }

    match reqwest::get(format!("{}/health/cluster", config.url)).await {
        Ok(resp) if resp.status().is_success() => match resp.json::<ClusterHealth>().await {
            Ok(health) => {
                println!(
                    "\nNodes: {} total, {} online, {} cores, {:.1}GB",
                    health.total_nodes,
                    health.online_nodes,
                    health.total_cpu_cores,
                    health.total_memory_gb
                );
                let rows: Vec<UtilizationRow> = health
                    .nodes_utilization
                    .iter()
                    .map(|(id, util)| UtilizationRow {
                        node: id.get(0..12).unwrap_or(id).to_string(),
                        cpu: format!("{:.1}", util.cpu_utilization),
                        memory: format!("{:.1}", util.memory_utilization),
                    })
                    .collect();
                let mut table = Table::new(rows);
                table.with(Style::blank());
                println!("{}", table);
            }
            Err(e) => eprintln!("Failed to parse cluster health: {}", e),
        },
        Ok(resp) => eprintln!("Failed to get cluster health: {}", resp.status()),
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

async fn limits(config: &Config, cpu: Option<f64>, memory: Option<f64>) {
    if cpu.is_none() && memory.is_none() {
        eprintln!("Specify at least one limit to update (--cpu or --memory)");
        return;
    }

    // carry the current value for whichever limit was not given
    let current = match reqwest::get(format!("{}/host/resources", config.url)).await {
        Ok(resp) if resp.status().is_success() => match resp.json::<HostResource>().await {
            Ok(host) => host,
            Err(e) => {
                eprintln!("Failed to parse host resources: {}", e);
                return;
            }
        },
        Ok(resp) => {
            eprintln!("Failed to get current limits: {}", resp.status());
            return;
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            return;
        }
    };

    let payload = HostLimits {
        cpu_limit_percent: cpu.unwrap_or(current.cpu_limit_percent),
        memory_limit_percent: memory.unwrap_or(current.memory_limit_percent),
    };

    let client = reqwest::Client::new();
    match client
        .put(format!("{}/host/resources/limits", config.url))
        .json(&payload)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => println!(
            "Limits updated: cpu {}%, memory {}%",
            payload.cpu_limit_percent, payload.memory_limit_percent
        ),
        Ok(resp) => {
            let status = resp.status();
            let reason = resp.text().await.unwrap_or_default();
            eprintln!("Update failed ({}): {}", status, reason);
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

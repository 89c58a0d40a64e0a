//! CLI `nodes` command group: register, list and drive worker nodes.

use clap::{Parser, Subcommand};
use shared::api::NodeRegistration;
use shared::models::Node;
use tabled::{Table, Tabled, settings::Style};

use super::format_gb;
use crate::config::Config;

#[derive(Parser, Debug)]
pub struct NodesArgs {
    #[command(subcommand)]
    command: NodeCommands,
}

#[derive(Subcommand, Debug)]
enum NodeCommands {
    /// List registered nodes
    List,
    /// Register a new node backed by a worker container
    Create {
        /// CPU cores to pin
        #[arg(long)]
        cpu: u32,
        /// Memory limit in MB
        #[arg(long)]
        memory: Option<u64>,
    },
    /// Stop a node's container
    Stop { id: String },
    /// Restart a node's container
    Restart { id: String },
    /// Delete a node and its pods
    Delete { id: String },
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "HOSTNAME")]
    hostname: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: u32,
    #[tabled(rename = "MEMORY")]
    memory: String,
    #[tabled(rename = "LAST HEARTBEAT")]
    last_heartbeat: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            id: short_id(&node.id),
            hostname: node.hostname.clone(),
            status: node.status.to_string(),
            cpu: node.resources.cpu_count,
            memory: format_gb(node.resources.memory_total),
            last_heartbeat: node
                .last_heartbeat
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

#[tokio::main]
pub async fn handle(config: &Config, args: &NodesArgs) {
    match &args.command {
        NodeCommands::List => list(config).await,
        NodeCommands::Create { cpu, memory } => create(config, *cpu, *memory).await,
        NodeCommands::Stop { id } => lifecycle(config, id, "stop", "stopped").await,
        NodeCommands::Restart { id } => lifecycle(config, id, "restart", "restarted").await,
        NodeCommands::Delete { id } => delete(config, id).await,
    }
}

async fn list(config: &Config) {
    let url = format!("{}/nodes", config.url);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => match resp.json::<Vec<Node>>().await {
            Ok(nodes) => {
                let rows: Vec<NodeRow> = nodes.iter().map(NodeRow::from).collect();
                let mut table = Table::new(rows);
                table.with(Style::blank());
                println!("{}", table);
            }
            Err(e) => eprintln!("Failed to parse nodes: {}", e),
        },
        Ok(resp) => eprintln!("Server error: {}", resp.status()),
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

async fn create(config: &Config, cpu: u32, memory: Option<u64>) {
    let client = reqwest::Client::new();
    let payload = NodeRegistration {
        cpu_count: cpu,
        memory_mb: memory,
    };
    match client
        .post(format!("{}/nodes", config.url))
        .json(&payload)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => match resp.json::<Node>().await {
            Ok(node) => println!("Node {} registered ({})", short_id(&node.id), node.hostname),
            Err(e) => eprintln!("Failed to parse node: {}", e),
        },
        Ok(resp) => {
            let status = resp.status();
            let reason = resp.text().await.unwrap_or_default();
            eprintln!("Create failed ({}): {}", status, reason);
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

async fn lifecycle(config: &Config, id: &str, action: &str, done: &str) {
    let client = reqwest::Client::new();
    match client
        .post(format!("{}/nodes/{}/{}", config.url, id, action))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => println!("Node {} {}", id, done),
        Ok(resp) => {
            let status = resp.status();
            let reason = resp.text().await.unwrap_or_default();
            eprintln!("{} failed ({}): {}", action, status, reason);
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

async fn delete(config: &Config, id: &str) {
    let client = reqwest::Client::new();
    match client
        .delete(format!("{}/nodes/{}", config.url, id))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => println!("Node {} deleted", id),
        Ok(resp) => {
            let status = resp.status();
            let reason = resp.text().await.unwrap_or_default();
            eprintln!("Delete failed ({}): {}", status, reason);
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

fn short_id(id: &str) -> String {
    id.get(0..12).unwrap_or(id).to_string()
}

//! CLI `pods` command group: launch, list and delete pods.

use clap::{Parser, Subcommand};
use shared::api::PodCreation;
use shared::models::{Pod, PodResources};
use tabled::{Table, Tabled, settings::Style};

use crate::config::Config;

#[derive(Parser, Debug)]
pub struct PodsArgs {
    #[command(subcommand)]
    command: PodCommands,
}

#[derive(Subcommand, Debug)]
enum PodCommands {
    /// List pods
    List,
    /// Launch a pod with the given reservation
    Create {
        name: String,
        /// CPU cores required
        #[arg(long)]
        cpu: u32,
        /// Memory required in MB
        #[arg(long, default_value_t = 0)]
        memory: u64,
    },
    /// Delete a pod and free its reservation
    Delete { id: String },
}

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "NODE")]
    node: String,
    #[tabled(rename = "CPU")]
    cpu: u32,
    #[tabled(rename = "MEMORY(MB)")]
    memory_mb: u64,
}

impl From<&Pod> for PodRow {
    fn from(pod: &Pod) -> Self {
        Self {
            id: pod.id.to_string(),
            name: pod.name.clone(),
            status: pod.status.to_string(),
            node: pod
                .node_id
                .as_ref()
                .map(|id| id.get(0..12).unwrap_or(id).to_string())
                .unwrap_or_else(|| "-".to_string()),
            cpu: pod.resources.cpu_cores,
            memory_mb: pod.resources.memory_mb,
        }
    }
}

#[tokio::main]
pub async fn handle(config: &Config, args: &PodsArgs) {
    match &args.command {
        PodCommands::List => list(config).await,
        PodCommands::Create { name, cpu, memory } => {
            create(config, name.clone(), *cpu, *memory).await
        }
        PodCommands::Delete { id } => delete(config, id).await,
    }
}

async fn list(config: &Config) {
    let url = format!("{}/pods", config.url);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => match resp.json::<Vec<Pod>>().await {
            Ok(pods) => {
                let rows: Vec<PodRow> = pods.iter().map(PodRow::from).collect();
                let mut table = Table::new(rows);
                table.with(Style::blank());
                println!("{}", table);
            }
            Err(e) => eprintln!("Failed to parse pods: {}", e),
        },
        Ok(resp) => eprintln!("Server error: {}", resp.status()),
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

async fn create(config: &Config, name: String, cpu: u32, memory: u64) {
    let client = reqwest::Client::new();
    let payload = PodCreation {
        name,
        resources: PodResources {
            cpu_cores: cpu,
            memory_mb: memory,
        },
    };
    match client
        .post(format!("{}/pods", config.url))
        .json(&payload)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => match resp.json::<Pod>().await {
            Ok(pod) => println!(
                "Pod {} scheduled on node {}",
                pod.name,
                pod.node_id.as_deref().unwrap_or("-")
            ),
            Err(e) => eprintln!("Failed to parse pod: {}", e),
        },
        Ok(resp) if resp.status().as_u16() == 503 => {
            eprintln!("No capacity available, pod stored as pending");
        }
        Ok(resp) => {
            let status = resp.status();
            let reason = resp.text().await.unwrap_or_default();
            eprintln!("Create failed ({}): {}", status, reason);
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

async fn delete(config: &Config, id: &str) {
    let client = reqwest::Client::new();
    match client
        .delete(format!("{}/pods/{}", config.url, id))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => println!("Pod {} deleted", id),
        Ok(resp) => {
            let status = resp.status();
            let reason = resp.text().await.unwrap_or_default();
            eprintln!("Delete failed ({}): {}", status, reason);
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }
}

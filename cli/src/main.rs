use clap::{Parser, Subcommand};

mod commands;
mod config;

/// CLI tool to interact with the fleet cluster: register nodes, launch pods
/// and inspect utilization.
#[derive(Parser, Debug)]
#[command(name = "fleetctl", version, about, long_about = None)]
struct FleetCtl {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage worker nodes
    Nodes(commands::nodes::NodesArgs),
    /// Manage pods
    Pods(commands::pods::PodsArgs),
    /// Cluster-wide health and limits
    Cluster(commands::cluster::ClusterArgs),
}

fn main() {
    let cli = FleetCtl::parse();
    let config = config::Config::from_env();

    match cli.command {
        Commands::Nodes(args) => commands::nodes::handle(&config, &args),
        Commands::Pods(args) => commands::pods::handle(&config, &args),
        Commands::Cluster(args) => commands::cluster::handle(&config, &args),
    }
}

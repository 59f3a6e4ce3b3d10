//! elasticache-discovery - query an ElastiCache configuration endpoint
//!
//! One-shot mode prints the current cluster version and nodes. Watch mode
//! polls the endpoint and prints each configuration whose version is newer
//! than the last one seen.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use elasticache_discovery::cluster::ClusterConfig;
use elasticache_discovery::config::{CliArgs, DiscoveryConfig, OutputFormat};
use elasticache_discovery::{ConfigWatcher, DiscoveryClient};

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_config(config: &ClusterConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Version: {}", config.version);
            println!("Nodes: {}", config.num_nodes());
            for node in &config.nodes {
                println!("  {:<60} {:<16} {}", node.hostname, node.address, node.port);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string(config).context("Failed to encode config as JSON")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    // Build configuration
    let config = DiscoveryConfig::from_cli(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let client = DiscoveryClient::new(config)?;

    if !args.watch {
        let config = client
            .get_cluster_config()
            .with_context(|| format!("Discovery against {} failed", client.endpoint()))?;
        return print_config(&config, args.output_format);
    }

    info!("Watching {} every {}s", client.endpoint(), args.interval_secs);

    let watcher = ConfigWatcher::new(client);
    let mut print_error = None;
    watcher.run(Duration::from_secs(args.interval_secs), args.polls, |config| {
        if let Err(e) = print_config(config, args.output_format) {
            print_error.get_or_insert(e);
        }
    });

    if let Some(e) = print_error {
        return Err(e);
    }
    if watcher.version().is_none() {
        anyhow::bail!(
            "No successful poll of {} in {} attempts",
            watcher.source().endpoint(),
            watcher.poll_count()
        );
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

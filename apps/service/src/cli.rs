use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use logger::LogFormat;
use tracing::level_filters::LevelFilter;

use crate::config::Config;

/// Watch latency to an external host and the local gateway, logging only
/// anomalous samples
#[derive(Debug, Parser)]
#[command(name = "linkwatch", version, about)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/linkwatch/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// External host to probe
    #[arg(long)]
    pub host: Option<String>,

    /// Gateway address to probe instead of the routing table's choice
    #[arg(long)]
    pub gateway: Option<IpAddr>,

    /// Incident log file
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// External round trip above which a sample is an incident
    #[arg(long)]
    pub threshold_ms: Option<u64>,

    /// Time between sampling ticks
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long, default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,

    /// Diagnostic log format: compact or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply command line overrides on top of the file configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.target.host = host.clone();
        }
        if let Some(gateway) = self.gateway {
            config.target.gateway = Some(gateway);
        }
        if let Some(log_path) = &self.log_path {
            config.output.log_path = log_path.clone();
        }
        if let Some(threshold) = self.threshold_ms {
            config.sampling.latency_threshold_ms = threshold;
        }
        if let Some(interval) = self.interval_ms {
            config.sampling.interval_ms = interval;
        }
    }
}

#![warn(clippy::all, clippy::pedantic)]

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use linkwatch::{EchoTransport, IcmpTransport, Monitor};
use tracing::{debug, error, info, warn};

mod cli;
mod config;
mod route;
mod startup;

use cli::Cli;
use config::Config;
use startup::{GatewayLookup, KernelRoutes, NameResolver, StartupError, SystemResolver};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.log_level, cli.log_format);

    match launch(cli, &SystemResolver, &KernelRoutes, Arc::new(IcmpTransport::new())).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn launch(
    cli: Cli,
    resolver: &dyn NameResolver,
    routes: &dyn GatewayLookup,
    transport: Arc<dyn EchoTransport>,
) -> Result<ExitCode> {
    let mut config = Config::from_config(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{config}");
        return Ok(ExitCode::SUCCESS);
    }

    let settings = config.to_settings()?;
    let plan = match startup::prepare(&settings.external_host, config.target.gateway, resolver, routes)
        .await
    {
        Ok(plan) => plan,
        Err(e) => {
            debug!("Startup failed: {:?}", e);
            let _ = write_startup_failure(&mut io::stderr().lock(), &e);
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(
        host = %settings.external_host,
        external = %plan.external,
        gateway = %plan.gateway,
        log = %settings.log_path.display(),
        "Starting monitor"
    );

    let summary = Monitor::new(settings, plan.gateway, transport)
        .run(shutdown_signal())
        .await
        .context("monitor terminated")?;

    info!(
        ticks = summary.ticks,
        incidents = summary.evaluation.incidents,
        write_failures = summary.evaluation.write_failures,
        "Monitor stopped"
    );
    Ok(ExitCode::SUCCESS)
}

/// Operator-facing lines for a startup failure, independent of log filtering
fn write_startup_failure(out: &mut impl Write, error: &StartupError) -> io::Result<()> {
    writeln!(out, "{error}")?;
    writeln!(out, "{}", error.hint())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C, running until killed: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linkwatch::ProbeTarget;
    use std::net::IpAddr;
    use tempfile::tempdir;

    struct NoAddresses;

    #[async_trait]
    impl NameResolver for NoAddresses {
        async fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            Ok(Vec::new())
        }
    }

    struct NoRoutes;

    #[async_trait]
    impl GatewayLookup for NoRoutes {
        async fn gateway_for(&self, _destination: IpAddr) -> io::Result<Option<ProbeTarget>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_empty_resolution_exits_before_monitoring() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let log_path = dir.path().join("out.log");
        let cli = Cli::parse_from([
            "linkwatch",
            "--config",
            config_path.to_str().unwrap(),
            "--log-path",
            log_path.to_str().unwrap(),
        ]);

        let code = launch(cli, &NoAddresses, &NoRoutes, Arc::new(IcmpTransport::new()))
            .await
            .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert!(!log_path.exists());
    }

    #[test]
    fn test_startup_failure_is_written_for_the_operator() {
        let mut out = Vec::new();
        let error = StartupError::NoAddresses { host: "www.google.com".to_string() };
        write_startup_failure(&mut out, &error).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Could not resolve www.google.com.\nCheck your Internet connection.\n"
        );
    }

    #[tokio::test]
    async fn test_print_config_exits_cleanly() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let cli = Cli::parse_from([
            "linkwatch",
            "--config",
            config_path.to_str().unwrap(),
            "--print-config",
        ]);

        let code = launch(cli, &NoAddresses, &NoRoutes, Arc::new(IcmpTransport::new()))
            .await
            .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(config_path.exists());
    }
}

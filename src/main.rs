use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::path::{Path, PathBuf};

use sockprobe::config::Config;
use sockprobe::mock::{self, MockResponse};
use sockprobe::probe::ProbeEngine;

#[derive(Parser)]
#[command(name = "sockprobe", version, about = "Probe TCP services one line at a time")]
struct Cli {
    #[arg(short, long, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: ProbeCliCommand,
}

#[derive(Subcommand)]
enum ProbeCliCommand {
    /// Send a GET request and verify the response status line
    Check {
        #[arg(long, help = "Host to probe")]
        host: Option<String>,
        #[arg(long, help = "Service name or port (e.g. http, 8080)")]
        service: Option<String>,
        #[arg(long, help = "Request path")]
        path: Option<String>,
        #[arg(long, help = "Accept only HTTP/1.0 status lines")]
        strict_10: bool,
    },
    /// Run the canned-response responder until Ctrl+C
    Serve {
        #[arg(long, default_value = "127.0.0.1", help = "Address to bind")]
        bind: String,
        #[arg(long, default_value = "8080", help = "Service name or port to listen on")]
        service: String,
        #[arg(long, default_value = "HTTP/1.0 200 OK", help = "Status line to reply with")]
        status: String,
        #[arg(long, default_value = "", help = "Response body")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    log::info!("[MAIN] Starting sockprobe...");

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        ProbeCliCommand::Check {
            host,
            service,
            path,
            strict_10,
        } => {
            let mut probe_config = config.probe.clone();
            if let Some(host) = host {
                probe_config.host = host;
            }
            if let Some(service) = service {
                probe_config.service = service;
            }
            if let Some(path) = path {
                probe_config.request_path = path;
            }
            if strict_10 {
                probe_config.accepted_versions = vec!["HTTP/1.0".to_string()];
            }

            let engine = ProbeEngine::new(probe_config, config.socket.clone());
            let report = engine.run().await.context("Probe failed")?;
            log::info!(
                "[MAIN] {}:{} answered \"{}\" in {:?}",
                report.host,
                report.service,
                report.status,
                report.elapsed
            );
            println!("{}", report.status);
        }
        ProbeCliCommand::Serve {
            bind,
            service,
            status,
            body,
        } => {
            let response = MockResponse {
                status_line: Some(status),
                body,
            };
            mock::run_foreground(&bind, &service, response).await?;
        }
    }

    log::info!("[MAIN] Stopping sockprobe...");
    Ok(())
}

fn load_config(cli_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = cli_path {
        log::info!("[MAIN] Using config path: {}", path.display());
        let path = path.to_str().context("Config path is not valid UTF-8")?;
        return Config::from_file(path).context("Failed to load config file");
    }

    // Try to get the user home directory in a fallible way
    let user_home = match env::var("SUDO_USER") {
        Ok(user) => PathBuf::from(format!("/home/{}", user)),
        Err(_) => home::home_dir().context("Could not determine user home directory")?,
    };

    let config_path = user_home.join(".sockprobe").join("config.toml");
    if config_path.exists() {
        log::info!("[MAIN] Using config path: {}", config_path.display());
        Config::from_file(config_path.to_str().unwrap()).context("Failed to load config file")
    } else {
        Ok(Config::default())
    }
}

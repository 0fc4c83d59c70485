//! configgen: accepts configuration documents over HTTP and serves the
//! resulting YAML file for download.
//!
//! # Usage
//!
//! ```text
//! configgen [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>            Address to listen on [default: 0.0.0.0]
//!   --port <PORT>            Port to listen on [default: 5000]
//!   --config-path <PATH>     File that submissions replace [default: config.yaml]
//!   --max-depth <N>          Deepest accepted nesting [default: 64]
//!   --max-body-bytes <N>     Largest accepted request body [default: 2097152]
//!   --no-cors                Do not answer cross-origin requests
//! ```
//!
//! Every option can also be set through the `CONFIGGEN_*` variable named in
//! `--help`. Log verbosity follows `RUST_LOG` (default `info`).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use configgen::config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
use configgen::DEFAULT_MAX_DEPTH;

#[derive(Debug, Parser)]
#[command(
    name = "configgen",
    about = "Stores submitted configuration documents as a downloadable YAML file",
    version
)]
struct Cli {
    /// IP address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0", env = "CONFIGGEN_BIND")]
    bind: String,

    /// TCP port for the HTTP listener.
    #[arg(long, default_value_t = 5000, env = "CONFIGGEN_PORT")]
    port: u16,

    /// Path of the generated config file.
    ///
    /// Its file name is also the name offered to clients on download.
    #[arg(long, default_value = "config.yaml", env = "CONFIGGEN_CONFIG_PATH")]
    config_path: PathBuf,

    /// Maximum nesting depth of a submitted document.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, env = "CONFIGGEN_MAX_DEPTH")]
    max_depth: usize,

    /// Maximum size of a request body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "CONFIGGEN_MAX_BODY")]
    max_body_bytes: usize,

    /// Disable permissive CORS headers.
    #[arg(long, env = "CONFIGGEN_NO_CORS")]
    no_cors: bool,
}

impl Cli {
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.port),
            config_path: self.config_path,
            max_depth: self.max_depth,
            max_body_bytes: self.max_body_bytes,
            cors: !self.no_cors,
        })
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;
    let bind_addr = config.bind_addr;

    configgen::server::serve(config, shutdown_signal())
        .await
        .with_context(|| format!("server on {} failed", bind_addr))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Cli::parse_from(["configgen"]).into_server_config().unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn flags() {
        let config = Cli::parse_from([
            "configgen",
            "--bind",
            "127.0.0.1",
            "--port",
            "8080",
            "--config-path",
            "/srv/app/settings.yaml",
            "--max-depth",
            "8",
            "--no-cors",
        ])
        .into_server_config()
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.config_path, PathBuf::from("/srv/app/settings.yaml"));
        assert_eq!(config.max_depth, 8);
        assert!(!config.cors);
    }

    #[test]
    fn bad_bind_address() {
        let err = Cli::parse_from(["configgen", "--bind", "not-an-ip"])
            .into_server_config()
            .unwrap_err();
        assert!(err.to_string().contains("not-an-ip"));
    }
}

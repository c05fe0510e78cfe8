//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use url::Url;

use crate::worker::{WorkerMode, CACHE_NAME};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "timer-relay")]
#[command(about = "Offline asset cache and notification relay for the Hypertrofia workout timer")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Where the app is published; every request is resolved under it
    #[arg(short, long, default_value = "http://localhost:8080/")]
    pub origin: Url,

    /// Cache bucket name; changing it replaces the cached asset set
    #[arg(long, default_value = CACHE_NAME)]
    pub cache_version: String,

    /// Keep cache buckets on disk here instead of in memory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, default_value = "15")]
    pub timeout: u64,

    /// Run without caching or state mirroring
    #[arg(long)]
    pub minimal: bool,

    /// Command used to open a new app window, invoked with the URL
    #[arg(long)]
    pub opener: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn mode(&self) -> WorkerMode {
        if self.minimal { WorkerMode::Minimal } else { WorkerMode::Full }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// App scope: the origin with a trailing slash so relative asset paths
    /// resolve inside it
    pub fn scope(&self) -> Url {
        let mut scope = self.origin.clone();
        if !scope.path().ends_with('/') {
            let path = format!("{}/", scope.path());
            scope.set_path(&path);
        }
        scope.set_query(None);
        scope.set_fragment(None);
        scope
    }
}

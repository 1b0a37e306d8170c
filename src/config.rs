use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ms3_client::DEFAULT_SERVER_URL_ENV;
use std::{env, path::PathBuf};

/// Centralized CLI configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// MS3 server the client commands talk to.
    pub server_url: Option<String>,
    /// Bind host for `serve`.
    pub host: String,
    /// Bind port for `serve`.
    pub port: u16,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Command-line client for MS3 object storage")]
pub struct Args {
    /// Server URL (overrides MS3_SERVER_URL)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Host to bind `serve` to (overrides MS3_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind `serve` to (overrides MS3_PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List buckets
    Buckets,
    /// Create a bucket
    CreateBucket { name: String },
    /// List objects in a bucket
    Ls {
        bucket: String,
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print an object's metadata
    Stat { bucket: String, key: String },
    /// Download an object to a file, or to stdout
    Get {
        bucket: String,
        key: String,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Upload a file or an inline string
    Put {
        bucket: String,
        key: String,
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(long)]
        content: Option<String>,
        /// User metadata entry, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Print an access URL for an object
    Url { bucket: String, key: String },
    /// Run the in-memory reference server
    Serve,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        let args = Args::parse();
        let cfg = Self::merge(&args)?;
        Ok((cfg, args.command))
    }

    fn merge(args: &Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_server_url = env::var(DEFAULT_SERVER_URL_ENV).ok();
        let env_host = env::var("MS3_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let env_port = match env::var("MS3_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing MS3_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading MS3_PORT"),
        };

        // --- Merge ---
        Ok(Self {
            server_url: args.server_url.clone().or(env_server_url),
            host: args.host.clone().unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got `{}`", raw);
    };
    if key.is_empty() {
        bail!("metadata key must not be empty in `{}`", raw);
    }
    Ok((key.to_string(), value.to_string()))
}

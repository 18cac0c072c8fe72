use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use issue_tracker_core::db::SqliteStore;

use crate::upload::{ImgbbClient, DEFAULT_IMGBB_URL};

#[derive(Parser)]
#[command(name = "itrk")]
#[command(about = "Issue tracking backend for projects, issues and resolutions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(ServeArgs),
}

impl Cli {
    /// Server settings, whether given after `serve` or directly.
    pub fn into_serve_args(self) -> ServeArgs {
        match self.command {
            Some(Commands::Serve(args)) => args,
            None => self.serve,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "TRACKER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for HTTP API
    #[arg(short, long, env = "TRACKER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, env = "TRACKER_DB")]
    pub database: Option<PathBuf>,

    /// Keep everything in memory; data is lost on exit
    #[arg(long, conflicts_with = "database")]
    pub in_memory: bool,

    /// ImgBB API key used for screenshot uploads
    #[arg(long, env = "IMGBB_API_KEY", hide_env_values = true)]
    pub imgbb_api_key: Option<String>,

    /// ImgBB upload endpoint
    #[arg(long, env = "IMGBB_URL", default_value = DEFAULT_IMGBB_URL)]
    pub imgbb_url: String,
}

impl ServeArgs {
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => SqliteStore::default_path(),
        }
    }

    pub fn image_host(&self) -> ImgbbClient {
        ImgbbClient::new(self.imgbb_api_key.clone(), self.imgbb_url.clone())
    }
}

use crate::config::Settings;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "carms")]
#[command(version, about = "CaRMS residency program platform: load job, REST API and dashboard")]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to ./carms.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the warehouse connection URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the load job: spreadsheets and descriptions into the warehouse
    Etl(EtlArgs),
    /// Serve the REST API
    Serve(ServeArgs),
    /// Serve the HTML dashboard (reads from the REST API)
    Dashboard(DashboardArgs),
    /// Create the warehouse tables if they do not exist
    InitDb,
}

#[derive(Debug, Clone, Args)]
pub struct EtlArgs {
    /// Directory holding the source spreadsheets and descriptions
    #[arg(long)]
    pub raw_data_dir: Option<String>,

    /// Extract and transform into an in-memory warehouse; PostgreSQL is not touched
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU and memory usage between phases
    #[arg(long)]
    pub monitor: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct DashboardArgs {
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<String>,

    /// Base URL of the REST API, e.g. http://localhost:8000/api/v1
    #[arg(long)]
    pub api_url: Option<String>,
}

impl Cli {
    /// Command line flags take precedence over every other configuration layer.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.database_url {
            settings.database_url = url.clone();
        }

        match &self.command {
            Command::Etl(args) => {
                if let Some(dir) = &args.raw_data_dir {
                    settings.raw_data_dir = dir.clone();
                }
            }
            Command::Serve(args) => {
                if let Some(bind) = &args.bind {
                    settings.api_bind = bind.clone();
                }
            }
            Command::Dashboard(args) => {
                if let Some(bind) = &args.bind {
                    settings.dashboard_bind = bind.clone();
                }
                if let Some(api_url) = &args.api_url {
                    settings.api_url = api_url.clone();
                }
            }
            Command::InitDb => {}
        }
    }
}

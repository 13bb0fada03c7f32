mod commands;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{EventBus, HttpReportService, QueryAdapter};
use config::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Browse analysis reports stored on a report server")]
struct Args {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    max_query_size: Option<u64>,
    #[arg(long)]
    page_size: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of reports matching a filter.
    List(commands::ListArgs),
    /// Replay a navigation address against a run, comparison or all-reports view.
    Open(commands::OpenArgs),
    /// Decode a navigation address without contacting the server.
    Decode { address: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config);
    if let Some(v) = args.server_url {
        settings.server_url = v;
    }
    if let Some(v) = args.endpoint {
        settings.endpoint = v;
    }
    if let Some(v) = args.max_query_size {
        settings.max_query_size = v;
    }
    if let Some(v) = args.page_size {
        settings.page_size = v;
    }

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Command::Decode { address } => commands::decode(&address),
        Command::List(list) => {
            commands::list(&query_adapter(&settings)?, &list, settings.page_size).await
        }
        Command::Open(open) => {
            commands::open(query_adapter(&settings)?, &open, settings.page_size).await
        }
    }
}

fn query_adapter(settings: &Settings) -> Result<QueryAdapter> {
    let service = HttpReportService::new(&settings.server_url, &settings.endpoint)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    info!(base_url = %service.base_url(), "using report server");
    Ok(
        QueryAdapter::new(Arc::new(service), EventBus::default())
            .with_max_query_size(settings.max_query_size),
    )
}

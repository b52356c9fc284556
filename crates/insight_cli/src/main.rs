mod app;
mod commands;
mod config;
mod effects;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::{AppConfig, FlowChoice, LogChoice, Overrides};

/// Terminal client for the data insights service: upload a CSV, follow
/// processing, then read the report, chat about it or draw plots.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (RON); defaults to ./insight.ron when present
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:5000/
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,

    /// Which pipeline to drive
    #[arg(long, value_enum)]
    flow: Option<FlowChoice>,

    /// Where log output goes
    #[arg(long, value_enum)]
    log: Option<LogChoice>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?.with_overrides(Overrides {
        base_url: args.base_url,
        flow: args.flow,
        log: args.log,
    });
    insight_logging::initialize(&config.log_settings()?);
    app::run(config)
}

//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::config::{AppConfig, ENV_CONFIG_PATH};
use crate::telemetry::init_tracing;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "oxdata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to a TOML config file (falls back to OXDATA_CONFIG)"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "serve", about = "Run the HTTP service (default)")]
    Serve(ServeArgs),

    #[command(name = "status", about = "Check store and cache connectivity")]
    Status(StatusArgs),
}

#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    #[arg(short, long, help = "Override the listen address, e.g. 127.0.0.1:8080")]
    pub bind: Option<String>,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[arg(short, long, help = "Show detailed information")]
    pub verbose: bool,
}

mod serve;
mod status;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from));
    let config = AppConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    let _guard = init_tracing(&config.telemetry)?;

    match cli.command {
        Some(Commands::Serve(args)) => serve::execute(config, &args).await,
        Some(Commands::Status(args)) => status::execute(&config, &args).await,
        None => serve::execute(config, &ServeArgs::default()).await,
    }
}

use crate::app::check_dependencies;
use crate::cli::StatusArgs;
use crate::config::AppConfig;
use crate::error::Result as DataResult;
use crate::utils::redaction::redact_connection_string;
use anyhow::{bail, Result};
use secrecy::ExposeSecret;

pub async fn execute(config: &AppConfig, args: &StatusArgs) -> Result<()> {
    println!("=== oxdata dependency status ===\n");

    if args.verbose {
        println!(
            "Read replica:  {}",
            redact_connection_string(config.store.read_dsn.expose_secret())
        );
        println!(
            "Write replica: {}",
            redact_connection_string(config.store.write_dsn.expose_secret())
        );
        println!("Cache mode:    {:?}", config.cache.mode);
        if !config.cache.nodes.is_empty() {
            println!("Cache nodes:   {}", config.cache.nodes.join(", "));
        }
        println!();
    }

    let health = check_dependencies(config).await;

    print_status("Store", &health.store, args.verbose);
    print_status("Cache", &health.cache, args.verbose);

    if !health.is_healthy() {
        bail!("one or more dependencies are unhealthy");
    }
    Ok(())
}

fn print_status(name: &str, result: &DataResult<()>, verbose: bool) {
    let status = match result {
        Ok(()) => "✅ HEALTHY".to_string(),
        Err(e) if verbose => format!("❌ UNHEALTHY ({})", e),
        Err(_) => "❌ UNHEALTHY".to_string(),
    };
    println!("{:<6} {}", format!("{}:", name), status);
}

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use hkv_server::{HkvServer, ServerConfig};
use hkv_store::InMemoryKvCore;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Config(args) => cmd_config(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => Ok(ServerConfig::load(path)?),
        None => Ok(ServerConfig::default()),
    }
}

/// Apply command-line overrides on top of the file configuration.
fn apply_overrides(mut config: ServerConfig, args: &ServeArgs) -> ServerConfig {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if args.locked_overwrite {
        config.hash.lock_whole_overwrite = true;
    }
    config
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    println!(
        "{} hkv server on {} (timeout {} ms)",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.request_timeout_ms
    );
    if config.hash.lock_whole_overwrite {
        println!("  Whole-hash overwrites: {}", "locked".yellow());
    }
    let server = HkvServer::new(config, Arc::new(InMemoryKvCore::new()));
    server.serve().await?;
    println!("{} Shut down.", "✓".green());
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

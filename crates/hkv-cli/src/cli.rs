use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hkv",
    about = "hkv — typed hash values over a lockable key-value core",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the hkv server on an in-memory core
    Serve(ServeArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Override the per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Lock the key during whole-hash overwrites
    #[arg(long)]
    pub locked_overwrite: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

//! Clap derive structure for the `vedo-gateway` binary.

use std::path::PathBuf;

use clap::Parser;

/// vedo-gateway -- HTTP front end for a Comelit Vedo alarm panel
#[derive(Debug, Parser)]
#[command(
    name = "vedo-gateway",
    version,
    about = "Serve a Comelit Vedo alarm panel over HTTP",
    long_about = "Keeps one authenticated session to the panel and exposes area and zone\n\
        status, arming and zone commands as a small JSON API.\n\n\
        Settings come from the config file, then VEDO_* environment variables."
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "VEDO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides `listen` from the config)
    #[arg(long, short = 'l')]
    pub listen: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, env = "VEDO_LOG_JSON")]
    pub log_json: bool,

    /// Write the resolved settings (without the key) to the config file and exit
    #[arg(long)]
    pub init_config: bool,
}

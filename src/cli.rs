use std::path::PathBuf;

use clap::Parser;

use crate::consts;

#[derive(Parser, Debug, Clone)]
#[command(name = "imgdrop", about = "Token-protected image upload server")]
pub struct Cli {
    /// Path of the YAML configuration file
    #[arg(long, env = "IMGDROP_CONFIG", default_value = consts::CONFIG_PATH)]
    pub config: PathBuf,

    /// Address to bind to
    #[arg(long, default_value = consts::DEFAULT_HOST)]
    pub host: String,

    /// Re-read the configuration file for every upload
    #[arg(long)]
    pub reload_config: bool,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

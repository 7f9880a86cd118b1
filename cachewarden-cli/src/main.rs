//! CacheWarden CLI - Command-line interface
//!
//! This binary provides manual control over a watched cache directory:
//! measuring usage, running a cleaning pass, and wiping all entries.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cachewarden::config::CacheConfig;
use cachewarden::logging::{default_log_dir, default_log_file, init_logging};
use cachewarden::size::Size;

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "cachewarden")]
#[command(version = cachewarden::VERSION)]
#[command(about = "Keep a downloaded-asset cache directory under a size budget", long_about = None)]
struct Args {
    /// Directory to watch (repeat for multiple directories)
    #[arg(long = "dir", global = true)]
    dirs: Vec<PathBuf>,

    /// Recognized file extension, e.g. "cvravatar" (repeat for multiple)
    #[arg(long = "ext", global = true)]
    extensions: Vec<String>,

    /// Maximum cache size, e.g. "20GB" or "500MB"
    #[arg(long, global = true, default_value = "20GB")]
    max_size: Size,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show current cache usage against the configured budget
    Status,
    /// Run one cleaning pass now
    Clean,
    /// Delete every recognized file in the watched directories
    Wipe {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Args {
    fn build_config(&self) -> CacheConfig {
        let mut config = CacheConfig::default().with_max_size_bytes(self.max_size.bytes());
        if !self.dirs.is_empty() {
            config.watched_dirs = self.dirs.clone();
        }
        for ext in &self.extensions {
            config = config.with_extension(ext);
        }
        config.ensure_root()
    }
}

fn main() {
    let args = Args::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let config = args.build_config();
    tracing::debug!(
        dirs = config.watched_dirs.len(),
        max_size_bytes = config.max_size_bytes,
        "Configuration resolved"
    );

    let result = match args.command {
        Command::Status => commands::status::run(&config),
        Command::Clean => commands::clean::run(&config),
        Command::Wipe { yes } => commands::wipe::run(&config, yes),
    };

    if let Err(e) = result {
        e.exit();
    }
}

//! zidelok: command-line shell for the Zidelok site store.
//!
//! Drives `zidelok-core` the way a GUI shell would and prints every result as
//! JSON on stdout.
//!
//! ## Subcommands
//!
//! - `list`: Scan the store
//! - `import`, `extract`, `launch`, `delete`: Site lifecycle
//! - `autostart`, `settings`, `remote`: Settings and startup behavior
//! - `action`: Raw protocol dispatch (`{action, params}`)
//! - `state`: Full renderer state

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use zidelok_core::{ShellEngine, StorageConfig};

#[derive(Parser)]
#[command(name = "zidelok")]
#[command(about = "Manage and launch locally installed Zidelok sites")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, env = "ZIDELOK_DATA_DIR", global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List installed sites
    List,

    /// Copy zip archives into the store
    Import {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Replace a site's directory with the contents of its archive
    Extract { name: String },

    /// Resolve a site's entry point, extracting it first if needed
    Launch { name: String },

    /// Remove a site's directory and archive
    Delete { name: String },

    /// Show, set or clear the site launched at startup
    Autostart {
        /// Site to launch at startup
        #[arg(long, value_name = "NAME", conflicts_with = "clear")]
        set: Option<String>,

        /// Disable autostart
        #[arg(long)]
        clear: bool,
    },

    /// Show or change settings
    Settings {
        /// Remote catalogue URL (empty string clears it)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Launch sites fullscreen
        #[arg(long, value_name = "BOOL")]
        fullscreen: Option<bool>,
    },

    /// Resolve what "load remote" opens
    Remote,

    /// Dispatch a raw protocol action
    Action {
        /// Action name, e.g. launchSite
        name: String,

        /// Params as a JSON object
        #[arg(value_name = "PARAMS_JSON")]
        params: Option<String>,
    },

    /// Print the full renderer state
    State,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let storage = cli
        .data_dir
        .map(StorageConfig::with_root)
        .unwrap_or_default();
    let _logging_guard = logging::init(&storage.logs_dir());

    let engine = match ShellEngine::with_storage(storage) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(error = %err, "zidelok failed to start");
            commands::print(&commands::error_value(&err.to_error_info()));
            return ExitCode::FAILURE;
        }
    };

    let output = commands::run(&engine, cli.command);
    commands::print(&output.value);
    if output.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

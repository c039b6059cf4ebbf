// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nudge - keeps support chats from going unanswered.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nudge_config::NudgeConfig;

/// Nudge - escalation bot for unanswered support chats.
#[derive(Parser, Debug)]
#[command(name = "nudge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Telegram and start watching chats.
    Serve,
    /// Show the persisted pending messages and notification state.
    Status {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration.
    Config,
}

fn load_config(path: Option<&std::path::Path>) -> NudgeConfig {
    let loaded = match path {
        Some(path) => nudge_config::load_and_validate_path(path),
        None => nudge_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            nudge_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Renders the configuration as TOML with the bot token masked.
fn redacted_toml(config: &NudgeConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.telegram.bot_token.is_some() {
        shown.telegram.bot_token = Some("***".to_string());
    }
    toml::to_string_pretty(&shown)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config) => match redacted_toml(&config) {
            Ok(rendered) => {
                print!("{rendered}");
                Ok(())
            }
            Err(e) => Err(nudge_core::NudgeError::Internal(format!(
                "failed to render configuration: {e}"
            ))),
        },
        None => {
            println!("nudge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

//! Command-line interface for the dock host
//!
//! Supports:
//! - Docking an existing window picked by id or as the active window
//! - Printing the persisted configuration
//! - Updating configuration options without a running dock

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sidebar_dock::x11::parse_window_id;

/// Dock an X11 window as a sidebar along a monitor edge
#[derive(Parser, Debug)]
#[command(name = "sidebar-dock", version, about = "Dock an X11 window as a sidebar")]
pub struct CliArgs {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage a window until SIGINT/SIGTERM (SIGUSR1 toggles, SIGHUP reloads config)
    Run {
        /// Window id, decimal or 0x-prefixed hex
        #[arg(long, value_name = "ID", value_parser = parse_window_id, required_unless_present = "active")]
        window: Option<u32>,

        /// Use the currently active window
        #[arg(long, conflicts_with = "window")]
        active: bool,

        /// Dock immediately instead of only when the last session ended docked
        #[arg(long)]
        embed: bool,

        /// Move the window to its last free-floating geometry first
        #[arg(long)]
        restore: bool,
    },

    /// Print the persisted configuration as JSON
    Status,

    /// Validate and store option updates, e.g. `set width=320 edge=right`
    Set {
        #[arg(value_name = "KEY=VALUE", value_parser = parse_assignment, required = true)]
        options: Vec<(String, String)>,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

//! Common functionality for gridlink.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod assignment;
pub mod cable;
pub mod catalog;
pub mod cli;
pub mod distance;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod site;
pub mod solution;
pub mod solver;
pub mod substation;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// This will be e.g. `~/.config/gridlink` on Linux.
pub fn get_gridlink_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir found. Use cwd instead.
        return PathBuf::default();
    };

    config_dir.push("gridlink");
    config_dir
}

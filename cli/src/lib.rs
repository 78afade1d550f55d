// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end of `davprobe-discovery`.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]

mod cli;
mod config;
mod report;

use std::error::Error;

use colored::Colorize;

pub use crate::cli::Cli;
pub use crate::config::{Credentials, parse_config};
pub use crate::report::Report;

/// Name of the application, used for the configuration directory.
pub const APP_NAME: &str = "davprobe";

/// Run the davprobe command-line interface.
///
/// # Errors
///
/// Errors of the run itself are printed rather than returned.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        println!("{} {}", "Error:".red(), e);
    }
    Ok(())
}

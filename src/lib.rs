//! # nvsharptop
//!
//! A live Nvidia GPU dashboard for the terminal, polling `nvidia-smi`.
//!
//! ## Features
//!
//! - Periodic sampling of utilization, memory and temperature per GPU
//! - Horizontal gauge view, stacked vertical bar-history view and a
//!   novelty crawl mode
//! - Interactive start screen for tuning intervals and visual options
//! - Tolerant parsing: malformed query output lines are skipped, a missing
//!   `nvidia-smi` degrades to a one-time diagnostic instead of a crash
//!
//! ## Example
//!
//! ```rust,no_run
//! use nvsharptop::cli::Args;
//! use nvsharptop::run;
//!
//! let args = Args {
//!     once: true,
//!     ..Default::default()
//! };
//!
//! run(args).expect("Failed to run nvsharptop");
//! ```

pub mod cli;
pub mod collector;
pub mod config;
pub mod crawl;
pub mod display;
pub mod error;
pub mod gpu;
pub mod history;
pub mod input;
pub mod logger;
pub mod options;

use anyhow::Result;
use cli::Args;
use gpu::{GpuSampler, SmiSampler};
use std::io::IsTerminal;

/// Main entry point for the nvsharptop application.
///
/// Handles the simple one-shot commands first (`--list`, `--once`), then
/// guards against a non-interactive terminal and hands over to the UI loop.
pub fn run(args: Args) -> Result<()> {
    let mut config = config::Config::load();
    config.apply_args(&args);
    let options = options::ViewOptions::from_config(&config);

    let sampler = SmiSampler::new();

    // Handle simple commands first
    if args.list {
        return list_devices(&sampler);
    }

    if args.once {
        return print_snapshot(&sampler);
    }

    if !std::io::stdout().is_terminal() {
        return Err(error::NvsharptopError::Terminal(
            "stdout is not an interactive terminal; try --once for a one-shot snapshot".to_string(),
        )
        .into());
    }

    display::run_ui(options, Box::new(sampler), args.log_file)
}

fn list_devices(sampler: &dyn GpuSampler) -> Result<()> {
    match sampler.sample() {
        Ok(readings) if !readings.is_empty() => {
            for reading in readings {
                println!("{}: {}", reading.index, reading.name);
            }
        }
        Ok(_) => println!("No GPU devices detected"),
        Err(e) => println!("No GPU devices detected ({e})"),
    }

    Ok(())
}

fn print_snapshot(sampler: &dyn GpuSampler) -> Result<()> {
    match sampler.sample() {
        Ok(readings) if !readings.is_empty() => {
            for reading in readings {
                println!(
                    "GPU {} {}: {:.0}% util, {:.0}/{:.0} MiB ({:.1}%), {:.0}C",
                    reading.index,
                    reading.name,
                    reading.utilization,
                    reading.memory_used,
                    reading.memory_total,
                    reading.memory_percent(),
                    reading.temperature,
                );
            }
        }
        Ok(_) => println!("No GPU devices detected"),
        Err(e) => println!("No GPU devices detected ({e})"),
    }

    Ok(())
}

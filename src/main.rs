// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod clock;
mod config;
mod format;
mod grid;
mod job;
mod render;
mod scheduler;
mod stats;

use config::{DisplaySpec, MonitorConfig};

#[derive(Parser, Debug)]
#[command(name = "qmon")]
#[command(about = "Quarry monitor - live progress and hole map for a spiral excavation job")]
#[command(version)]
struct Args {
    /// Job-state file written by the assignment controller
    #[arg(short, long, default_value = "disk/jobs.json")]
    state: PathBuf,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    poll_ms: u64,

    /// Text refresh interval in milliseconds
    #[arg(long, default_value = "1000")]
    text_ms: u64,

    /// Map refresh interval in milliseconds
    #[arg(long, default_value = "5000")]
    map_ms: u64,

    /// Pause after drawing each display, in milliseconds (defaults to the poll interval)
    #[arg(long)]
    surface_pause_ms: Option<u64>,

    /// Display panel file, as PATH or PATH@WIDTHxHEIGHT (repeatable)
    #[arg(short, long = "display")]
    displays: Vec<DisplaySpec>,

    /// Render one frame from the current job state and exit
    #[arg(long)]
    once: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn to_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new(&self.state);
        config.poll_interval = Duration::from_millis(self.poll_ms);
        config.text_interval = Duration::from_millis(self.text_ms);
        config.map_interval = Duration::from_millis(self.map_ms);
        config.surface_pause =
            Duration::from_millis(self.surface_pause_ms.unwrap_or(self.poll_ms));
        config.displays = self.displays.clone();
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.to_config();
    if args.once {
        scheduler::run_once(&config)
    } else {
        scheduler::run_monitor(config)
    }
}

/// The terminal belongs to the text renderer while the monitor runs, so
/// interactive logs only go to a file, or to stderr when explicitly asked.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        return Ok(());
    }

    let stderr_enabled = args.once
        || matches!(
            std::env::var("QMON_LOG_STDERR").ok().as_deref(),
            Some("1") | Some("true") | Some("yes")
        );
    if stderr_enabled {
        let _ = builder.with_writer(io::stderr).try_init();
    } else {
        let _ = builder.with_writer(io::sink).try_init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["qmon"]);
        let config = args.to_config();
        assert_eq!(config.state_path, PathBuf::from("disk/jobs.json"));
        assert_eq!(config.surface_pause, Duration::from_secs(1));
        assert!(!args.once);
    }

    #[test]
    fn test_display_and_pause_args() {
        let args = Args::parse_from([
            "qmon",
            "--poll-ms",
            "500",
            "--surface-pause-ms",
            "0",
            "-d",
            "north.txt@30x20",
            "-d",
            "south.txt",
        ]);
        let config = args.to_config();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.surface_pause, Duration::ZERO);
        assert_eq!(config.displays.len(), 2);
        assert_eq!(config.displays[0].width, 30);
    }

    #[test]
    fn test_bad_display_is_rejected() {
        assert!(Args::try_parse_from(["qmon", "-d", "panel@wide"]).is_err());
    }
}

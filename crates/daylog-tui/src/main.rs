//! `daylog`: Calendar-driven terminal browser for dated journal entries.
//!
//! Built on [ratatui](https://ratatui.rs) over `daylog-core`: a month grid
//! on the left selects a day or a range, and the entry list on the right
//! is filtered to match. Filters set from outside the calendar (presets)
//! are mirrored back onto the grid.
//!
//! Logs are written to a file (default `/tmp/daylog.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, record
//! loading, and app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod panes;
mod records;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use daylog_config::Config;
use daylog_core::model::parse_user_day;
use daylog_core::{RecordStore, WeekStart};

use crate::app::App;

/// Browse journal entries by day, range, or month.
#[derive(Parser, Debug)]
#[command(name = "daylog", version, about)]
struct Cli {
    /// JSON file with an array of entries (overrides `records_file` in the config)
    #[arg(short, long, env = "DAYLOG_RECORDS")]
    records: Option<PathBuf>,

    /// Generate N synthetic entries instead of reading a file
    #[arg(long, value_name = "N", conflicts_with = "records")]
    demo: Option<usize>,

    /// Treat this date as today (YYYY-MM-DD or e.g. "Jan 3, 2025")
    #[arg(long, value_parser = parse_user_day)]
    today: Option<NaiveDate>,

    /// Give up on the filter worker after this long (e.g. "3s", "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    worker_timeout: Option<Duration>,

    /// Always filter inline instead of on a worker
    #[arg(long)]
    no_worker: bool,

    /// First day of the week: sunday or monday
    #[arg(long)]
    week_start: Option<WeekStart>,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Log file path (defaults to /tmp/daylog.log)
    #[arg(long, default_value = "/tmp/daylog.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Nothing may log to stdout/stderr while the
/// terminal is in raw mode. Hold the returned guard until exit so the
/// logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("daylog={log_level},daylog_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("daylog.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Config file, then CLI flags on top.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => daylog_config::load_config_from(path),
        None => daylog_config::load_config(),
    }
    .wrap_err("loading config")?;

    if let Some(path) = &cli.records {
        config.records_file = Some(path.clone());
    }
    if let Some(timeout) = cli.worker_timeout {
        config.pipeline.worker_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }
    if cli.no_worker {
        config.pipeline.use_worker = false;
    }
    if let Some(week_start) = cli.week_start {
        config.calendar.week_start = week_start;
    }

    config.validate().wrap_err("invalid configuration")?;
    Ok(config)
}

/// Persist `config` where it would be loaded from next time.
fn save_config(cli: &Cli, config: &Config) -> Result<PathBuf> {
    let path = cli.config.clone().unwrap_or_else(daylog_config::config_path);
    daylog_config::save_config_to(config, &path)
        .wrap_err_with(|| format!("saving config to {}", path.display()))?;
    Ok(path)
}

fn load_store(cli: &Cli, config: &Config, today: NaiveDate) -> Result<RecordStore> {
    let store = RecordStore::new();
    if let Some(count) = cli.demo {
        store.replace_all(records::demo_records(count, today));
    } else if let Some(path) = config.records_path() {
        store.replace_all(records::load_records_file(&path)?);
    } else {
        info!("no records file configured, starting empty");
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal switches to raw mode.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = build_config(&cli)?;
    if cli.save_config {
        let path = save_config(&cli, &config)?;
        info!(path = %path.display(), "config saved");
        println!("Saved config to {}", path.display());
        return Ok(());
    }

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    info!(%today, demo = ?cli.demo, records = ?config.records_path(), "starting daylog");

    let store = Arc::new(load_store(&cli, &config, today)?);
    let mut app = App::new(store, &config, today);
    app.run().await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_saved_flags_load_back_from_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daylog").join("config.toml");
        let mut args: Vec<std::ffi::OsString> = vec!["daylog".into(), "--config".into()];
        args.push(path.clone().into_os_string());
        args.extend(
            ["--week-start", "monday", "--worker-timeout", "750ms", "--no-worker", "--save-config"]
                .map(Into::into),
        );
        let cli = Cli::parse_from(args);
        assert!(cli.save_config);

        let config = build_config(&cli).unwrap();
        assert_eq!(save_config(&cli, &config).unwrap(), path);

        let loaded = daylog_config::load_config_from(&path).unwrap();
        assert_eq!(loaded.calendar.week_start, WeekStart::Monday);
        assert_eq!(loaded.pipeline.worker_timeout_ms, 750);
        assert!(!loaded.pipeline.use_worker);
    }
}

//! Configuration for daylog.
//!
//! TOML file + `DAYLOG_*` environment overrides, merged over built-in
//! defaults with figment, and translated into the core's typed config
//! structs. CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use daylog_core::{CalendarConfig, ListConfig, PipelineConfig, WeekStart};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Config {
    /// JSON file of records loaded at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_file: Option<PathBuf>,

    #[serde(default)]
    pub calendar: CalendarSection,

    #[serde(default)]
    pub list: ListSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarSection {
    pub week_start: WeekStart,
    pub max_markers: usize,
}

impl Default for CalendarSection {
    fn default() -> Self {
        let core = CalendarConfig::default();
        Self {
            week_start: core.week_start,
            max_markers: core.max_markers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListSection {
    pub row_height: u32,
    pub visible_rows: usize,
    pub preview_chars: usize,
}

impl Default for ListSection {
    fn default() -> Self {
        let core = ListConfig::default();
        Self {
            row_height: core.row_height,
            visible_rows: core.visible_rows,
            preview_chars: core.preview_chars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSection {
    pub use_worker: bool,
    pub worker_timeout_ms: u64,
    pub chunk_size: usize,
    pub progress_threshold: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let core = PipelineConfig::default();
        Self {
            use_worker: core.use_worker,
            worker_timeout_ms: u64::try_from(core.worker_timeout.as_millis()).unwrap_or(u64::MAX),
            chunk_size: core.chunk_size,
            progress_threshold: core.progress_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSection {
    pub tick_rate_ms: u64,
    /// Paint tick: the list applies staged scroll and visibility work at
    /// this rate.
    pub render_rate_ms: u64,
    pub notification_secs: u64,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            tick_rate_ms: 250,
            render_rate_ms: 33,
            notification_secs: 3,
        }
    }
}

impl UiSection {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn render_rate(&self) -> Duration {
        Duration::from_millis(self.render_rate_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

// ── Translation to core configs ─────────────────────────────────────

impl Config {
    pub fn calendar_config(&self) -> CalendarConfig {
        CalendarConfig {
            week_start: self.calendar.week_start,
            max_markers: self.calendar.max_markers,
        }
    }

    pub fn list_config(&self) -> ListConfig {
        ListConfig {
            row_height: self.list.row_height,
            visible_rows: self.list.visible_rows,
            preview_chars: self.list.preview_chars,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            use_worker: self.pipeline.use_worker,
            worker_timeout: Duration::from_millis(self.pipeline.worker_timeout_ms),
            chunk_size: self.pipeline.chunk_size,
            progress_threshold: self.pipeline.progress_threshold,
        }
    }

    /// `records_file` with a leading `~` expanded.
    pub fn records_path(&self) -> Option<PathBuf> {
        self.records_file.as_deref().map(expand_home)
    }

    /// Reject values the core cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("list.row_height", u64::from(self.list.row_height)),
            ("list.visible_rows", to_u64(self.list.visible_rows)),
            ("pipeline.chunk_size", to_u64(self.pipeline.chunk_size)),
            ("pipeline.worker_timeout_ms", self.pipeline.worker_timeout_ms),
            ("ui.tick_rate_ms", self.ui.tick_rate_ms),
            ("ui.render_rate_ms", self.ui.render_rate_ms),
        ];
        if let Some((field, _)) = checks.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Validation {
                field: (*field).into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), BaseDirs::new()) {
        (Ok(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => path.to_path_buf(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "daylog", "daylog").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
    p.push(".config");
    p.push("daylog");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file means defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DAYLOG_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent
/// directories as needed.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

pub const CONFIG_FILE: &str = "task-cli";
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    tasks_file: PathBuf,
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from(DEFAULT_TASKS_FILE),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Reads `task-cli.toml` from the working directory if there is one,
    /// falling back to defaults for anything it leaves out.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_source(config::File::with_name(CONFIG_FILE).required(false))
    }

    fn with_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let s = config::Config::builder()
            .set_default("tasks_file", DEFAULT_TASKS_FILE)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .add_source(source)
            .build()?;

        Ok(s.try_deserialize()?)
    }

    pub fn tasks_file(&self) -> &Path {
        &self.tasks_file
    }

    /// Unrecognized levels fall back to `warn`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::WARN)
    }
}

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "RATSINFO";
const CONFIG_FILE: &str = "ratsinfo";

/// Runtime settings: `ratsinfo.toml` (optional) overlaid by `RATSINFO_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Calendar page listing the sessions.
    pub calendar_url: String,
    /// Session page; `{id}` is replaced by the session id.
    pub session_url: String,
    pub output_dir: PathBuf,
    pub java: PathBuf,
    pub tika_jar: PathBuf,
    /// Seconds one tika run may take before it is killed.
    pub tika_timeout_secs: u64,
    /// Size of the metadata worker pool.
    pub workers: usize,
    pub download_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            calendar_url: "https://ratsinfo.example.org/si0040.php".into(),
            session_url: "https://ratsinfo.example.org/to0040.php?__ksinr={id}".into(),
            output_dir: PathBuf::from("data"),
            java: PathBuf::from("java"),
            tika_jar: PathBuf::from("tika-app.jar"),
            tika_timeout_secs: 300,
            workers: std::thread::available_parallelism().map_or(4, |n| n.get()),
            download_retries: 3,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn tika_timeout(&self) -> Duration {
        Duration::from_secs(self.tika_timeout_secs.max(1))
    }

    pub fn session_url(&self, id: &str) -> String {
        self.session_url.replace("{id}", id)
    }
}

// ── Tests ──

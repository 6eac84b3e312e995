use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

use crate::error::{FxError, Result};

pub const ENV_URL: &str = "AUDIO_FX_URL";
pub const ENV_TIMEOUT: &str = "AUDIO_FX_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Whole-request limit; a stuck job fails instead of hanging.
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
        }
    }
}

impl ClientSettings {
    /// Defaults, then the settings file (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_settings_path().filter(|p| p.exists()),
        };
        let mut settings = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| FxError::Config(format!("cannot read {}: {e}", path.display())))?;
        let settings: Self = toml::from_str(&text)?;
        debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var(ENV_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = env::var(ENV_TIMEOUT).ok().and_then(|s| s.trim().parse().ok()) {
            self.request_timeout_secs = secs;
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `base_url` joined with `path`, with exactly one slash between them.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "AudioFx", "audio-fx").map(|p| p.config_dir().join("settings.toml"))
}

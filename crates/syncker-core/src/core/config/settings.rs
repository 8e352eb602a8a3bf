use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const INDEX_FILE: &str = "index.json";
const TOKEN_FILE: &str = "token.json";
const CLIENT_SECRETS_FILE: &str = "client_secrets.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub no_color: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn flag(&self, key: &str) -> Option<bool> {
        self.var(key).map(|value| {
            let lowered = value.to_ascii_lowercase();
            !matches!(lowered.as_str(), "0" | "false" | "no" | "off")
        })
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) state: StateConfig,
    pub(crate) drive: DriveConfig,
    pub(crate) progress: Option<bool>,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the state directory cannot be determined or a
    /// variable holds an unusable value.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> anyhow::Result<Self> {
        let dir = match snapshot.var("SYNCKER_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs_next::home_dir()
                .ok_or_else(|| anyhow!("unable to determine the home directory; set SYNCKER_DIR"))?
                .join(".config")
                .join("syncker"),
        };
        let timeout = match snapshot.var("SYNCKER_HTTP_TIMEOUT") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("SYNCKER_HTTP_TIMEOUT must be a number of seconds, got {raw:?}"))?,
            ),
            None => DEFAULT_HTTP_TIMEOUT,
        };
        Ok(Self {
            state: StateConfig { dir },
            drive: DriveConfig {
                api_base: trimmed_base(snapshot.var("SYNCKER_DRIVE_API"), DEFAULT_DRIVE_API),
                upload_base: trimmed_base(snapshot.var("SYNCKER_UPLOAD_API"), DEFAULT_UPLOAD_API),
                timeout,
            },
            progress: snapshot.flag("SYNCKER_PROGRESS"),
        })
    }

    #[must_use]
    pub fn state(&self) -> &StateConfig {
        &self.state
    }

    #[must_use]
    pub fn drive(&self) -> &DriveConfig {
        &self.drive
    }

    /// Explicit progress preference, if `SYNCKER_PROGRESS` is set.
    #[must_use]
    pub fn progress(&self) -> Option<bool> {
        self.progress
    }
}

fn trimmed_base(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).trim_end_matches('/').to_string()
}

/// Where syncker keeps its index and credentials.
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub dir: PathBuf,
}

impl StateConfig {
    #[must_use]
    pub fn index_file(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    #[must_use]
    pub fn token_file(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    #[must_use]
    pub fn client_secrets_file(&self) -> PathBuf {
        self.dir.join(CLIENT_SECRETS_FILE)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_base: String,
    pub upload_base: String,
    pub timeout: Duration,
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::RelayError;

/// Bot configuration parsed from a static JSON file at boot.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Wiki domain the stream is filtered to, e.g. "en.wikipedia.org".
    /// Empty disables the notification pipeline.
    #[serde(default)]
    pub domain: String,

    /// Locale code for formatter strings.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Article path template containing `$1`,
    /// e.g. "https://en.wikipedia.org/wiki/$1".
    pub wiki: String,

    /// Path of the persisted subscription document.
    #[serde(default = "default_streams_path")]
    pub streams_path: PathBuf,

    /// Path of the chat platform token file.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_streams_path() -> PathBuf {
    PathBuf::from("event_streams.json")
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.txt")
}

impl BotConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: BotConfig = serde_json::from_str(&raw)
            .map_err(|e| RelayError::Config(format!("cannot parse {}: {e}", path.display())))?;
        Ok(config)
    }

    /// Load from `WIKIRELAY_CONFIG` if set, `config.json` otherwise.
    pub fn from_default_location() -> Result<Self, RelayError> {
        let path = env::var("WIKIRELAY_CONFIG").unwrap_or_else(|_| "config.json".to_string());
        Self::load(Path::new(&path))
    }

    /// Read the chat platform token from disk. `None` if the file is missing
    /// or blank; the caller decides whether that degrades to a noop backend.
    pub fn read_token(&self) -> Option<String> {
        match fs::read_to_string(&self.token_path) {
            Ok(raw) => {
                let token = raw.trim().to_string();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(e) => {
                warn!(path = %self.token_path.display(), error = %e, "Token file unreadable");
                None
            }
        }
    }
}

use anyhow::{anyhow, Result};
use std::{path::Path, time::Duration};
use toml_edit::{Document, Item};

use crate::{Credentials, PollPolicy};

pub const TRANSCRIBE_TABLE: &str = "transcribe";
pub const ACCESS_KEY_KEY: &str = "access_key";
pub const SECRET_KEY_KEY: &str = "secret_key";
pub const BUCKET_NAME_KEY: &str = "bucket_name";

pub const POLL_TABLE: &str = "poll";
pub const INITIAL_INTERVAL_MS_KEY: &str = "initial_interval_ms";
pub const MAX_INTERVAL_MS_KEY: &str = "max_interval_ms";
pub const MULTIPLIER_KEY: &str = "multiplier";
pub const TIMEOUT_SECS_KEY: &str = "timeout_secs";

/// Immutable configuration for a [crate::Transcriber]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranscribeConfig {
    pub credentials: Credentials,
    pub poll: PollPolicy,
}

impl TranscribeConfig {
    pub fn new(credentials: Credentials) -> Self {
        TranscribeConfig {
            credentials,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Read configuration from a TOML document, looking at the
    /// `[transcribe]` and `[transcribe.poll]` tables. Missing keys are left
    /// unset; a document without a `[transcribe]` table yields the default
    /// (and therefore unavailable) configuration.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let toml: Document = contents.parse()?;

        let transcribe = match toml.get(TRANSCRIBE_TABLE) {
            Some(item @ Item::Table(_)) => item,
            Some(_) => return Err(anyhow!("'{}' must be a table", TRANSCRIBE_TABLE)),
            None => return Ok(TranscribeConfig::default()),
        };

        let credentials = Credentials {
            client_id: get_string(transcribe, ACCESS_KEY_KEY)?,
            client_secret: get_string(transcribe, SECRET_KEY_KEY)?,
            bucket: get_string(transcribe, BUCKET_NAME_KEY)?,
        };

        let mut poll = PollPolicy::default();

        if let Some(table) = transcribe.get(POLL_TABLE) {
            if !table.is_table() {
                return Err(anyhow!(
                    "'{}.{}' must be a table",
                    TRANSCRIBE_TABLE,
                    POLL_TABLE
                ));
            }

            if let Some(millis) = get_u64(table, INITIAL_INTERVAL_MS_KEY)? {
                if millis == 0 {
                    return Err(anyhow!(
                        "'{}' must be greater than zero",
                        INITIAL_INTERVAL_MS_KEY
                    ));
                }
                poll.initial_interval = Duration::from_millis(millis);
            }
            if let Some(millis) = get_u64(table, MAX_INTERVAL_MS_KEY)? {
                poll.max_interval = Duration::from_millis(millis);
            }
            if let Some(multiplier) = get_f64(table, MULTIPLIER_KEY)? {
                if !multiplier.is_finite() || multiplier < 1.0 {
                    return Err(anyhow!(
                        "'{}' must be a finite number no less than 1.0, got {}",
                        MULTIPLIER_KEY,
                        multiplier
                    ));
                }
                poll.multiplier = multiplier;
            }
            if let Some(seconds) = get_u64(table, TIMEOUT_SECS_KEY)? {
                if seconds == 0 {
                    return Err(anyhow!("'{}' must be greater than zero", TIMEOUT_SECS_KEY));
                }
                poll.timeout = Duration::from_secs(seconds);
            }
        }

        if poll.initial_interval > poll.max_interval {
            return Err(anyhow!(
                "'{}' may not exceed '{}'",
                INITIAL_INTERVAL_MS_KEY,
                MAX_INTERVAL_MS_KEY
            ));
        }

        Ok(TranscribeConfig { credentials, poll })
    }

    /// Read configuration from a TOML file on disk
    pub async fn from_path(path: &Path) -> Result<Self> {
        debug!("Reading transcription config at {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&contents)
    }
}

fn get_string(table: &Item, key: &str) -> Result<Option<String>> {
    match table.get(key) {
        Some(item) => item
            .as_str()
            .map(|value| Some(value.to_string()))
            .ok_or_else(|| anyhow!("'{}' must be a string", key)),
        None => Ok(None),
    }
}

fn get_u64(table: &Item, key: &str) -> Result<Option<u64>> {
    match table.get(key) {
        Some(item) => {
            let value = item
                .as_integer()
                .ok_or_else(|| anyhow!("'{}' must be an integer", key))?;
            Ok(Some(u64::try_from(value).map_err(|_| {
                anyhow!("'{}' may not be negative, got {}", key, value)
            })?))
        }
        None => Ok(None),
    }
}

fn get_f64(table: &Item, key: &str) -> Result<Option<f64>> {
    match table.get(key) {
        Some(item) => item
            .as_float()
            .or_else(|| item.as_integer().map(|value| value as f64))
            .map(Some)
            .ok_or_else(|| anyhow!("'{}' must be a number", key)),
        None => Ok(None),
    }
}

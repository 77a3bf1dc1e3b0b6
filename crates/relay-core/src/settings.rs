//! Relay configuration.
//!
//! Assembled once at process start and passed into constructors. Sources,
//! lowest precedence first:
//! 1. built-in defaults
//! 2. a TOML file (`relay.toml` in the working directory, or an explicit path)
//! 3. the fixed environment variables listed in [`ENV_OVERRIDES`]

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_QUEUE_NAME: &str = "deposit-inbound";
pub const DEFAULT_TABLE_NAME: &str = "depositTransaction";
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: i64 = 60;
pub const DEFAULT_POLL_DELAY_MS: i64 = 1500;
pub const DEFAULT_MAX_DEQUEUE: i64 = 5;
pub const DEFAULT_BATCH_SIZE: i64 = 16;
pub const DEFAULT_HTTP_TIMEOUT_SECS: i64 = 100;

/// Suffix of the dead-letter queue derived from the source queue name.
pub const POISON_SUFFIX: &str = "-poison";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Text,
    Integer,
}

/// Environment variable -> config key.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("AZURE_STORAGE_CONNECTION_STRING", "queue.connection_string"),
    ("QUEUE_NAME", "queue.name"),
    ("TABLE_NAME", "table.name"),
    ("ENDPOINT_KEY", "endpoint.key"),
    ("VISIBILITY_TIMEOUT_SEC", "queue.visibility_timeout_seconds"),
    ("POLL_DELAY_MS", "queue.poll_delay_milliseconds"),
    ("MAX_DEQUEUE", "queue.max_dequeue_before_poison"),
];

fn value_type(key: &str) -> ValueType {
    match key {
        "queue.visibility_timeout_seconds"
        | "queue.poll_delay_milliseconds"
        | "queue.max_dequeue_before_poison" => ValueType::Integer,
        _ => ValueType::Text,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("storage connection string is not set (AZURE_STORAGE_CONNECTION_STRING or queue.connection_string)")]
    MissingConnectionString,

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub queue: QueueSettings,
    pub table: TableSettings,
    pub endpoint: EndpointSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub connection_string: String,
    pub name: String,
    pub visibility_timeout_seconds: u64,
    pub poll_delay_milliseconds: u64,
    pub max_dequeue_before_poison: u32,
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(default)]
    pub key: Option<String>,
    pub timeout_seconds: u64,
}

impl RelayConfig {
    /// Load from the process environment and an optional file.
    pub fn from_env(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load(file, |name| std::env::var(name).ok())
    }

    /// Load with an injectable environment lookup.
    ///
    /// Integer variables that do not parse are ignored and the file/default
    /// value is kept.
    pub fn load<F>(file: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .set_default("queue.connection_string", "")?
            .set_default("queue.name", DEFAULT_QUEUE_NAME)?
            .set_default("queue.visibility_timeout_seconds", DEFAULT_VISIBILITY_TIMEOUT_SECS)?
            .set_default("queue.poll_delay_milliseconds", DEFAULT_POLL_DELAY_MS)?
            .set_default("queue.max_dequeue_before_poison", DEFAULT_MAX_DEQUEUE)?
            .set_default("queue.batch_size", DEFAULT_BATCH_SIZE)?
            .set_default("table.name", DEFAULT_TABLE_NAME)?
            .set_default("endpoint.timeout_seconds", DEFAULT_HTTP_TIMEOUT_SECS)?;

        builder = match file {
            Some(path) => {
                info!(path = %path.display(), "loading relay configuration file");
                builder.add_source(config::File::from(path).required(true))
            }
            None => builder.add_source(config::File::with_name("relay").required(false)),
        };

        for (var, key) in ENV_OVERRIDES {
            let Some(raw) = env(var) else { continue };
            builder = match value_type(key) {
                ValueType::Text => builder.set_override(*key, raw)?,
                ValueType::Integer => match raw.trim().parse::<i64>() {
                    Ok(n) => builder.set_override(*key, n)?,
                    Err(_) => {
                        warn!(var, value = %raw, "ignoring non-numeric environment override");
                        builder
                    }
                },
            };
        }

        let relay: RelayConfig = builder.build()?.try_deserialize()?;
        relay.validate()?;
        Ok(relay)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.connection_string.trim().is_empty() {
            return Err(ConfigError::MissingConnectionString);
        }
        if self.queue.name.trim().is_empty() {
            return Err(ConfigError::Invalid("queue.name must not be empty".into()));
        }
        if self.queue.max_dequeue_before_poison == 0 {
            return Err(ConfigError::Invalid(
                "queue.max_dequeue_before_poison must be at least 1".into(),
            ));
        }
        if self.queue.batch_size == 0 {
            return Err(ConfigError::Invalid("queue.batch_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn poison_queue_name(&self) -> String {
        format!("{}{}", self.queue.name, POISON_SUFFIX)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.queue.visibility_timeout_seconds)
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.queue.poll_delay_milliseconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint.timeout_seconds)
    }

    /// Subscription key, if one is configured and not blank.
    pub fn subscription_key(&self) -> Option<&str> {
        self.endpoint
            .key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

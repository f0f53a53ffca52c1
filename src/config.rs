use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::consts::{
    DEFAULT_BIND_ADDRESS, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_LOCAL_OUTPUT, DEFAULT_OBJECT_PREFIX,
    DEFAULT_PROMPT, DEFAULT_REFERENCE_ASSET, VEO_API_BASE, VEO_MODEL_ID,
};
use crate::videogen::poller::PollPolicy;
use crate::videogen::types::AspectRatio;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub veo: VeoConfig,
    pub poll: PollConfig,
    pub delivery: DeliveryConfig,
    pub storage: StorageConfig,
    pub sentry_dsn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VeoConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    /// Fixed image sent as the second reference with every job
    pub reference_asset: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_interval_secs: u64,
    pub max_interval_secs: u64,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryMode {
    Local,
    ObjectStore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    pub local_output: PathBuf,
    /// Where object-store downloads are staged before upload. Defaults to the OS temp dir.
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub prefix: String,
    /// Custom S3-compatible endpoint; public URLs still use the AWS virtual-host form
    pub endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            veo: VeoConfig::default(),
            poll: PollConfig::default(),
            delivery: DeliveryConfig::default(),
            storage: StorageConfig::default(),
            sentry_dsn: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl Default for VeoConfig {
    fn default() -> Self {
        Self {
            api_base: VEO_API_BASE.to_string(),
            api_key: None,
            model: VEO_MODEL_ID.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            negative_prompt: None,
            aspect_ratio: None,
            reference_asset: PathBuf::from(DEFAULT_REFERENCE_ASSET),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_secs: 10,
            max_interval_secs: 60,
            backoff_factor: 1.5,
            max_attempts: 120,
            timeout_secs: 30 * 60,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::Local,
            local_output: PathBuf::from(DEFAULT_LOCAL_OUTPUT),
            temp_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            access_key: None,
            secret_key: None,
            prefix: DEFAULT_OBJECT_PREFIX.to_string(),
            endpoint: None,
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_secs(self.initial_interval_secs),
            max_interval: Duration::from_secs(self.max_interval_secs),
            backoff_factor: self.backoff_factor,
            max_attempts: self.max_attempts,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl StorageConfig {
    /// Bucket, region and both keys must all be present for uploads and listing to work
    pub fn is_complete(&self) -> bool {
        [&self.bucket, &self.region, &self.access_key, &self.secret_key]
            .into_iter()
            .all(|value| non_blank(value).is_some())
    }
}

/// Treats `Some("")` and whitespace-only values the same as unset
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Well-known variable names kept for compatibility with existing `.env` files
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("veo.api_key", "GOOGLE_API_KEY"),
    ("storage.access_key", "AWS_ACCESS_KEY_ID"),
    ("storage.secret_key", "AWS_SECRET_ACCESS_KEY"),
    ("storage.region", "AWS_REGION"),
    ("storage.bucket", "AWS_BUCKET_NAME"),
    ("sentry_dsn", "SENTRY_DSN"),
];

impl AppConfig {
    pub fn load() -> Result<Self> {
        // a missing .env is fine, the process env may already carry everything
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("failed to read .env");
            }
        }

        let builder = Config::builder().add_source(File::with_name("config").required(false));

        Self::from_layers(builder, prefixed_env(), |var| std::env::var(var).ok())
    }

    /// Stacks `REELGEN__*` variables on top of `builder`, then the well-known credential
    /// variables resolved through `lookup`. Blank credential variables are ignored.
    fn from_layers(
        builder: ConfigBuilder<DefaultState>,
        environment: Environment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut builder = builder.add_source(environment);

        for (key, var) in ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder
                .set_override_option(*key, value)
                .with_context(|| format!("invalid override for {key}"))?;
        }

        Self::from_config(builder.build().context("failed to build config")?)
    }

    fn from_config(config: Config) -> Result<Self> {
        config
            .try_deserialize()
            .context("failed to deserialize app config")
    }
}

fn prefixed_env() -> Environment {
    Environment::with_prefix("REELGEN").separator("__")
}

// ============================
// authd-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "authd.toml";

/// Environment variable prefix; nested keys use `__` (e.g. `AUTHD_JWT__SECRET`)
pub const ENV_PREFIX: &str = "AUTHD_";

const MIN_SECRET_LEN: usize = 32;
/// scrypt `log_n` accepted from configuration
const HASH_COST_RANGE: std::ops::RangeInclusive<u8> = 14..=20;
const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_DAY: u64 = 24 * 60 * 60;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,
    /// Per-request deadline applied by the HTTP adapter
    pub request_timeout_secs: u64,
    /// Token signing and lifetimes
    pub jwt: JwtSettings,
    /// Credential/token store backend
    pub storage: StorageSettings,
    /// Password policy and hashing cost
    pub password: PasswordSettings,
    /// Outbound notifications
    pub notifications: NotificationSettings,
    /// Prometheus exporter
    pub metrics: MetricsSettings,
}

/// Token signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    /// HMAC signing secret, shared by every process that verifies tokens
    pub secret: Secret,
    /// Access token lifetime in minutes
    pub access_ttl_minutes: u64,
    /// Refresh token lifetime in days
    pub refresh_ttl_days: u64,
}

/// Which store implementation to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    FlatFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Data directory for the flat-file backend
    pub path: PathBuf,
}

/// Password requirements and hash cost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    /// Minimum password length accepted at sign-up
    pub min_length: usize,
    /// Maximum password length accepted at sign-up
    pub max_length: usize,
    /// scrypt `log_n` work factor
    pub hash_cost: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Send a welcome notification after sign-up
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Serve `/metrics` on a separate listener
    pub enabled: bool,
    pub bind_addr: SocketAddr,
}

/// Signing secret. Never printed, wiped from memory on drop.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 50051)),
            log_level: "info".to_string(),
            log_json: false,
            request_timeout_secs: 10,
            jwt: JwtSettings::default(),
            storage: StorageSettings::default(),
            password: PasswordSettings::default(),
            notifications: NotificationSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: Secret::default(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
            hash_cost: 17,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9464)),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl JwtSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_minutes.saturating_mul(SECS_PER_MINUTE))
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_days.saturating_mul(SECS_PER_DAY))
    }
}

impl Settings {
    /// Load settings from `authd.toml` and `AUTHD_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment(None))
    }

    /// Load settings with an explicit config file layered over `authd.toml`
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_figment(Self::figment(Some(path.as_ref())))
    }

    /// Provider chain: defaults, `authd.toml`, explicit file, environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the service cannot run safely with
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.jwt.secret.is_empty() {
            bail!("jwt.secret must be set");
        }
        if self.jwt.secret.len() < MIN_SECRET_LEN {
            bail!("jwt.secret must be at least {MIN_SECRET_LEN} bytes");
        }
        if self.jwt.access_ttl_minutes == 0 || self.jwt.refresh_ttl_days == 0 {
            bail!("token lifetimes must be greater than zero");
        }
        // Expiry is carried as signed Unix seconds.
        let in_range = |secs: Option<u64>| secs.is_some_and(|s| i64::try_from(s).is_ok());
        if !in_range(self.jwt.access_ttl_minutes.checked_mul(SECS_PER_MINUTE))
            || !in_range(self.jwt.refresh_ttl_days.checked_mul(SECS_PER_DAY))
        {
            bail!("token lifetimes are out of range");
        }
        if self.jwt.access_ttl() >= self.jwt.refresh_ttl() {
            bail!("access token lifetime must be shorter than refresh token lifetime");
        }
        if self.password.min_length == 0 || self.password.min_length > self.password.max_length {
            bail!(
                "invalid password length bounds: {}..={}",
                self.password.min_length,
                self.password.max_length
            );
        }
        if !HASH_COST_RANGE.contains(&self.password.hash_cost) {
            bail!(
                "password.hash_cost must be within {}..={}",
                HASH_COST_RANGE.start(),
                HASH_COST_RANGE.end()
            );
        }
        if self.metrics.enabled && self.metrics.bind_addr == self.bind_addr {
            bail!("metrics.bind_addr must differ from bind_addr");
        }
        Ok(())
    }
}

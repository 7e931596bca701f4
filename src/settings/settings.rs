use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub jwt: Jwt,
    #[serde(default)]
    pub password: Password,
    pub session: Session,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Clone, Deserialize)]
pub struct Jwt {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

// Secrets stay out of the startup log.
impl std::fmt::Debug for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwt")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl Jwt {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

/// Argon2 cost parameters. Defaults match `argon2::Params::default()`.
#[derive(Debug, Clone, Deserialize)]
pub struct Password {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for Password {
    fn default() -> Self {
        Password {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Session {
    pub backend: String, // "redis" or "memory"
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Clone, Deserialize)]
pub struct User {
    pub backend: String, // "mysql" or "memory"
    #[serde(default)]
    pub database_url: Option<String>,
}

// Connection urls usually embed credentials.
fn redact_url(url: Option<&str>) -> Option<&'static str> {
    url.map(|_| "<redacted>")
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.backend)
            .field("redis_url", &redact_url(self.redis_url.as_deref()))
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("backend", &self.backend)
            .field("database_url", &redact_url(self.database_url.as_deref()))
            .finish()
    }
}

fn default_access_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_refresh_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_issuer() -> String {
    "redclass".to_string()
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_key_prefix() -> String {
    "redclass".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "REDCLASS";

/// Upper bound for either token ttl: ten years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let jwt = &self.jwt;
        if jwt.access_secret.is_empty() || jwt.refresh_secret.is_empty() {
            bail!("jwt secrets must not be empty");
        }
        if jwt.access_secret == jwt.refresh_secret {
            bail!("jwt access and refresh secrets must differ");
        }
        if jwt.access_ttl_secs == 0 || jwt.refresh_ttl_secs == 0 {
            bail!("jwt ttls must be positive");
        }
        if jwt.access_ttl_secs > MAX_TTL_SECS || jwt.refresh_ttl_secs > MAX_TTL_SECS {
            bail!("jwt ttls must not exceed {MAX_TTL_SECS} seconds");
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        Ok(())
    }
}

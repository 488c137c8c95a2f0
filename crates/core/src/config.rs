use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr};

pub const DEFAULT_TARGET_LANG: &str = "en";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 16;
pub const AUTO_SOURCE_LANG: &str = "auto";
pub const ENV_DEEPL_API_KEY: &str = "DEEPL_API_KEY";
pub const ENV_DEEPL_BASE_URL: &str = "DEEPL_BASE_URL";
pub const ENV_BIND_ADDR: &str = "DOC_TRANSLATOR_BIND";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetLang(String);

impl TargetLang {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyTargetLang);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TargetLang {
    fn default() -> Self {
        Self(DEFAULT_TARGET_LANG.to_owned())
    }
}

impl fmt::Display for TargetLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Language the input is written in. `Auto` leaves detection to the
/// translation service.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceLang {
    #[default]
    Auto,
    Code(String),
}

impl SourceLang {
    pub fn parse(value: &str) -> Self {
        let v = value.trim();
        if v.is_empty() || v.eq_ignore_ascii_case(AUTO_SOURCE_LANG) {
            Self::Auto
        } else {
            Self::Code(v.to_owned())
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Auto => None,
            Self::Code(c) => Some(c),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for SourceLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().unwrap_or(AUTO_SOURCE_LANG))
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub deepl: Option<ApiKey>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadLimit {
    pub max_mb: u64,
}

impl UploadLimit {
    pub fn new(max_mb: u64) -> Result<Self, ConfigError> {
        if max_mb == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        Ok(Self { max_mb })
    }

    pub fn bytes(&self) -> usize {
        let b = self.max_mb.saturating_mul(1024 * 1024);
        usize::try_from(b).unwrap_or(usize::MAX)
    }
}

impl Default for UploadLimit {
    fn default() -> Self {
        Self {
            max_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub upload_limit: UploadLimit,
}

impl ServerConfig {
    pub fn new(bind: &str, upload_limit: UploadLimit) -> Result<Self, ConfigError> {
        let bind = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind.to_owned()))?;
        Ok(Self { bind, upload_limit })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            upload_limit: UploadLimit::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub api_keys: ApiKeys,
    pub deepl_base_url: Option<String>,
    pub server: ServerConfig,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target language must not be empty")]
    EmptyTargetLang,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("upload limit must be > 0 MB")]
    ZeroUploadLimit,
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::intake::access::{AccessCodeDirectory, AccessGrant};

const DEFAULT_BOOKING_BASE_URL: &str = "https://axisperformance.janeapp.com";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: StoreSettings,
    pub intake: IntakeConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::default_for(environment),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            store: StoreSettings::from_env()?,
            intake: IntakeConfig::from_env()?,
            admin: AdminConfig {
                api_token: non_empty_var("ADMIN_API_TOKEN"),
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Line format for emitted events. Production defaults to JSON for log shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }

    pub fn default_for(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Production => Self::Json,
            AppEnvironment::Development | AppEnvironment::Test => Self::Compact,
        }
    }
}

/// Which lead store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackendKind {
    Postgrest,
    Memory,
}

/// Resolved persistence settings. Missing credentials degrade the service instead of
/// aborting startup.
#[derive(Debug, Clone)]
pub enum StoreSettings {
    Memory {
        venture_id: Option<String>,
    },
    Configured(StoreConfig),
    Missing {
        missing: Vec<&'static str>,
        venture_id: Option<String>,
    },
}

impl StoreSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let kind = match env::var("LEADS_STORE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "postgrest" | "supabase" => StoreBackendKind::Postgrest,
            "memory" | "in-memory" => StoreBackendKind::Memory,
            other => return Err(ConfigError::InvalidStoreBackend(other.to_string())),
        };

        let venture_id = non_empty_var("VENTURE_ID");
        if kind == StoreBackendKind::Memory {
            return Ok(Self::Memory { venture_id });
        }

        let timeout_secs = match non_empty_var("LEADS_STORE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidStoreTimeout)?,
            None => DEFAULT_STORE_TIMEOUT_SECS,
        };

        let url = non_empty_var("LEADS_STORE_URL");
        let api_key = non_empty_var("LEADS_STORE_KEY");
        Ok(Self::resolve(url, api_key, venture_id, timeout_secs))
    }

    pub fn resolve(
        url: Option<String>,
        api_key: Option<String>,
        venture_id: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        match (url, api_key) {
            (Some(url), Some(api_key)) => Self::Configured(StoreConfig {
                url: url.trim_end_matches('/').to_string(),
                api_key,
                venture_id,
                timeout: Duration::from_secs(timeout_secs),
            }),
            (url, api_key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("LEADS_STORE_URL");
                }
                if api_key.is_none() {
                    missing.push("LEADS_STORE_KEY");
                }
                Self::Missing {
                    missing,
                    venture_id,
                }
            }
        }
    }

    pub fn venture_id(&self) -> Option<&str> {
        match self {
            Self::Memory { venture_id } | Self::Missing { venture_id, .. } => venture_id.as_deref(),
            Self::Configured(config) => config.venture_id.as_deref(),
        }
    }

    /// User-facing reason submissions are disabled, if any.
    pub fn configuration_issue(&self) -> Option<String> {
        match self {
            Self::Missing { missing, .. } => Some(format!(
                "Configuration Error: lead storage is not configured ({} missing). Submissions are disabled.",
                missing.join(", ")
            )),
            _ => None,
        }
    }

    /// Short label for the project behind the store URL, used in confirmations.
    pub fn project_ref(&self) -> String {
        match self {
            Self::Configured(config) => config.project_ref(),
            Self::Memory { .. } => "local".to_string(),
            Self::Missing { .. } => "unknown".to_string(),
        }
    }
}

/// Connection details for the PostgREST lead store.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    pub venture_id: Option<String>,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn project_ref(&self) -> String {
        let host = self
            .url
            .split("://")
            .nth(1)
            .unwrap_or(self.url.as_str());
        match host.split_once('.') {
            Some((label, _)) if !label.is_empty() => label.to_string(),
            _ => "unknown".to_string(),
        }
    }

    /// Operator diagnostic that never reveals the full key.
    pub fn masked_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &self.masked_key())
            .field("venture_id", &self.venture_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return format!("**** ({} chars)", chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail} ({} chars)", chars.len())
}

/// Intake funnel knobs: booking links and the corporate access-code directory.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub booking_base_url: String,
    pub access_codes: AccessCodeDirectory,
}

impl IntakeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let booking_base_url = non_empty_var("BOOKING_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BOOKING_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let access_codes = match non_empty_var("INTAKE_ACCESS_CODES") {
            Some(raw) => parse_access_codes(&raw)?,
            None => AccessCodeDirectory::default(),
        };

        Ok(Self {
            booking_base_url,
            access_codes,
        })
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            booking_base_url: DEFAULT_BOOKING_BASE_URL.to_string(),
            access_codes: AccessCodeDirectory::default(),
        }
    }
}

/// Parses `CODE=Entity Name|https://booking;CODE2=Other`.
pub fn parse_access_codes(raw: &str) -> Result<AccessCodeDirectory, ConfigError> {
    let mut directory = AccessCodeDirectory::empty();
    for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (code, grant) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidAccessCode(entry.to_string()))?;
        let (entity_name, booking_url) = match grant.split_once('|') {
            Some((name, url)) => (name.trim(), Some(url.trim().to_string())),
            None => (grant.trim(), None),
        };
        if code.trim().is_empty() || entity_name.is_empty() {
            return Err(ConfigError::InvalidAccessCode(entry.to_string()));
        }
        directory.insert(
            code,
            AccessGrant {
                entity_name: entity_name.to_string(),
                booking_url: booking_url.filter(|url| !url.is_empty()),
            },
        );
    }
    Ok(directory)
}

/// Admin surface access.
#[derive(Clone, Default)]
pub struct AdminConfig {
    pub api_token: Option<String>,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("api_token", &self.api_token.as_deref().map(mask_secret))
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidStoreBackend(String),
    InvalidStoreTimeout,
    InvalidAccessCode(String),
    InvalidLogFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStoreBackend(value) => {
                write!(f, "LEADS_STORE must be 'postgrest' or 'memory' (got '{value}')")
            }
            ConfigError::InvalidStoreTimeout => {
                write!(f, "LEADS_STORE_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidAccessCode(entry) => write!(
                f,
                "INTAKE_ACCESS_CODES entry '{entry}' must look like CODE=Entity[|url]"
            ),
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json' (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

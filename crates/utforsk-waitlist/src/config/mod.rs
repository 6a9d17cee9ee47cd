use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub waitlist: WaitlistConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            waitlist: WaitlistConfig::from_env()?,
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
}

/// Waitlist backend selection and session housekeeping.
#[derive(Debug, Clone)]
pub struct WaitlistConfig {
    /// `None` when the hosted backend is not configured; the service then runs
    /// in demo mode against the simulated gateway.
    pub backend: Option<BackendConfig>,
    pub demo_delay: Duration,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl WaitlistConfig {
    pub const DEFAULT_TABLE: &'static str = "waitlist";
    pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;

    fn from_env() -> Result<Self, ConfigError> {
        let url = first_non_empty(&["SUPABASE_URL", "VITE_SUPABASE_URL"]);
        let anon_key = first_non_empty(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]);
        let table = first_non_empty(&["WAITLIST_TABLE"])
            .unwrap_or_else(|| Self::DEFAULT_TABLE.to_string());
        let request_timeout =
            Duration::from_secs(parse_number("WAITLIST_REQUEST_TIMEOUT_SECS", 10)?);

        let backend = match (url, anon_key) {
            (Some(url), Some(anon_key)) => Some(BackendConfig {
                url,
                anon_key,
                table,
                request_timeout,
            }),
            _ => None,
        };

        Ok(Self {
            backend,
            demo_delay: Duration::from_millis(parse_number("WAITLIST_DEMO_DELAY_MS", 1000)?),
            session_ttl: Duration::from_secs(parse_number("WAITLIST_SESSION_TTL_SECS", 3600)?),
            max_sessions: usize::try_from(parse_number(
                "WAITLIST_MAX_SESSIONS",
                Self::DEFAULT_MAX_SESSIONS,
            )?)
            .unwrap_or(usize::MAX),
        })
    }
}

/// Connection parameters for the hosted waitlist table.
#[derive(Clone)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("table", &self.table)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn first_non_empty(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parse_number(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        _ => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

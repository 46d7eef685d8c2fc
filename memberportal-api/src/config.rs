/// Configuration management for the API server
///
/// Configuration comes from environment variables, with an optional `.env`
/// file loaded first for development.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default: *)
/// - `PRODUCTION`: enables HSTS and `Secure` cookies (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `REDIS_URL`: session store (required)
/// - `SESSION_TTL_SECONDS`: session lifetime (default: 604800, seven days; at most ten years)
/// - `SESSION_COOKIE_NAME`: cookie name (default: portal_session)
/// - `BOOTSTRAP_ADMIN_USERNAME`: first admin's username (default: admin)
/// - `BOOTSTRAP_ADMIN_PASSWORD`: first admin's password (bootstrap skipped when unset)
/// - `ALLOW_REGISTRATION`: mounts `POST /api/register` (default: false)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
///
/// # Example
///
/// ```no_run
/// use memberportal_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use memberportal_shared::auth::middleware::DEFAULT_SESSION_COOKIE;
use memberportal_shared::auth::session::MAX_SESSION_TTL_SECONDS;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Seven days
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 604_800;

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub redis: RedisSettings,
    pub session: SessionConfig,
    pub bootstrap: BootstrapConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Served over HTTPS: turns on HSTS and `Secure` cookies
    pub production: bool,

    /// Whether `POST /api/register` is mounted
    pub allow_registration: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            production: false,
            allow_registration: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_seconds: u64,
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

/// First-admin bootstrap settings
#[derive(Clone)]
pub struct BootstrapConfig {
    pub admin_username: String,

    /// Plaintext; only read once at startup
    pub admin_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: None,
        }
    }
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` or `REDIS_URL` is missing, or a
    /// variable holds an unparseable value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = var("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let ttl_seconds = var("SESSION_TTL_SECONDS", &DEFAULT_SESSION_TTL_SECONDS.to_string())
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("SESSION_TTL_SECONDS is invalid: {}", e))?;
        if ttl_seconds > MAX_SESSION_TTL_SECONDS {
            anyhow::bail!(
                "SESSION_TTL_SECONDS must be at most {}, got {}",
                MAX_SESSION_TTL_SECONDS,
                ttl_seconds
            );
        }

        let cookie_name = var("SESSION_COOKIE_NAME", DEFAULT_SESSION_COOKIE);
        if cookie_name.is_empty() || cookie_name.contains([';', '=', ' ', ',']) {
            anyhow::bail!("SESSION_COOKIE_NAME '{}' is not a valid cookie name", cookie_name);
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port,
                cors_origins,
                production: parse_bool("PRODUCTION", lookup("PRODUCTION"))?,
                allow_registration: parse_bool(
                    "ALLOW_REGISTRATION",
                    lookup("ALLOW_REGISTRATION"),
                )?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections,
            },
            redis: RedisSettings {
                url: required("REDIS_URL")?,
            },
            session: SessionConfig {
                ttl_seconds,
                cookie_name,
            },
            bootstrap: BootstrapConfig {
                admin_username: var("BOOTSTRAP_ADMIN_USERNAME", "admin"),
                admin_password: lookup("BOOTSTRAP_ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            },
            log_format: var("LOG_FORMAT", "pretty").parse()?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(key: &str, value: Option<String>) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            other => anyhow::bail!("{} must be a boolean, got '{}'", key, other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgresql://localhost/portal"),
        ("REDIS_URL", "redis://localhost:6379"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert!(!config.api.allow_registration);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.session.ttl_seconds, 604_800);
        assert_eq!(config.session.cookie_name, "portal_session");
        assert_eq!(config.bootstrap.admin_username, "admin");
        assert!(config.bootstrap.admin_password.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("PRODUCTION", "true"),
            ("ALLOW_REGISTRATION", "1"),
            ("SESSION_TTL_SECONDS", "60"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "s3cret"),
            ("LOG_FORMAT", "json"),
        ]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.api.production);
        assert!(config.api.allow_registration);
        assert_eq!(config.session.ttl_seconds, 60);
        assert_eq!(config.bootstrap.admin_password.as_deref(), Some("s3cret"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup(&[("REDIS_URL", "redis://localhost")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PRODUCTION", "maybe"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("API_PORT", "eighty"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_COOKIE_NAME", "bad;name"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_session_ttl_upper_bound() {
        let too_long = (MAX_SESSION_TTL_SECONDS + 1).to_string();
        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_TTL_SECONDS", too_long.as_str()));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_SECONDS"));

        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_TTL_SECONDS", "18446744073709551615"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());

        let longest = MAX_SESSION_TTL_SECONDS.to_string();
        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_TTL_SECONDS", longest.as_str()));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.session.ttl_seconds, MAX_SESSION_TTL_SECONDS);
    }

    #[test]
    fn test_bootstrap_password_redacted_in_debug() {
        let bootstrap = BootstrapConfig {
            admin_username: "root".to_string(),
            admin_password: Some("hunter2".to_string()),
        };

        let debug = format!("{:?}", bootstrap);
        assert!(debug.contains("root"));
        assert!(!debug.contains("hunter2"));
    }
}

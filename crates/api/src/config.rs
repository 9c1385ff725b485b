use crate::auth::jwt::JwtConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is plain text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Credentials for the first-run super admin.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Maximum database connections (default: `20`).
    pub db_max_connections: u32,
    /// Login attempts allowed per client IP + email per minute (default: `10`).
    pub login_rate_limit_per_min: u32,
    /// Take the client IP from `X-Forwarded-For` instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header (default: `false`).
    pub trust_proxy_headers: bool,
    /// Interval of the expired-session cleanup job (default: `3600`).
    pub session_cleanup_interval_secs: u64,
    pub log_format: LogFormat,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Set when both bootstrap variables are present.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`         | `30`                    |
    /// | `DB_MAX_CONNECTIONS`            | `20`                    |
    /// | `LOGIN_RATE_LIMIT_PER_MIN`      | `10`                    |
    /// | `TRUST_PROXY_HEADERS`           | `false`                 |
    /// | `SESSION_CLEANUP_INTERVAL_SECS` | `3600`                  |
    /// | `LOG_FORMAT`                    | `text`                  |
    /// | `BOOTSTRAP_ADMIN_EMAIL`         | unset                   |
    /// | `BOOTSTRAP_ADMIN_PASSWORD`      | unset                   |
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers and when `JWT_SECRET` is missing, so
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let login_rate_limit_per_min: u32 = std::env::var("LOGIN_RATE_LIMIT_PER_MIN")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("LOGIN_RATE_LIMIT_PER_MIN must be a valid u32");

        let trust_proxy_headers: bool = std::env::var("TRUST_PROXY_HEADERS")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("TRUST_PROXY_HEADERS must be true or false");

        let session_cleanup_interval_secs: u64 = std::env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SESSION_CLEANUP_INTERVAL_SECS must be a valid u64");

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            db_max_connections,
            login_rate_limit_per_min,
            trust_proxy_headers,
            session_cleanup_interval_secs,
            log_format: LogFormat::from_env(),
            jwt: JwtConfig::from_env(),
            bootstrap_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_password_is_not_logged() {
        let admin = BootstrapAdmin {
            email: "root@example.com".into(),
            password: "hunter2hunter2".into(),
        };
        let rendered = format!("{admin:?}");
        assert!(rendered.contains("root@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}

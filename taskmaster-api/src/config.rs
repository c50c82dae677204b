/// Configuration management for the API server
///
/// Configuration is read once at startup from environment variables (after
/// loading a `.env` file if present) into a typed [`Config`].
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 3000)
/// - `APP_ENV`: `production` enables secure cookies, HSTS and hides stack traces
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `APP_URL`: Public URL used in invitation links (default: http://localhost:3000)
/// - `DATABASE_URL`: PostgreSQL connection string; if unset it is composed from
///   `PG_HOST`, `PG_PORT`, `PG_USER`, `PG_PASSWORD` and `PG_DATABASE`
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `ACCESS_TOKEN_SECRET` (or `JWT_SECRET`): Token signing secret. Optional at
///   startup; without it every authenticated route answers with a server error.
/// - `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM`: HTTP mail relay for
///   invitation emails. Without a URL, invitations are only logged.
///
/// # Example
///
/// ```no_run
/// use taskmaster_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

/// Minimum accepted length of the signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Running with `APP_ENV=production`
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Public base URL of the frontend, without trailing slash
    pub app_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret; `None` when not configured
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Endpoint that accepts `{from, to, subject, text, html}` as JSON
    pub api_url: Option<String>,

    /// Sent as a bearer token when present
    pub api_key: Option<String>,

    pub from: String,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed or the signing
    /// secret is set but shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    ///
    /// Empty values are treated as unset.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?,
            None => 3000,
        };

        let production = var("APP_ENV").as_deref() == Some("production");

        let cors_origins = var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let app_url = var("APP_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => compose_database_url(&var),
        };

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a number: {}", e))?,
            None => 10,
        };

        let secret = var("ACCESS_TOKEN_SECRET").or_else(|| var("JWT_SECRET"));
        if let Some(secret) = &secret {
            if secret.len() < MIN_SECRET_LENGTH {
                anyhow::bail!(
                    "ACCESS_TOKEN_SECRET must be at least {} characters long",
                    MIN_SECRET_LENGTH
                );
            }
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
                app_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret },
            mail: MailConfig {
                api_url: var("MAIL_API_URL"),
                api_key: var("MAIL_API_KEY"),
                from: var("MAIL_FROM").unwrap_or_else(|| "no-reply@taskmaster.local".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt.secret.as_deref()
    }
}

fn compose_database_url(var: &dyn Fn(&str) -> Option<String>) -> String {
    let host = var("PG_HOST").unwrap_or_else(|| "localhost".to_string());
    let port = var("PG_PORT").unwrap_or_else(|| "5432".to_string());
    let user = var("PG_USER").unwrap_or_else(|| "postgres".to_string());
    let database = var("PG_DATABASE").unwrap_or_else(|| "taskmaster".to_string());

    match var("PG_PASSWORD") {
        Some(password) => format!("postgresql://{}:{}@{}:{}/{}", user, password, host, port, database),
        None => format!("postgresql://{}@{}:{}/{}", user, host, port, database),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(!config.api.production);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.api.app_url, "http://localhost:3000");
        assert_eq!(
            config.database.url,
            "postgresql://postgres@localhost:5432/taskmaster"
        );
        assert_eq!(config.database.max_connections, 10);
        assert!(config.jwt_secret().is_none());
        assert!(config.mail.api_url.is_none());
        assert_eq!(config.mail.from, "no-reply@taskmaster.local");
    }

    #[test]
    fn test_database_url_composed_from_parts() {
        let config = config_from(&[
            ("PG_HOST", "db"),
            ("PG_PORT", "6543"),
            ("PG_USER", "tm"),
            ("PG_PASSWORD", "pw"),
            ("PG_DATABASE", "tasks"),
        ])
        .unwrap();
        assert_eq!(config.database.url, "postgresql://tm:pw@db:6543/tasks");
    }

    #[test]
    fn test_database_url_wins_over_parts() {
        let config = config_from(&[
            ("DATABASE_URL", "postgresql://x@y/z"),
            ("PG_HOST", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.database.url, "postgresql://x@y/z");
    }

    #[test]
    fn test_production_and_origins() {
        let config = config_from(&[
            ("APP_ENV", "production"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("APP_URL", "https://app.example/"),
        ])
        .unwrap();

        assert!(config.api.production);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.api.app_url, "https://app.example");
    }

    #[test]
    fn test_secret_alias_and_length() {
        let secret = "0123456789abcdef0123456789abcdef";
        let config = config_from(&[("JWT_SECRET", secret)]).unwrap();
        assert_eq!(config.jwt_secret(), Some(secret));

        assert!(config_from(&[("ACCESS_TOKEN_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_invalid_port() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }
}

use std::net::{IpAddr, SocketAddr};

/// Secret used when `JWT_*_SECRET` is unset. Refused in production.
const DEV_JWT_SECRET: &str = "dev-only-secret-change-me-in-production";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: IpAddr,
    pub server_port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub jwt_access_expiration_secs: u64,
    pub jwt_refresh_expiration_secs: u64,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub frontend_url: String,
    /// Base URL under which uploaded files are publicly reachable.
    pub public_url: String,
    pub upload_dir: String,
    pub default_thumbnail_url: String,
    pub default_profile_image_url: String,
    /// When set, rate-limit counters live in Redis and are shared across instances.
    pub redis_url: Option<String>,
    pub rate_limit_max_requests: u64,
    pub rate_limit_window_secs: u64,
    /// Take the client address from `X-Forwarded-For`/`X-Real-IP`. Only safe behind a proxy
    /// that overwrites those headers.
    pub trust_proxy: bool,
}

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `DATABASE_URL`
    /// Optional with defaults: `SERVER_HOST`, `SERVER_PORT`, `ENVIRONMENT`, `LOG_LEVEL`,
    /// `JWT_*`, `GOOGLE_*`, `FRONTEND_URL`, `PUBLIC_URL`, `UPLOAD_DIR`, `DEFAULT_*_URL`,
    /// `REDIS_URL`, `RATE_LIMIT_*`, `TRUST_PROXY`.
    ///
    /// On Railway, `PORT` overrides `SERVER_PORT` and host defaults to `0.0.0.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is not set, if a numeric or address variable
    /// holds an invalid value, or if production is started with the development JWT secret.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let environment = match std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let server_port = std::env::var("PORT")
            .or_else(|_| std::env::var("SERVER_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT / PORT must be a valid u16"))?;

        let default_host = if environment == Environment::Production {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let server_host = std::env::var("SERVER_HOST")
            .unwrap_or_else(|_| default_host.to_string())
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("SERVER_HOST must be a valid IP address"))?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_access_secret =
            std::env::var("JWT_ACCESS_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());
        let jwt_refresh_secret =
            std::env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());

        if environment == Environment::Production
            && (jwt_access_secret == DEV_JWT_SECRET || jwt_refresh_secret == DEV_JWT_SECRET)
        {
            return Err(anyhow::anyhow!(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must be set in production"
            ));
        }

        let jwt_access_expiration_secs = env_u64("JWT_ACCESS_EXPIRATION_SECS", 15 * 60)?;
        let jwt_refresh_expiration_secs =
            env_u64("JWT_REFRESH_EXPIRATION_SECS", 30 * 24 * 60 * 60)?;

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
        let public_url = std::env::var("PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{server_port}"));

        Ok(Self {
            database_url,
            server_host,
            server_port,
            environment,
            log_level,
            jwt_access_secret,
            jwt_refresh_secret,
            jwt_access_expiration_secs,
            jwt_refresh_expiration_secs,
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_redirect_uri: std::env::var("GOOGLE_REDIRECT_URI").unwrap_or_default(),
            frontend_url,
            public_url,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            default_thumbnail_url: std::env::var("DEFAULT_THUMBNAIL_URL")
                .unwrap_or_else(|_| "/static/default-thumbnail.png".to_string()),
            default_profile_image_url: std::env::var("DEFAULT_PROFILE_IMAGE_URL")
                .unwrap_or_else(|_| "/static/default-profile.png".to_string()),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            rate_limit_max_requests: env_u64("RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window_secs: env_u64("RATE_LIMIT_WINDOW_SECS", 60)?,
            trust_proxy: matches!(
                std::env::var("TRUST_PROXY").as_deref(),
                Ok("1" | "true")
            ),
        })
    }

    /// Build the socket address for the server to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }

    /// Session cookies are only marked `Secure` outside local development.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment != Environment::Development
    }
}

fn env_u64(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{name} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> Config {
        Config {
            database_url: String::new(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 3000,
            environment,
            log_level: "info".to_string(),
            jwt_access_secret: "a".to_string(),
            jwt_refresh_secret: "r".to_string(),
            jwt_access_expiration_secs: 900,
            jwt_refresh_expiration_secs: 2_592_000,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_redirect_uri: String::new(),
            frontend_url: "http://localhost:3001".to_string(),
            public_url: "http://localhost:3000".to_string(),
            upload_dir: "uploads".to_string(),
            default_thumbnail_url: String::new(),
            default_profile_image_url: String::new(),
            redis_url: None,
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 60,
            trust_proxy: false,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config(Environment::Development).socket_addr();
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn secure_cookies_outside_development() {
        assert!(!config(Environment::Development).secure_cookies());
        assert!(config(Environment::Staging).secure_cookies());
        assert!(config(Environment::Production).secure_cookies());
    }
}

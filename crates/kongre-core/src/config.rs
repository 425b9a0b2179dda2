//! Configuration module
//!
//! Settings are read from the process environment (after loading `.env` if present),
//! defaulted, and validated once at startup. An invalid configuration is a startup error.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const TRUSTED_PROXY_COUNT: usize = 1;
const UPLOAD_URL_TTL_SECS: u64 = 600;
const FILE_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const RATE_LIMIT_MAX_REQUESTS: u32 = 5;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;
const SMTP_PORT: u16 = 587;
const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;
pub const MAX_PAPER_SIZE_MB: u64 = 10;
const MIN_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub trusted_proxy_count: usize,
    /// `LOG_FORMAT=json` switches log output to one JSON object per line
    pub log_json: bool,
    /// Base URL used when minting links that point back at this service
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub submission_bucket: String,
    pub asset_bucket: String,
    pub past_papers_bucket: String,
    /// Buckets readable without a signature
    pub public_buckets: Vec<String>,
    pub upload_url_ttl_secs: u64,
    pub file_url_ttl_secs: u64,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, R2, ...)
    pub local_storage_path: Option<String>,
    pub signing_secret: Option<String>,
}

impl StorageConfig {
    pub fn is_public(&self, bucket: &str) -> bool {
        self.public_buckets.iter().any(|b| b == bucket)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitBackend {
    Redis,
    Memory,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub backend: RateLimitBackend,
    pub redis_url: Option<String>,
    pub max_requests: u32,
    pub window_secs: u64,
    pub key_prefix: String,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub from_email: Option<String>,
    pub organizer_email: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub cookie_prefix: String,
    pub refresh_cookie_max_age_secs: i64,
}

#[derive(Clone, Debug)]
pub struct SubmissionConfig {
    pub max_paper_size_bytes: u64,
}

/// Service configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
    pub email: EmailConfig,
    pub auth: AuthConfig,
    pub submission: SubmissionConfig,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_source<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let list = |key: &str, default: &str| -> Vec<String> {
            var(key)
                .unwrap_or_else(|| default.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        let flag = |key: &str, default: bool| -> bool {
            var(key)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(default)
        };

        let port = var("PORT")
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse()
            .unwrap_or(DEFAULT_PORT);

        let server = ServerConfig {
            port,
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            cors_origins: list("CORS_ORIGINS", "*"),
            trusted_proxy_count: var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|| TRUSTED_PROXY_COUNT.to_string())
                .parse()
                .unwrap_or(TRUSTED_PROXY_COUNT),
            log_json: var("LOG_FORMAT")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("json")),
            public_base_url: non_empty("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),
        };

        let database = DatabaseConfig {
            url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            max_connections: var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        };

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };
        let storage = StorageConfig {
            backend,
            submission_bucket: non_empty("SUBMISSION_BUCKET")
                .ok_or_else(|| anyhow::anyhow!("SUBMISSION_BUCKET must be set"))?,
            asset_bucket: non_empty("ASSET_BUCKET").unwrap_or_else(|| "assets".to_string()),
            past_papers_bucket: non_empty("PAST_PAPERS_BUCKET")
                .unwrap_or_else(|| "pastpapers".to_string()),
            public_buckets: list("STORAGE_PUBLIC_BUCKETS", ""),
            upload_url_ttl_secs: var("UPLOAD_URL_TTL_SECS")
                .unwrap_or_else(|| UPLOAD_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_URL_TTL_SECS),
            file_url_ttl_secs: var("FILE_URL_TTL_SECS")
                .unwrap_or_else(|| FILE_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(FILE_URL_TTL_SECS),
            s3_region: non_empty("S3_REGION").or_else(|| non_empty("AWS_REGION")),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            signing_secret: non_empty("STORAGE_SIGNING_SECRET"),
        };

        let redis_url = non_empty("REDIS_URL");
        let rate_limit_backend = match non_empty("RATE_LIMIT_BACKEND")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Some("redis") => RateLimitBackend::Redis,
            Some("memory") => RateLimitBackend::Memory,
            Some(other) => {
                return Err(anyhow::anyhow!("Invalid rate limit backend: {}", other));
            }
            None if redis_url.is_some() => RateLimitBackend::Redis,
            None => RateLimitBackend::Memory,
        };
        let rate_limit = RateLimitConfig {
            backend: rate_limit_backend,
            redis_url,
            max_requests: var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|| RATE_LIMIT_MAX_REQUESTS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_MAX_REQUESTS),
            window_secs: var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|| RATE_LIMIT_WINDOW_SECS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_WINDOW_SECS),
            key_prefix: non_empty("RATE_LIMIT_KEY_PREFIX").unwrap_or_else(|| "kongre".to_string()),
        };

        let email = EmailConfig {
            enabled: flag("NOTIFICATIONS_ENABLED", false),
            smtp_host: non_empty("SMTP_HOST"),
            smtp_port: var("SMTP_PORT")
                .unwrap_or_else(|| SMTP_PORT.to_string())
                .parse()
                .unwrap_or(SMTP_PORT),
            smtp_user: non_empty("SMTP_USER"),
            smtp_password: non_empty("SMTP_PASSWORD"),
            smtp_tls: flag("SMTP_TLS", true),
            from_email: non_empty("FROM_EMAIL"),
            organizer_email: non_empty("ORGANIZER_EMAIL"),
        };

        let auth = AuthConfig {
            jwt_secret: var("AUTH_JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("AUTH_JWT_SECRET must be set"))?,
            jwt_audience: non_empty("AUTH_JWT_AUDIENCE")
                .unwrap_or_else(|| "authenticated".to_string()),
            cookie_prefix: non_empty("SESSION_COOKIE_PREFIX")
                .unwrap_or_else(|| "kongre".to_string()),
            refresh_cookie_max_age_secs: var("REFRESH_COOKIE_MAX_AGE_SECS")
                .unwrap_or_else(|| REFRESH_COOKIE_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(REFRESH_COOKIE_MAX_AGE_SECS),
        };

        let max_paper_size_mb = var("MAX_PAPER_SIZE_MB")
            .unwrap_or_else(|| MAX_PAPER_SIZE_MB.to_string())
            .parse()
            .unwrap_or(MAX_PAPER_SIZE_MB);
        let submission = SubmissionConfig {
            max_paper_size_bytes: max_paper_size_mb * 1024 * 1024,
        };

        let config = Config {
            server,
            database,
            storage,
            rate_limit,
            email,
            auth,
            submission,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Set explicit allowed origins."
            ));
        }

        if !self.database.url.starts_with("postgres://")
            && !self.database.url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "AUTH_JWT_SECRET must be at least {} characters long",
                MIN_SECRET_LEN
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                match self.storage.signing_secret {
                    Some(ref secret) if secret.len() >= MIN_SECRET_LEN => {}
                    _ => {
                        return Err(anyhow::anyhow!(
                            "STORAGE_SIGNING_SECRET must be at least {} characters when using local storage backend",
                            MIN_SECRET_LEN
                        ));
                    }
                }
            }
        }

        if self.storage.upload_url_ttl_secs == 0 || self.storage.file_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_URL_TTL_SECS and FILE_URL_TTL_SECS must be greater than zero"
            ));
        }

        if self.rate_limit.backend == RateLimitBackend::Redis && self.rate_limit.redis_url.is_none()
        {
            return Err(anyhow::anyhow!(
                "REDIS_URL must be set when RATE_LIMIT_BACKEND=redis"
            ));
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_SECS must be greater than zero"
            ));
        }

        if self.email.enabled {
            if self.email.smtp_host.is_none() {
                return Err(anyhow::anyhow!(
                    "NOTIFICATIONS_ENABLED=true requires SMTP_HOST to be set"
                ));
            }
            for (key, value) in [
                ("FROM_EMAIL", &self.email.from_email),
                ("ORGANIZER_EMAIL", &self.email.organizer_email),
            ] {
                match value {
                    Some(addr) if addr.contains('@') => {}
                    _ => {
                        return Err(anyhow::anyhow!(
                            "NOTIFICATIONS_ENABLED=true requires {} to be a valid address",
                            key
                        ));
                    }
                }
            }
        }

        if self.submission.max_paper_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_PAPER_SIZE_MB must be greater than zero"));
        }

        Ok(())
    }
}

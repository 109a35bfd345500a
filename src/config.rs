use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// When absent the API runs against the in-memory document store.
    pub database_url: Option<String>,
    pub redis_url: String,
    pub jwt_secret: String,
    pub media_dir: String,
    pub public_base_url: String,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    pub contact_rate_limit: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            jwt_secret: required("JWT_SECRET")?,
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "/data/media".into()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            contact_rate_limit: env::var("CONTACT_RATE_LIMIT")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

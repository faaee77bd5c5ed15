// src/config.rs

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,

    /// Base of every public URL handed out (object reads, OAuth redirects).
    pub public_base_url: String,
    pub storage_root: PathBuf,
    pub storage_bucket: String,

    pub static_dir: PathBuf,
    pub login_path: String,

    pub oauth_authorize_url: Option<String>,
    pub oauth_providers: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let oauth_providers = env::var("OAUTH_PROVIDERS")
            .unwrap_or_else(|_| "google".to_string())
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            public_base_url,
            storage_root: env_path("STORAGE_ROOT", "storage"),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "post-images".to_string()),
            static_dir: env_path("STATIC_DIR", "static"),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            oauth_authorize_url: env::var("OAUTH_AUTHORIZE_URL").ok().filter(|s| !s.is_empty()),
            oauth_providers,
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

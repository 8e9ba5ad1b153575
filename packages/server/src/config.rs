use std::path::PathBuf;

use common::JudgeAppConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued tokens and of the auth cookie. Default: 168 (7 days).
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Mark the auth cookie `Secure`. Default: true.
    #[serde(default = "default_secure_cookie")]
    pub secure_cookie: bool,
}

fn default_token_ttl_hours() -> i64 {
    168
}
fn default_secure_cookie() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory for content-addressed avatar blobs.
    #[serde(default = "default_avatar_dir")]
    pub avatar_dir: PathBuf,
    /// Largest accepted avatar upload. Default: 5 MiB.
    #[serde(default = "default_max_avatar_bytes")]
    pub max_avatar_bytes: u64,
}

fn default_avatar_dir() -> PathBuf {
    PathBuf::from("./data/avatars")
}
fn default_max_avatar_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            avatar_dir: default_avatar_dir(),
            max_avatar_bytes: default_max_avatar_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub judge: JudgeAppConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., ENLIGHTEN__JUDGE__BASE_URL)
            .add_source(
                Environment::with_prefix("ENLIGHTEN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.judge.validate().map_err(ConfigError::Message)?;
        Ok(config)
    }
}

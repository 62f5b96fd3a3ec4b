use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable that carries the session signing secret.
pub const TOKEN_SECRET_ENV: &str = "POSTBOARD_TOKEN_SECRET";

/// Longest session lifetime accepted, one year.
pub const MAX_SESSION_HOURS: u64 = 24 * 365;

#[derive(Parser, Debug)]
#[command(name = "postboard", about = "A small social posting server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub posts: PostsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
    pub token_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PostsConfig {
    /// When set, only the author of a post may edit it.
    pub edit_requires_ownership: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            session_hours: 168,
            bcrypt_cost: 10,
            token_secret: None,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_with_secret(cli, std::env::var(TOKEN_SECRET_ENV).ok())
    }

    /// Same as [`Config::load`] with the environment secret passed in explicitly.
    pub fn load_with_secret(cli: &Cli, env_secret: Option<String>) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // A blank env value must not mask a secret from the file
        if let Some(secret) = env_secret.filter(|s| !s.trim().is_empty()) {
            config.auth.token_secret = Some(secret);
        }

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("postboard.db"));
        }
        if config.storage.path.is_none() {
            config.storage.path = Some(data_dir.join("uploads"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".postboard")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("postboard.db"))
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("uploads"))
    }

    /// The session signing secret, used byte for byte as the HMAC key.
    /// A whitespace-only value counts as missing. Startup must fail when
    /// this errors.
    pub fn token_secret(&self) -> anyhow::Result<&str> {
        match self.auth.token_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => anyhow::bail!(
                "no session signing secret configured; set {} or auth.token_secret",
                TOKEN_SECRET_ENV
            ),
        }
    }

    /// Session lifetime from `auth.session_hours`, bounded to
    /// `1..=MAX_SESSION_HOURS` so expiry timestamps and cookie ages never
    /// overflow.
    pub fn session_ttl(&self) -> anyhow::Result<chrono::Duration> {
        let hours = self.auth.session_hours;
        if !(1..=MAX_SESSION_HOURS).contains(&hours) {
            anyhow::bail!(
                "auth.session_hours must be between 1 and {}, got {}",
                MAX_SESSION_HOURS,
                hours
            );
        }
        chrono::Duration::try_hours(i64::try_from(hours)?)
            .ok_or_else(|| anyhow::anyhow!("auth.session_hours out of range: {}", hours))
    }
}

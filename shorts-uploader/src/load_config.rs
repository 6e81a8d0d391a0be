//! `load_config` module: builds the one configuration value a run uses, from the
//! process environment (secrets and targets) and an optional static YAML file.
//!
//! # Responsibilities
//! - Read every required environment variable once, and report *all* missing
//!   keys in a single error instead of stopping at the first
//! - Parse the optional YAML file (never containing secrets) into typed settings
//! - Apply CLI overrides on top of the YAML file, and the YAML file on top of defaults
//!
//! # Errors
//! Missing or invalid environment values are [`UploaderError`]s wrapped in
//! `anyhow::Error`, so callers can still downcast them. File and YAML errors
//! carry `anyhow` context.
use anyhow::{Context, Result};
use serde::Deserialize;
use shorts_uploader_core::config::{public_url_base, KeyLayout, UploadSettings, DEFAULT_EXTENSION};
use shorts_uploader_core::error::UploaderError;
use shorts_uploader_core::sidecar::sidecar_path;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const DEFAULT_SHORTS_DIR: &str = "shorts";
const DEFAULT_SIDECAR_DIR: &str = "temp";
const DEFAULT_REGION: &str = "auto";
const DEFAULT_DB_PORT: u16 = 5432;

const REQUIRED_KEYS: [&str; 5] = [
    "VIDEO_ID",
    "R2_ACCESS_KEY",
    "R2_SECRET_KEY",
    "R2_ENDPOINT",
    "R2_BUCKET",
];
const DB_PARAM_KEYS: [&str; 4] = ["DB_HOST", "DB_NAME", "DB_USER", "DB_PASSWORD"];

/// Object-store connection settings.
#[derive(Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_url: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("public_url", &self.public_url)
            .finish()
    }
}

/// How to reach the database: a connection string, or discrete parameters.
#[derive(Clone, PartialEq)]
pub enum DatabaseConfig {
    Url(String),
    Params {
        host: String,
        port: u16,
        name: String,
        user: String,
        password: String,
    },
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseConfig::Url(_) => f.write_str("DatabaseConfig::Url(<redacted>)"),
            DatabaseConfig::Params {
                host,
                port,
                name,
                user,
                ..
            } => f
                .debug_struct("DatabaseConfig::Params")
                .field("host", host)
                .field("port", port)
                .field("name", name)
                .field("user", user)
                .finish(),
        }
    }
}

/// Values read from the environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub video_id: String,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
}

/// The static YAML file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    pub shorts_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub sidecar_dir: Option<PathBuf>,
    pub only_target_video: Option<bool>,
    pub key_layout: Option<KeyLayout>,
    pub verify_uploads: Option<bool>,
}

/// Command-line values that win over the YAML file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub shorts_dir: Option<PathBuf>,
    pub sidecar: Option<PathBuf>,
    pub only_target_video: bool,
    pub no_verify: bool,
}

/// Fully merged configuration for one run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: UploadSettings,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
}

/// Validates the process environment, then loads the optional YAML file and
/// merges both with the command-line overrides. Missing environment values
/// are reported before the file is touched.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<CliConfig> {
    let env = load_env_config(|key| std::env::var(key).ok())?;

    let static_conf = match path {
        Some(path) => load_static_config(path)?,
        None => StaticConfig::default(),
    };
    let config = merge(env, static_conf, overrides);

    info!(
        video_id = %config.settings.video_id,
        bucket = %config.storage.bucket,
        "Config loaded and merged successfully"
    );
    Ok(config)
}

/// Reads and parses the static YAML file.
pub fn load_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;

    // An empty file is a valid "all defaults" config.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }

    serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            e
        })
        .context("Failed to parse config YAML")
}

/// Reads the environment through `lookup`. Blank values count as missing.
pub fn load_env_config<F>(lookup: F) -> Result<EnvConfig, UploaderError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let take = |key: &str, missing: &mut Vec<String>| {
        get(key).unwrap_or_else(|| {
            missing.push(key.to_string());
            String::new()
        })
    };

    let mut missing: Vec<String> = Vec::new();
    let [video_id, access_key, secret_key, endpoint, bucket] =
        REQUIRED_KEYS.map(|key| take(key, &mut missing));

    let database_url = get("DATABASE_URL");
    let db_params = match &database_url {
        Some(_) => None,
        None if DB_PARAM_KEYS.iter().all(|key| get(key).is_none()) => {
            missing.push("DATABASE_URL".to_string());
            None
        }
        None => Some(DB_PARAM_KEYS.map(|key| take(key, &mut missing))),
    };

    if !missing.is_empty() {
        error!(missing = ?missing, "Missing required environment variables");
        return Err(UploaderError::Configuration { missing });
    }

    let database = match (database_url, db_params) {
        (Some(url), _) => DatabaseConfig::Url(url),
        (None, Some([host, name, user, password])) => DatabaseConfig::Params {
            host,
            port: db_port(get("DB_PORT"))?,
            name,
            user,
            password,
        },
        (None, None) => {
            return Err(UploaderError::Configuration {
                missing: vec!["DATABASE_URL".to_string()],
            })
        }
    };

    info!(
        access_key_len = access_key.len(),
        secret_key_set = !secret_key.is_empty(),
        "Object store credentials found in env"
    );

    Ok(EnvConfig {
        video_id,
        storage: StorageConfig {
            endpoint,
            bucket,
            region: get("R2_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            access_key,
            secret_key,
            public_url: get("R2_PUBLIC_URL"),
        },
        database,
    })
}

fn db_port(raw: Option<String>) -> Result<u16, UploaderError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_DB_PORT);
    };
    raw.parse::<u16>().map_err(|e| {
        error!(error = ?e, raw = %raw, "DB_PORT must be a valid port number");
        UploaderError::InvalidConfig {
            key: "DB_PORT".to_string(),
            reason: e.to_string(),
        }
    })
}

/// CLI overrides > YAML > defaults.
pub fn merge(env: EnvConfig, static_conf: StaticConfig, overrides: &Overrides) -> CliConfig {
    let shorts_dir = overrides
        .shorts_dir
        .clone()
        .or(static_conf.shorts_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SHORTS_DIR));

    let sidecar = overrides.sidecar.clone().unwrap_or_else(|| {
        let dir = static_conf
            .sidecar_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SIDECAR_DIR));
        sidecar_path(&dir, &env.video_id)
    });

    let extension = static_conf
        .extension
        .map(|ext| ext.trim_start_matches('.').to_string())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let url_base = public_url_base(
        env.storage.public_url.as_deref(),
        &env.storage.endpoint,
        &env.storage.bucket,
    );

    let settings = UploadSettings {
        video_id: env.video_id,
        shorts_dir,
        extension,
        only_target_video: overrides.only_target_video
            || static_conf.only_target_video.unwrap_or(false),
        sidecar_path: Some(sidecar),
        key_layout: static_conf.key_layout.unwrap_or_default(),
        verify_uploads: !overrides.no_verify && static_conf.verify_uploads.unwrap_or(true),
        url_base,
    };

    CliConfig {
        settings,
        storage: env.storage,
        database: env.database,
    }
}

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(
        "no credentials found; set UNFRIENDLY_CONSUMER_KEY/UNFRIENDLY_CONSUMER_SECRET/\
         UNFRIENDLY_ACCESS_TOKEN/UNFRIENDLY_ACCESS_SECRET/UNFRIENDLY_USER_NAME in env or .env, \
         or create ~/.config/unfriendly/credentials.toml"
    )]
    NoCredentials,
}

/// OAuth 1.0a tokens plus the screen name whose friends list is queried.
///
/// Loaded once at startup and immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
    pub user_name: String,
}

/// Return candidate .env paths in priority order.
fn env_file_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/unfriendly/.env"));
    }
    paths.push(PathBuf::from(".env"));
    paths
}

fn credentials_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/unfriendly/credentials.toml"))
}

/// Load credentials, trying environment variables first and the TOML
/// credentials file second.
///
/// .env files are loaded before reading the environment (earlier files have
/// higher priority because dotenvy does NOT overwrite existing vars). A
/// partial set of env vars falls through to the file; a present but
/// malformed file is fatal.
pub fn load_credentials() -> Result<Credentials, CredentialError> {
    for path in env_file_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }

    let get = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    if let (
        Some(consumer_key),
        Some(consumer_secret),
        Some(access_token),
        Some(access_secret),
        Some(user_name),
    ) = (
        get("UNFRIENDLY_CONSUMER_KEY"),
        get("UNFRIENDLY_CONSUMER_SECRET"),
        get("UNFRIENDLY_ACCESS_TOKEN"),
        get("UNFRIENDLY_ACCESS_SECRET"),
        get("UNFRIENDLY_USER_NAME"),
    ) {
        return Ok(Credentials {
            consumer_key,
            consumer_secret,
            access_token,
            access_secret,
            user_name,
        });
    }

    let Some(path) = credentials_file_path() else {
        return Err(CredentialError::NoCredentials);
    };
    if !path.exists() {
        return Err(CredentialError::NoCredentials);
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| CredentialError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| CredentialError::Parse { path, source })
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const BASE_URL_KEY: &str = "MEDIA_PUBLIC_BASE_URL";
pub const BUCKET_NAME_KEY: &str = "bucket_name";

/// The parts of a `wrangler.toml` that the sync reads directly.
#[derive(Debug, Clone, Deserialize)]
pub struct WranglerToml {
    #[serde(default)]
    pub vars: Option<WranglerVars>,
    #[serde(default)]
    pub r2_buckets: Vec<R2BucketBinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WranglerVars {
    #[serde(rename = "MEDIA_PUBLIC_BASE_URL")]
    pub media_public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct R2BucketBinding {
    pub binding: Option<String>,
    pub bucket_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub base_url: String,
    pub bucket: String,
}

#[derive(Debug)]
pub enum ConfigError {
    IO(PathBuf, Box<std::io::Error>),
    Toml(Box<toml::de::Error>),
    MissingKeys,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IO(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Toml(e) => write!(f, "Failed to parse wrangler config: {}", e),
            ConfigError::MissingKeys => write!(
                f,
                "Missing {} or {} in wrangler.toml.",
                BASE_URL_KEY, BUCKET_NAME_KEY
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn load_sync_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IO(path.to_path_buf(), Box::new(e)))?;
    parse_sync_config(&text)
}

pub fn parse_sync_config(text: &str) -> Result<SyncConfig, ConfigError> {
    let wrangler: WranglerToml =
        toml::from_str(text).map_err(|e| ConfigError::Toml(Box::new(e)))?;
    let table: toml::Table = text.parse().map_err(|e| ConfigError::Toml(Box::new(e)))?;

    let base_url = wrangler
        .vars
        .and_then(|vars| vars.media_public_base_url)
        .or_else(|| find_first_string(&table, BASE_URL_KEY));
    let bucket = wrangler
        .r2_buckets
        .into_iter()
        .find_map(|b| b.bucket_name)
        .or_else(|| find_first_string(&table, BUCKET_NAME_KEY));

    let (Some(base_url), Some(bucket)) = (base_url, bucket) else {
        return Err(ConfigError::MissingKeys);
    };
    let base_url = base_url.trim().trim_end_matches('/').to_string();
    let bucket = bucket.trim().to_string();
    if base_url.is_empty() || bucket.is_empty() {
        return Err(ConfigError::MissingKeys);
    }

    Ok(SyncConfig { base_url, bucket })
}

// depth-first, in document order
fn find_first_string(table: &toml::Table, key: &str) -> Option<String> {
    for (k, v) in table {
        if k == key {
            if let toml::Value::String(s) = v {
                return Some(s.clone());
            }
        }
        if let Some(found) = find_in_value(v, key) {
            return Some(found);
        }
    }
    None
}

fn find_in_value(value: &toml::Value, key: &str) -> Option<String> {
    match value {
        toml::Value::Table(table) => find_first_string(table, key),
        toml::Value::Array(items) => items.iter().find_map(|item| find_in_value(item, key)),
        _ => None,
    }
}

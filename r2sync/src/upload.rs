use std::{
    path::{Path, PathBuf},
    process::Command,
};

use log::{error, warn};

pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

pub trait ObjectUploader {
    /// Returns true when the object was stored remotely.
    fn upload(&self, bucket: &str, key: &str, blob_path: &Path) -> bool;
}

/// Uploads through `wrangler r2 object put --remote`.
#[derive(Debug, Clone)]
pub struct WranglerUploader {
    pub program: String,
    pub config_path: PathBuf,
}

pub fn default_npx() -> &'static str {
    if cfg!(windows) {
        "npx.cmd"
    } else {
        "npx"
    }
}

impl WranglerUploader {
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            program: default_npx().to_string(),
            config_path,
        }
    }

    pub fn with_program(program: String, config_path: PathBuf) -> Self {
        Self {
            program,
            config_path,
        }
    }

    pub fn command(&self, bucket: &str, key: &str, blob_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["wrangler", "r2", "object", "put"])
            .arg(format!("{}/{}", bucket, key))
            .arg("--file")
            .arg(blob_path)
            .args(["--cache-control", CACHE_CONTROL, "--remote", "--config"])
            .arg(&self.config_path);
        cmd
    }
}

impl ObjectUploader for WranglerUploader {
    fn upload(&self, bucket: &str, key: &str, blob_path: &Path) -> bool {
        match self.command(bucket, key, blob_path).status() {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!("upload of {} failed: {}", key, status);
                false
            }
            Err(e) => {
                error!("failed to run {}: {}", self.program, e);
                false
            }
        }
    }
}

use std::path::{Path, PathBuf};

pub mod sqlite;

// persist dir layout (wrangler --persist-to)
// .wrangler/state/v3
// - v3
//   - r2
//     - miniflare-R2BucketObject
//       - 0123abcd....sqlite
//     - <bucket>
//       - blobs
//         - <blob_id>

pub const DEFAULT_PERSIST_DIR: &str = ".wrangler/state/v3";
const OBJECT_DB_DIR_NAME: &str = "miniflare-R2BucketObject";

/// One row of the emulator's object index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalObject {
    pub key: String,
    /// NULL for multipart uploads, which have no single blob.
    pub blob_id: Option<String>,
}

#[derive(Debug)]
pub enum LocalStoreError {
    MissingDbDir(PathBuf),
    NoSqliteDb(PathBuf),
    MissingBlobsDir(PathBuf),
    IO(Box<std::io::Error>),
    Sqlite(Box<rusqlite::Error>),
}

impl std::fmt::Display for LocalStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalStoreError::MissingDbDir(p) => {
                write!(f, "Missing local R2 sqlite dir: {}", p.display())
            }
            LocalStoreError::NoSqliteDb(p) => write!(f, "No sqlite db found in {}", p.display()),
            LocalStoreError::MissingBlobsDir(p) => {
                write!(f, "Missing local R2 blobs dir: {}", p.display())
            }
            LocalStoreError::IO(e) => write!(f, "{}", e),
            LocalStoreError::Sqlite(e) => write!(f, "sqlite: {}", e),
        }
    }
}

impl std::error::Error for LocalStoreError {}

/// Paths of the local R2 emulator state for one bucket.
#[derive(Debug, Clone)]
pub struct MiniflareR2Layout {
    r2_dir: PathBuf,
    bucket: String,
}

impl MiniflareR2Layout {
    pub fn new<P: AsRef<Path>>(persist_dir: P, bucket: &str) -> Self {
        Self {
            r2_dir: persist_dir.as_ref().join("v3").join("r2"),
            bucket: bucket.to_string(),
        }
    }

    pub fn db_dir(&self) -> PathBuf {
        self.r2_dir.join(OBJECT_DB_DIR_NAME)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.r2_dir.join(&self.bucket).join("blobs")
    }

    /// `None` when the id is not a plain file name inside the blob dir.
    pub fn blob_path(&self, blob_id: &str) -> Option<PathBuf> {
        if !is_plain_blob_id(blob_id) {
            return None;
        }
        Some(self.blobs_dir().join(blob_id))
    }

    pub fn ensure_blobs_dir(&self) -> Result<PathBuf, LocalStoreError> {
        let blobs_dir = self.blobs_dir();
        if !blobs_dir.is_dir() {
            return Err(LocalStoreError::MissingBlobsDir(blobs_dir));
        }
        Ok(blobs_dir)
    }

    pub fn find_sqlite_db(&self) -> Result<PathBuf, LocalStoreError> {
        sqlite::find_sqlite_db(self.db_dir())
    }
}

fn is_plain_blob_id(blob_id: &str) -> bool {
    !blob_id.is_empty()
        && blob_id != "."
        && blob_id != ".."
        && !blob_id.contains(|c: char| matches!(c, '/' | '\\' | ':'))
        && !Path::new(blob_id).is_absolute()
}

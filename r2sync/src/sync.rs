use std::{io::Write, path::PathBuf};

use log::{debug, info};
use r2sync_config_file::{ConfigError, SyncConfig};
use r2sync_local_store::{sqlite, LocalObject, LocalStoreError, MiniflareR2Layout};
use r2sync_remote_client::RemoteIndex;

use crate::upload::ObjectUploader;

/// Number of keys listed by a dry run.
pub const DRY_RUN_PREVIEW: usize = 10;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub prefix: String,
    pub dry_run: bool,
    pub force: bool,
    pub batch: usize,
    pub persist_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub local: usize,
    pub missing: Vec<LocalObject>,
    pub uploaded: usize,
    pub failed: usize,
    pub skipped_missing_blob: usize,
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum SyncError {
    Config(ConfigError),
    LocalStore(LocalStoreError),
    IO(Box<std::io::Error>),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Config(e) => write!(f, "{}", e),
            SyncError::LocalStore(e) => write!(f, "{}", e),
            SyncError::IO(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncError {}

fn io_error(e: std::io::Error) -> SyncError {
    SyncError::IO(Box::new(e))
}

/// Objects that need uploading. With `force` every object qualifies and the
/// remote is never queried.
pub fn select_missing<R: RemoteIndex>(
    objects: &[LocalObject],
    remote: &R,
    force: bool,
) -> Vec<LocalObject> {
    if force {
        return objects.to_vec();
    }
    objects
        .iter()
        .filter(|object| !remote.head(&object.key).exists())
        .cloned()
        .collect()
}

pub fn sync_objects<R, U, W>(
    options: &SyncOptions,
    config: &SyncConfig,
    remote: &R,
    uploader: &U,
    out: &mut W,
) -> Result<SyncReport, SyncError>
where
    R: RemoteIndex,
    U: ObjectUploader,
    W: Write,
{
    let layout = MiniflareR2Layout::new(&options.persist_dir, &config.bucket);
    let db_path = layout.find_sqlite_db().map_err(SyncError::LocalStore)?;
    layout.ensure_blobs_dir().map_err(SyncError::LocalStore)?;

    let mut objects =
        sqlite::load_objects(&db_path, &options.prefix).map_err(SyncError::LocalStore)?;
    if options.batch > 0 {
        objects.truncate(options.batch);
    }

    let missing = select_missing(&objects, remote, options.force);

    writeln!(out, "Local objects: {}", objects.len()).map_err(io_error)?;
    writeln!(out, "Missing on remote: {}", missing.len()).map_err(io_error)?;

    let mut report = SyncReport {
        local: objects.len(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    if options.dry_run {
        for object in missing.iter().take(DRY_RUN_PREVIEW) {
            writeln!(out, "Missing: {}", object.key).map_err(io_error)?;
        }
        report.missing = missing;
        return Ok(report);
    }

    for object in &missing {
        let blob_path = object
            .blob_id
            .as_deref()
            .and_then(|blob_id| layout.blob_path(blob_id))
            .filter(|path| path.is_file());
        let Some(blob_path) = blob_path else {
            writeln!(
                out,
                "Missing blob for {}: {}",
                object.key,
                object.blob_id.as_deref().unwrap_or("NULL")
            )
            .map_err(io_error)?;
            report.skipped_missing_blob += 1;
            continue;
        };
        writeln!(out, "Uploading {}", object.key).map_err(io_error)?;
        if uploader.upload(&config.bucket, &object.key, &blob_path) {
            report.uploaded += 1;
        } else {
            report.failed += 1;
        }
    }

    writeln!(out, "Uploaded: {}", report.uploaded).map_err(io_error)?;
    if report.failed > 0 {
        writeln!(out, "Failed: {}", report.failed).map_err(io_error)?;
    }
    info!(
        "sync finished: {} uploaded, {} failed, {} without blob",
        report.uploaded, report.failed, report.skipped_missing_blob
    );
    debug!("{:?}", report);

    report.missing = missing;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashSet};

    use r2sync_remote_client::RemoteStatus;

    use super::*;

    struct FakeRemote {
        present: HashSet<String>,
        calls: RefCell<usize>,
    }

    impl RemoteIndex for FakeRemote {
        fn head(&self, key: &str) -> RemoteStatus {
            *self.calls.borrow_mut() += 1;
            if key.starts_with("flaky/") {
                RemoteStatus::Unknown
            } else if self.present.contains(key) {
                RemoteStatus::Present
            } else {
                RemoteStatus::Missing
            }
        }
    }

    fn object(key: &str) -> LocalObject {
        LocalObject {
            key: key.to_string(),
            blob_id: Some(format!("blob-{}", key)),
        }
    }

    #[test]
    fn test_select_missing() {
        let objects = vec![object("a"), object("b"), object("c"), object("flaky/d")];
        let remote = FakeRemote {
            present: HashSet::from(["b".to_string()]),
            calls: RefCell::new(0),
        };
        let missing = select_missing(&objects, &remote, false);
        assert_eq!(missing, vec![object("a"), object("c")]);
        assert_eq!(*remote.calls.borrow(), 4);
    }

    #[test]
    fn test_select_missing_force_skips_remote() {
        let objects = vec![object("a"), object("b")];
        let remote = FakeRemote {
            present: HashSet::from(["a".to_string(), "b".to_string()]),
            calls: RefCell::new(0),
        };
        let missing = select_missing(&objects, &remote, true);
        assert_eq!(missing, objects);
        assert_eq!(*remote.calls.borrow(), 0);
    }

    #[test]
    fn test_error_messages() {
        let err = SyncError::LocalStore(LocalStoreError::MissingBlobsDir(PathBuf::from(
            "state/v3/r2/b/blobs",
        )));
        assert_eq!(err.to_string(), "Missing local R2 blobs dir: state/v3/r2/b/blobs");
        let err = SyncError::Config(ConfigError::MissingKeys);
        assert_eq!(
            err.to_string(),
            "Missing MEDIA_PUBLIC_BASE_URL or bucket_name in wrangler.toml."
        );
    }
}

use std::{path::Path, path::PathBuf, time::SystemTime};

use log::debug;

use crate::{LocalObject, LocalStoreError};

/// Picks the most recently modified `*.sqlite` file in `dir`.
pub fn find_sqlite_db<P: AsRef<Path>>(dir: P) -> Result<PathBuf, LocalStoreError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LocalStoreError::MissingDbDir(dir.to_path_buf()));
    }

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).map_err(|e| LocalStoreError::IO(Box::new(e)))? {
        let entry = entry.map_err(|e| LocalStoreError::IO(Box::new(e)))?;
        let path = entry.path();
        if path.extension().and_then(|x| x.to_str()) != Some("sqlite") || !path.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| LocalStoreError::IO(Box::new(e)))?;
        match &newest {
            Some((t, _)) if *t >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    let (_, path) = newest.ok_or_else(|| LocalStoreError::NoSqliteDb(dir.to_path_buf()))?;
    debug!("using sqlite db {}", path.display());
    Ok(path)
}

pub struct LocalObjectIndexBySqlite {
    db: rusqlite::Connection,
}

impl LocalObjectIndexBySqlite {
    pub fn open<P: AsRef<Path>>(sqlite_path: P) -> Result<Self, LocalStoreError> {
        let db = rusqlite::Connection::open(sqlite_path)
            .map_err(|e| LocalStoreError::Sqlite(Box::new(e)))?;
        Ok(Self { db })
    }

    /// Lists `(key, blob_id)` rows whose key starts with `prefix`, ordered by key.
    /// An empty prefix lists every object.
    pub fn load_objects(&self, prefix: &str) -> Result<Vec<LocalObject>, LocalStoreError> {
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<LocalObject> {
            Ok(LocalObject {
                key: row.get(0)?,
                blob_id: row.get(1)?,
            })
        };

        let objects = if prefix.is_empty() {
            let mut stmt = self
                .db
                .prepare("SELECT key, blob_id FROM _mf_objects ORDER BY key")
                .map_err(|e| LocalStoreError::Sqlite(Box::new(e)))?;
            let rows = stmt
                .query_map(rusqlite::params![], map_row)
                .map_err(|e| LocalStoreError::Sqlite(Box::new(e)))?;
            rows.collect::<Result<Vec<_>, _>>()
        } else {
            let mut stmt = self
                .db
                .prepare(
                    "SELECT key, blob_id FROM _mf_objects WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
                )
                .map_err(|e| LocalStoreError::Sqlite(Box::new(e)))?;
            let rows = stmt
                .query_map(rusqlite::params![like_prefix_pattern(prefix)], map_row)
                .map_err(|e| LocalStoreError::Sqlite(Box::new(e)))?;
            rows.collect::<Result<Vec<_>, _>>()
        }
        .map_err(|e| LocalStoreError::Sqlite(Box::new(e)))?;

        debug!("loaded {} objects (prefix={:?})", objects.len(), prefix);
        Ok(objects)
    }
}

pub fn load_objects<P: AsRef<Path>>(
    sqlite_path: P,
    prefix: &str,
) -> Result<Vec<LocalObject>, LocalStoreError> {
    LocalObjectIndexBySqlite::open(sqlite_path)?.load_objects(prefix)
}

fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe atomic JSON persistence: write to a temp file, fsync, rename.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Serialize `value` to `path` atomically: write to `path.tmp`, fsync, then
/// rename over `path`. A crash mid-write leaves the original file untouched.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| io_err(path, source))?;
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path).map_err(|source| io_err(path, source))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let file = writer
            .into_inner()
            .map_err(|e| io_err(path, e.into_error()))?;
        file.sync_all().map_err(|source| io_err(path, source))?;
    }

    fs::rename(&tmp_path, path).map_err(|source| io_err(path, source))?;
    Ok(())
}

/// Read and deserialize `path`. Returns `NotFound` if it doesn't exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| io_err(path, source))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and deserialize `path`, returning `None` (and moving the file to a
/// rotated `.bak` path) if the contents are present but corrupt.
pub fn read_json_or_quarantine<T: DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path).map_err(|source| io_err(path, source))?;
    let reader = BufReader::new(file);
    match serde_json::from_reader(reader) {
        Ok(value) => Ok(Some(value)),
        Err(source) => {
            let bak = rotate_bak_path(path);
            warn!(
                error = %source,
                path = %path.display(),
                bak = %bak.display(),
                "corrupt file, quarantining to .bak",
            );
            fs::rename(path, &bak).map_err(|source| io_err(path, source))?;
            Ok(None)
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    })
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
/// Keeps up to [`MAX_BAK_FILES`] backups, oldest dropped first.
pub fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Copy `path` to its primary `.bak` location, rotating older backups.
/// Used before a mutating write so a crash mid-write still leaves a
/// restorable prior version.
pub fn backup(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        return Ok(());
    }
    let bak = rotate_bak_path(path);
    fs::copy(path, &bak).map_err(|source| io_err(path, source))?;
    Ok(())
}

/// Restore `path` from its most recent `.bak`, if one exists.
pub fn restore_from_backup<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bak = path.with_extension("bak");
    if !bak.exists() {
        return Ok(None);
    }
    read_json(&bak).map(Some)
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;

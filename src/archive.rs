//! Read-only access to zip-packaged mod files.
//!
//! The `zip` crate needs `Read + Seek`, but [`Runtime::open`] hands back a
//! plain reader, so archives are buffered into a cursor before parsing.

use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::runtime::Runtime;

fn open_archive(
    runtime: &dyn Runtime,
    archive_path: &Path,
) -> Result<ZipArchive<std::io::Cursor<Vec<u8>>>> {
    let mut reader = runtime
        .open(archive_path)
        .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
    ZipArchive::new(std::io::Cursor::new(buffer))
        .with_context(|| format!("Failed to parse ZIP archive {:?}", archive_path))
}

/// Check whether the archive contains an entry at `entry_path`.
pub fn contains_entry(runtime: &dyn Runtime, archive_path: &Path, entry_path: &str) -> Result<bool> {
    let mut archive = open_archive(runtime, archive_path)?;
    Ok(archive.by_name(entry_path).is_ok())
}

/// Read a single entry out of the archive. `Ok(None)` when the entry is absent.
pub fn read_entry(
    runtime: &dyn Runtime,
    archive_path: &Path,
    entry_path: &str,
) -> Result<Option<Vec<u8>>> {
    let mut archive = open_archive(runtime, archive_path)?;
    let mut entry = match archive.by_name(entry_path) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read entry {} from {:?}", entry_path, archive_path)
            });
        }
    };
    let mut buffer = Vec::new();
    entry
        .read_to_end(&mut buffer)
        .with_context(|| format!("Failed to read entry {} from {:?}", entry_path, archive_path))?;
    Ok(Some(buffer))
}

/// Copy a single entry out of the archive into `dest`, creating parent
/// directories as needed.
#[tracing::instrument(skip(runtime))]
pub fn extract_entry(
    runtime: &dyn Runtime,
    archive_path: &Path,
    entry_path: &str,
    dest: &Path,
) -> Result<()> {
    debug!("Extracting {} from {:?} to {:?}", entry_path, archive_path, dest);
    let mut archive = open_archive(runtime, archive_path)?;
    let mut entry = archive
        .by_name(entry_path)
        .with_context(|| format!("Entry {} not found in {:?}", entry_path, archive_path))?;

    // Reject entries that would escape the destination.
    if entry.enclosed_name().is_none() {
        anyhow::bail!("Entry {} in {:?} has an invalid path", entry_path, archive_path);
    }

    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent)?;
    }
    let mut dest_file = runtime.create_file(dest)?;
    std::io::copy(&mut entry, &mut dest_file)
        .with_context(|| format!("Failed to extract {} to {:?}", entry_path, dest))?;
    Ok(())
}

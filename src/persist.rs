// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Crash-safe JSON document I/O
//!
//! Writes go to a hidden temp file next to the target, get fsynced, and are
//! then renamed over the target. An interrupted write loses the update but
//! never leaves a truncated document behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{ArtProcessorError, Result};

fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    target.with_file_name(format!(".{}.tmp", name))
}

/// Write `contents` to `target` atomically
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ArtProcessorError::persistence(parent, e))?;
        }
    }

    let temp = temp_path_for(target);
    let mut file = std::fs::File::create(&temp).map_err(|e| ArtProcessorError::persistence(&temp, e))?;
    file.write_all(contents)
        .map_err(|e| ArtProcessorError::persistence(&temp, e))?;
    file.sync_all().map_err(|e| ArtProcessorError::persistence(&temp, e))?;
    drop(file);

    std::fs::rename(&temp, target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        ArtProcessorError::persistence(target, e)
    })?;

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json<T: Serialize>(target: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(target, json.as_bytes())
}

/// Read a JSON document; `Ok(None)` when the file does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ArtProcessorError::persistence(path, e))?;
    let value = serde_json::from_str(&content).map_err(|e| ArtProcessorError::persistence(path, e))?;
    Ok(Some(value))
}

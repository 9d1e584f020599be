// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Finding paintings in the source image trees

use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{AppConfig, Result};

/// A full-resolution file and its secondary variant, if one exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintingPair {
    pub full: PathBuf,
    pub secondary: Option<PathBuf>,
}

impl PaintingPair {
    pub fn stem(&self) -> String {
        self.full
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Category folders under the full-resolution root, sorted
pub fn list_categories(config: &AppConfig) -> Result<Vec<String>> {
    let root = config.big_root()?;
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut categories: Vec<String> = std::fs::read_dir(&root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with('.'))
        .collect();
    categories.sort();
    Ok(categories)
}

fn is_image(path: &Path, formats: &[String]) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| formats.iter().any(|f| f.eq_ignore_ascii_case(ext)))
}

fn images_in(dir: &Path, formats: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_image(p, formats))
        .collect();
    files.sort();
    Ok(files)
}

/// Pair every full-resolution image in a category with its secondary file
pub fn find_painting_pairs(config: &AppConfig, category: &str) -> Result<Vec<PaintingPair>> {
    let full_files = images_in(&config.big_root()?.join(category), &config.image_formats)?;
    let secondary_files = images_in(&config.instagram_root()?.join(category), &config.image_formats)?;

    let pairs = full_files
        .into_iter()
        .map(|full| {
            let stem = full
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let secondary = secondary_files
                .iter()
                .find(|s| matches_secondary(&stem, s, &config.secondary_suffixes))
                .cloned();
            if secondary.is_none() {
                debug!("No secondary variant for {:?}", full);
            }
            PaintingPair { full, secondary }
        })
        .collect();

    Ok(pairs)
}

fn matches_secondary(full_stem: &str, candidate: &Path, suffixes: &[String]) -> bool {
    let Some(stem) = candidate.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    if stem == full_stem {
        return true;
    }
    stem.strip_prefix(full_stem)
        .is_some_and(|rest| suffixes.iter().any(|s| s.eq_ignore_ascii_case(rest)))
}

/// Modification date of a file, as a suggested creation date
pub fn suggested_creation_date(path: &Path) -> Result<NaiveDate> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}

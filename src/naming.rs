// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Folder and file name sanitization

use crate::{ArtProcessorError, Result};

/// Characters dropped outright from titles before they become file stems
const DROPPED: &[char] = &[':', ';', '?', '!', '*', '"', '\'', '<', '>', '|'];

/// Turn a collection name into a folder name.
///
/// `"Oil Paintings"` becomes `"oil-paintings"`.
pub fn sanitize_folder_name(collection: &str) -> Result<String> {
    let folder = collapse(
        &collection
            .trim()
            .to_lowercase()
            .chars()
            .filter_map(|c| match c {
                c if c.is_whitespace() || c == '/' || c == '\\' => Some('-'),
                c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
                _ => None,
            })
            .collect::<String>(),
        '-',
    );

    if folder.is_empty() {
        return Err(ArtProcessorError::Config(format!(
            "Collection name {:?} does not yield a folder name",
            collection
        )));
    }
    Ok(folder)
}

/// Turn a painting title into a file stem (and painting identifier).
///
/// `"Bavarian Twilight!"` becomes `"bavarian_twilight"`.
pub fn sanitize_filename(title: &str) -> Result<String> {
    let stem = collapse(
        &title
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !DROPPED.contains(c))
            .filter_map(|c| match c {
                c if c.is_whitespace() || c == '/' || c == '\\' => Some('_'),
                c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => Some(c),
                _ => None,
            })
            .collect::<String>(),
        '_',
    );

    if stem.is_empty() {
        return Err(ArtProcessorError::Config(format!(
            "Title {:?} does not yield a file name",
            title
        )));
    }
    Ok(stem)
}

/// Collapse runs of `sep` and trim it from both ends
fn collapse(raw: &str, sep: char) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == sep && out.ends_with(sep) {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(sep).to_string()
}

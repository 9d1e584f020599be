// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the art processor

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for art processor operations
pub type Result<T> = std::result::Result<T, ArtProcessorError>;

/// Art processor error types
#[derive(Error, Debug)]
pub enum ArtProcessorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing file for '{painting}': {path}")]
    MissingFile { painting: String, path: PathBuf },

    #[error("Destination already occupied for '{painting}': {path}")]
    Collision { painting: String, path: PathBuf },

    #[error("Unknown {kind}: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Failed to persist {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("{platform}: {operation} not yet supported")]
    Unsupported { platform: String, operation: &'static str },

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArtProcessorError {
    pub fn painting_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { kind: "painting", name: name.into() }
    }

    pub fn platform_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { kind: "platform", name: name.into() }
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence { path: path.into(), reason: reason.to_string() }
    }
}

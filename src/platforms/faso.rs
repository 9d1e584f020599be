// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! FASO gallery listing
//!
//! Listings are created by driving the gallery's web UI, which lives outside
//! this crate. What is here is the readiness check run before handing a
//! painting to that driver.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::path::Path;

use super::{Platform, PostResult};
use crate::config::PlatformKind;
use crate::metadata::PaintingMetadata;
use crate::{ArtProcessorError, Result};

pub struct FasoGallery {
    name: String,
}

impl FasoGallery {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl Platform for FasoGallery {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        "FASO"
    }

    fn kind(&self) -> PlatformKind {
        PlatformKind::Gallery
    }

    fn max_text_length(&self) -> usize {
        10_000
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn verify_credentials(&self) -> Result<()> {
        Err(ArtProcessorError::Unsupported {
            platform: self.name.clone(),
            operation: "credential check",
        })
    }

    async fn post_image(&self, _image: &Path, _text: &str, _alt_text: &str) -> Result<PostResult> {
        Err(ArtProcessorError::Unsupported {
            platform: self.name.clone(),
            operation: "browser upload",
        })
    }
}

/// Requirements a record is missing before it can be listed; empty when ready
pub fn upload_readiness(record: &PaintingMetadata) -> Vec<String> {
    let mut missing = Vec::new();

    if record.title.selected.trim().is_empty() {
        missing.push("title".to_string());
    }

    if record.files.big.as_os_str().is_empty() {
        missing.push("image file path".to_string());
    } else if !record.files.big.is_file() {
        let name = record
            .files
            .big
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        missing.push(format!("image file missing: {}", name));
    }

    for (field, value) in [
        ("medium", &record.medium),
        ("substrate", &record.substrate),
        ("subject", &record.subject),
        ("style", &record.style),
        ("collection", &record.collection),
    ] {
        if value.trim().is_empty() {
            missing.push(field.to_string());
        }
    }

    if record.dimensions.width <= 0.0 || record.dimensions.height <= 0.0 {
        missing.push("dimensions".to_string());
    }

    if record.description.trim().is_empty() {
        missing.push("description".to_string());
    }

    missing
}

/// Year the painting was made, falling back to the current year
pub fn creation_year(record: &PaintingMetadata) -> i32 {
    record
        .creation_date
        .map(|d| d.year())
        .unwrap_or_else(|| Utc::now().year())
}

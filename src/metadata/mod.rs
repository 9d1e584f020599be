// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-painting metadata records
//!
//! One JSON document per painting lives at `<metadata root>/<identifier>.json`,
//! next to a plain-text summary for humans. The organizer and the tracker only
//! touch path fields through [`MetadataStore::update_paths`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::DimensionUnit;
use crate::persist;
use crate::{AppConfig, ArtProcessorError, Result};

/// Which file variant of a painting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    /// Full-resolution file
    #[default]
    Big,
    /// Secondary web/social file
    Instagram,
}

impl std::fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Big => f.write_str("full-resolution"),
            Self::Instagram => f.write_str("secondary"),
        }
    }
}

/// A painting's metadata record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaintingMetadata {
    /// Sanitized file stem; doubles as the painting identifier
    pub filename_base: String,
    /// Source folder the painting was scanned from
    #[serde(default)]
    pub category: String,
    pub files: PaintingFiles,
    pub title: TitleInfo,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub substrate: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub price_eur: f64,
    #[serde(default)]
    pub creation_date: Option<NaiveDate>,
    pub processed_date: DateTime<Utc>,
    /// Variant the AI description was generated from
    #[serde(default)]
    pub analyzed_from: ImageVariant,
    /// Posts made to social platforms, keyed by platform name
    #[serde(default)]
    pub social_media: BTreeMap<String, SocialPosts>,
}

/// Post history of one painting on one social platform
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialPosts {
    #[serde(default)]
    pub post_count: u32,
    #[serde(default)]
    pub last_posted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub post_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaintingFiles {
    pub big: PathBuf,
    #[serde(default)]
    pub instagram: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TitleInfo {
    pub selected: String,
    #[serde(default)]
    pub all_options: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub unit: DimensionUnit,
    #[serde(default)]
    pub formatted: String,
}

impl Dimensions {
    pub fn new(width: f64, height: f64, depth: Option<f64>, unit: DimensionUnit) -> Self {
        Self {
            width,
            height,
            depth,
            unit,
            formatted: format_dimensions(width, height, depth, unit),
        }
    }
}

/// Display string for a set of dimensions, e.g. `60cm x 80cm x 2cm`
pub fn format_dimensions(width: f64, height: f64, depth: Option<f64>, unit: DimensionUnit) -> String {
    let mut out = format!("{}{} x {}{}", width, unit, height, unit);
    if let Some(depth) = depth.filter(|d| *d > 0.0) {
        let _ = write!(out, " x {}{}", depth, unit);
    }
    out
}

impl PaintingMetadata {
    pub fn new(filename_base: &str, selected_title: &str, big: PathBuf) -> Self {
        Self {
            filename_base: filename_base.to_string(),
            files: PaintingFiles { big, instagram: None },
            title: TitleInfo {
                selected: selected_title.to_string(),
                all_options: Vec::new(),
            },
            processed_date: Utc::now(),
            ..Self::default()
        }
    }

    pub fn identifier(&self) -> &str {
        &self.filename_base
    }

    pub fn path_of(&self, variant: ImageVariant) -> Option<&Path> {
        match variant {
            ImageVariant::Big => Some(self.files.big.as_path()).filter(|p| !p.as_os_str().is_empty()),
            ImageVariant::Instagram => self.files.instagram.as_deref(),
        }
    }

    /// Human-readable summary written next to the JSON record
    pub fn render_text(&self) -> String {
        let rule = "-".repeat(60);
        let mut text = String::new();

        let _ = writeln!(text, "ARTWORK METADATA");
        let _ = writeln!(text, "{}", "=".repeat(60));
        let _ = writeln!(text);
        let _ = writeln!(text, "Title: {}", self.title.selected);
        let _ = writeln!(text, "Collection: {}", self.collection);
        let _ = writeln!(text, "Medium: {} on {}", self.medium, self.substrate);
        let _ = writeln!(text, "Subject: {}", self.subject);
        let _ = writeln!(text, "Style: {}", self.style);
        let _ = writeln!(text, "Dimensions: {}", self.dimensions.formatted);
        let _ = writeln!(text, "Price: €{:.2}", self.price_eur);
        let _ = writeln!(
            text,
            "Creation Date: {}",
            self.creation_date.map(|d| d.to_string()).unwrap_or_else(|| "unknown".to_string())
        );
        let _ = writeln!(text);
        let _ = writeln!(text, "DESCRIPTION\n{}\n{}", rule, self.description);
        let _ = writeln!(text);
        let _ = writeln!(text, "ALTERNATIVE TITLES\n{}", rule);
        for (i, title) in self.title.all_options.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, title);
        }
        let _ = writeln!(text);
        let _ = writeln!(text, "FILES\n{}", rule);
        let _ = writeln!(text, "Big Version: {}", self.files.big.display());
        let _ = writeln!(
            text,
            "Instagram Version: {}",
            self.files
                .instagram
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "N/A".to_string())
        );
        let _ = writeln!(text);
        let _ = writeln!(text, "PROCESSING INFO\n{}", rule);
        let _ = writeln!(text, "Processed: {}", self.processed_date.to_rfc3339());
        let _ = writeln!(text, "Analyzed From: {:?}", self.analyzed_from);

        text
    }
}

/// Reader/writer for metadata records
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
    /// JSON files under the root that are not painting records
    skip: Vec<PathBuf>,
}

impl MetadataStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root, skip: Vec::new() }
    }

    /// Store at the configured root; the tracker and schedule documents may share it
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            root: config.metadata_root()?,
            skip: vec![config.tracker_path()?, config.schedule_path()?],
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the JSON record for a painting
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.root.join(format!("{}.json", identifier))
    }

    pub fn exists(&self, identifier: &str) -> bool {
        self.path_for(identifier).is_file()
    }

    pub fn load(&self, identifier: &str) -> Result<PaintingMetadata> {
        let path = self.path_for(identifier);
        persist::read_json(&path)?.ok_or_else(|| ArtProcessorError::painting_not_found(identifier))
    }

    /// Write the JSON record and its text summary; returns the JSON path
    pub fn save(&self, record: &PaintingMetadata) -> Result<PathBuf> {
        if record.filename_base.is_empty() {
            return Err(ArtProcessorError::Config("Metadata record has no identifier".to_string()));
        }

        let json_path = self.path_for(&record.filename_base);
        persist::write_json(&json_path, record)?;

        let txt_path = json_path.with_extension("txt");
        persist::write_atomic(&txt_path, record.render_text().as_bytes())?;

        debug!("Saved metadata for {} to {:?}", record.filename_base, json_path);
        Ok(json_path)
    }

    /// All stored identifiers, sorted
    pub fn list_identifiers(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = self.root.join("*.json");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern)
            .map_err(|e| ArtProcessorError::Config(format!("Bad metadata root {:?}: {}", self.root, e)))?;

        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|p| p.is_file() && !self.skip.contains(p))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .filter(|s| !s.starts_with('.'))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Commit new file locations for the variants that moved
    pub fn update_paths(
        &self,
        identifier: &str,
        big: Option<PathBuf>,
        instagram: Option<PathBuf>,
    ) -> Result<PaintingMetadata> {
        let mut record = self.load(identifier)?;
        if big.is_none() && instagram.is_none() {
            return Ok(record);
        }

        if let Some(big) = big {
            record.files.big = big;
        }
        if let Some(instagram) = instagram {
            record.files.instagram = Some(instagram);
        }

        self.save(&record)?;
        info!("Updated file paths for {}", identifier);
        Ok(record)
    }

    /// Record a successful social post on the painting's record
    pub fn record_post(
        &self,
        identifier: &str,
        platform: &str,
        post_url: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<SocialPosts> {
        let mut record = self.load(identifier)?;
        let posts = record.social_media.entry(platform.to_string()).or_default();
        posts.post_count += 1;
        posts.last_posted = Some(at);
        if let Some(url) = post_url {
            posts.post_url = Some(url.to_string());
        }
        let posts = posts.clone();

        self.save(&record)?;
        Ok(posts)
    }
}

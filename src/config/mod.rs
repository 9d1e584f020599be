// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the art processor
//!
//! The configuration is loaded once at startup and handed to each component
//! by reference. Admin edits go through [`AppConfig::add_option`] and
//! [`AppConfig::add_platform`] followed by [`AppConfig::save`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ArtProcessorError, Result};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Root directories for images, metadata and the tracker document
    pub paths: PathConfig,

    /// Unit used when entering dimensions
    #[serde(default)]
    pub dimension_unit: DimensionUnit,

    /// Extensible option lists
    #[serde(default)]
    pub options: OptionsConfig,

    /// Platform catalog seed
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformConfig>,

    /// Image extensions picked up by discovery
    #[serde(default = "default_image_formats")]
    pub image_formats: Vec<String>,

    /// Stem suffixes that mark a secondary (social) variant
    #[serde(default = "default_secondary_suffixes")]
    pub secondary_suffixes: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathConfig {
    /// Full-resolution image tree
    pub big: String,
    /// Secondary (web/social) image tree
    pub instagram: String,
    /// Metadata record tree
    pub metadata: String,
    #[serde(default = "default_tracker_path")]
    pub upload_tracker: String,
    /// Scheduled social posts and their history
    #[serde(default = "default_schedule_path")]
    pub schedule: String,
    /// Folder that holds freshly scanned paintings in both image trees
    #[serde(default = "default_new_paintings_folder")]
    pub new_paintings_folder: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DimensionUnit {
    #[default]
    #[serde(rename = "cm")]
    #[value(name = "cm")]
    Centimeters,
    #[serde(rename = "in")]
    #[value(name = "in")]
    Inches,
}

impl DimensionUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Centimeters => "cm",
            Self::Inches => "in",
        }
    }
}

impl fmt::Display for DimensionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OptionsConfig {
    #[serde(default = "default_substrates")]
    pub substrates: Vec<String>,
    #[serde(default = "default_mediums")]
    pub mediums: Vec<String>,
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
}

/// Which option list an admin edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OptionList {
    Substrates,
    Mediums,
    Subjects,
    Styles,
    Collections,
}

impl fmt::Display for OptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Substrates => "substrates",
            Self::Mediums => "mediums",
            Self::Subjects => "subjects",
            Self::Styles => "styles",
            Self::Collections => "collections",
        };
        f.write_str(name)
    }
}

/// Upload behaviour of a platform
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// One-shot listing; tracked by a single flag
    Gallery,
    /// Repeatable posting; tracked by a flag, counter and last-post time
    Social,
}

impl PlatformKind {
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Self::Social)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gallery => f.write_str("gallery"),
            Self::Social => f.write_str("social"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub name: String,
    pub kind: PlatformKind,
}

impl PlatformConfig {
    pub fn new(name: &str, kind: PlatformKind) -> Self {
        Self { name: name.to_string(), kind }
    }
}

// Default value functions
fn default_tracker_path() -> String { "~/Pictures/processed-metadata/upload_status.json".to_string() }
fn default_schedule_path() -> String { "~/Pictures/processed-metadata/schedule.json".to_string() }
fn default_new_paintings_folder() -> String { "new-paintings".to_string() }

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_substrates() -> Vec<String> { strings(&["paper", "board", "canvas", "linen"]) }
fn default_mediums() -> Vec<String> {
    strings(&["acrylic", "oil", "watercolor", "pen and ink", "pencil"])
}
fn default_subjects() -> Vec<String> {
    strings(&["abstract", "landscape", "cityscape", "sea beasties", "fantasy", "portrait"])
}
fn default_styles() -> Vec<String> {
    strings(&["abstract", "figurative", "surrealism", "impressionism", "landscape", "cityscape"])
}
fn default_collections() -> Vec<String> {
    strings(&["Sea Beasties from Titan", "Fachwerkhauser", "imaginary places", "oils", "abstracts"])
}
fn default_image_formats() -> Vec<String> { strings(&["jpg", "jpeg", "png"]) }
fn default_secondary_suffixes() -> Vec<String> { strings(&["_ig", "_instagram"]) }

fn default_platforms() -> Vec<PlatformConfig> {
    vec![
        PlatformConfig::new("FASO", PlatformKind::Gallery),
        PlatformConfig::new("Instagram", PlatformKind::Social),
        PlatformConfig::new("Mastodon", PlatformKind::Social),
        PlatformConfig::new("Bluesky", PlatformKind::Social),
        PlatformConfig::new("Pixelfed", PlatformKind::Social),
        PlatformConfig::new("Cara", PlatformKind::Social),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathConfig::default(),
            dimension_unit: DimensionUnit::default(),
            options: OptionsConfig::default(),
            platforms: default_platforms(),
            image_formats: default_image_formats(),
            secondary_suffixes: default_secondary_suffixes(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            big: "~/Pictures/my-paintings-big".to_string(),
            instagram: "~/Pictures/my-paintings-instagram".to_string(),
            metadata: "~/Pictures/processed-metadata".to_string(),
            upload_tracker: default_tracker_path(),
            schedule: default_schedule_path(),
            new_paintings_folder: default_new_paintings_folder(),
        }
    }
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            substrates: default_substrates(),
            mediums: default_mediums(),
            subjects: default_subjects(),
            styles: default_styles(),
            collections: default_collections(),
        }
    }
}

/// Expand a leading `~` against the user's home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    expand_with(path, dirs::home_dir)
}

fn expand_with(path: &str, home: impl FnOnce() -> Option<PathBuf>) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(path)),
    };
    let home = home().ok_or_else(|| {
        ArtProcessorError::Config(format!("Cannot expand {:?}: no home directory", path))
    })?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

impl AppConfig {
    /// Configuration rooted at a single directory (used by `init` and tests)
    pub fn rooted_at(root: &Path) -> Self {
        let s = |p: PathBuf| p.to_string_lossy().to_string();
        Self {
            paths: PathConfig {
                big: s(root.join("my-paintings-big")),
                instagram: s(root.join("my-paintings-instagram")),
                metadata: s(root.join("processed-metadata")),
                upload_tracker: s(root.join("processed-metadata").join("upload_status.json")),
                schedule: s(root.join("processed-metadata").join("schedule.json")),
                new_paintings_folder: default_new_paintings_folder(),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| ArtProcessorError::Config(format!("Failed to parse config {:?}: {}", path, e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn big_root(&self) -> Result<PathBuf> {
        expand_home(&self.paths.big)
    }

    pub fn instagram_root(&self) -> Result<PathBuf> {
        expand_home(&self.paths.instagram)
    }

    pub fn metadata_root(&self) -> Result<PathBuf> {
        expand_home(&self.paths.metadata)
    }

    pub fn tracker_path(&self) -> Result<PathBuf> {
        expand_home(&self.paths.upload_tracker)
    }

    pub fn schedule_path(&self) -> Result<PathBuf> {
        expand_home(&self.paths.schedule)
    }

    pub fn option_list(&self, list: OptionList) -> &[String] {
        match list {
            OptionList::Substrates => &self.options.substrates,
            OptionList::Mediums => &self.options.mediums,
            OptionList::Subjects => &self.options.subjects,
            OptionList::Styles => &self.options.styles,
            OptionList::Collections => &self.options.collections,
        }
    }

    fn option_list_mut(&mut self, list: OptionList) -> &mut Vec<String> {
        match list {
            OptionList::Substrates => &mut self.options.substrates,
            OptionList::Mediums => &mut self.options.mediums,
            OptionList::Subjects => &mut self.options.subjects,
            OptionList::Styles => &mut self.options.styles,
            OptionList::Collections => &mut self.options.collections,
        }
    }

    /// Append a value to an option list.
    ///
    /// Returns `false` when the value is already present (case-insensitive).
    pub fn add_option(&mut self, list: OptionList, value: &str) -> Result<bool> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ArtProcessorError::Config(format!("Empty value for {}", list)));
        }

        let entries = self.option_list_mut(list);
        if entries.iter().any(|e| e.eq_ignore_ascii_case(value)) {
            return Ok(false);
        }
        entries.push(value.to_string());
        tracing::info!("Added '{}' to {}", value, list);
        Ok(true)
    }

    /// Kind of a catalog platform, matched case-insensitively
    pub fn platform_kind(&self, name: &str) -> Option<PlatformKind> {
        self.platforms
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.kind)
    }

    /// Append a platform to the catalog seed.
    ///
    /// Returns `false` when the name is already present.
    pub fn add_platform(&mut self, name: &str, kind: PlatformKind) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ArtProcessorError::Config("Empty platform name".to_string()));
        }
        if self.platform_kind(name).is_some() {
            return Ok(false);
        }
        self.platforms.push(PlatformConfig::new(name, kind));
        Ok(true)
    }

    /// List configuration problems; empty when the config is usable
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.options.collections.is_empty() {
            problems.push("No collections configured".to_string());
        }
        if self.platforms.is_empty() {
            problems.push("Platform catalog is empty".to_string());
        }
        if self.image_formats.is_empty() {
            problems.push("No image formats configured".to_string());
        }

        let mut seen: Vec<String> = Vec::new();
        for platform in &self.platforms {
            let lower = platform.name.to_lowercase();
            if seen.contains(&lower) {
                problems.push(format!("Duplicate platform: {}", platform.name));
            } else {
                seen.push(lower);
            }
        }

        // (label, resolved path, must already exist)
        for (label, path, must_exist) in [
            ("Big paintings path", self.big_root(), true),
            ("Instagram paintings path", self.instagram_root(), true),
            ("Metadata path", self.metadata_root(), false),
            ("Upload tracker path", self.tracker_path(), false),
            ("Schedule path", self.schedule_path(), false),
        ] {
            match path {
                Ok(path) if must_exist && !path.exists() => {
                    problems.push(format!("{} not found: {}", label, path.display()))
                }
                Ok(_) => {}
                Err(e) => problems.push(format!("{}: {}", label, e)),
            }
        }

        problems
    }
}

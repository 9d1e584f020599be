// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Upload/posting platforms
//!
//! Handlers are looked up by name through [`PlatformRegistry`] and only
//! constructed when asked for. Whether a platform is one-shot or repeatable is
//! declared per catalog entry, not inferred from the handler.

pub mod faso;
pub mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{PlatformConfig, PlatformKind};
use crate::{ArtProcessorError, Result};

/// Result of a successful post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostResult {
    pub post_id: Option<String>,
    pub post_url: Option<String>,
}

/// Common capability interface of upload/posting targets
#[async_trait]
pub trait Platform: Send + Sync {
    /// Catalog name of this platform
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn kind(&self) -> PlatformKind;

    fn supports_images(&self) -> bool {
        true
    }

    fn supports_video(&self) -> bool {
        false
    }

    /// Maximum caption/description length
    fn max_text_length(&self) -> usize;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;

    async fn verify_credentials(&self) -> Result<()>;

    async fn post_image(&self, image: &Path, text: &str, alt_text: &str) -> Result<PostResult>;
}

/// Constructor for a platform handler
pub type PlatformFactory = fn(&PlatformConfig) -> Box<dyn Platform>;

struct RegistryEntry {
    config: PlatformConfig,
    factory: PlatformFactory,
}

/// Name → factory map over the configured catalog
pub struct PlatformRegistry {
    entries: Vec<RegistryEntry>,
}

fn faso_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(faso::FasoGallery::new(&c.name))
}

fn instagram_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(stub::StubPlatform::new(&c.name, "Instagram", c.kind, 2200))
}

fn mastodon_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(stub::StubPlatform::new(&c.name, "Mastodon", c.kind, 500).with_video())
}

fn bluesky_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(stub::StubPlatform::new(&c.name, "Bluesky", c.kind, 300))
}

fn pixelfed_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(stub::StubPlatform::new(&c.name, "Pixelfed", c.kind, 500))
}

fn cara_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(stub::StubPlatform::new(&c.name, "Cara", c.kind, 2000))
}

fn generic_handler(c: &PlatformConfig) -> Box<dyn Platform> {
    Box::new(stub::StubPlatform::new(&c.name, &c.name, c.kind, 500))
}

fn builtin_factory(name: &str) -> PlatformFactory {
    match name.to_ascii_lowercase().as_str() {
        "faso" => faso_handler,
        "instagram" => instagram_handler,
        "mastodon" => mastodon_handler,
        "bluesky" => bluesky_handler,
        "pixelfed" => pixelfed_handler,
        "cara" => cara_handler,
        _ => generic_handler,
    }
}

impl PlatformRegistry {
    /// Registry over a catalog, using the built-in handler for each name
    pub fn new(catalog: &[PlatformConfig]) -> Self {
        let mut registry = Self { entries: Vec::new() };
        for platform in catalog {
            registry.register(platform.clone(), builtin_factory(&platform.name));
        }
        registry
    }

    /// Register or replace the factory for a platform
    pub fn register(&mut self, config: PlatformConfig, factory: PlatformFactory) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.config.name.eq_ignore_ascii_case(&config.name))
        {
            Some(entry) => {
                entry.config = config;
                entry.factory = factory;
            }
            None => self.entries.push(RegistryEntry { config, factory }),
        }
    }

    fn entry(&self, name: &str) -> Result<&RegistryEntry> {
        self.entries
            .iter()
            .find(|e| e.config.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ArtProcessorError::platform_not_found(name))
    }

    /// Construct the handler for a platform
    pub fn get(&self, name: &str) -> Result<Box<dyn Platform>> {
        let entry = self.entry(name)?;
        Ok((entry.factory)(&entry.config))
    }

    pub fn kind(&self, name: &str) -> Result<PlatformKind> {
        Ok(self.entry(name)?.config.kind)
    }

    /// Catalog entries in registration order
    pub fn catalog(&self) -> impl Iterator<Item = &PlatformConfig> {
        self.entries.iter().map(|e| &e.config)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

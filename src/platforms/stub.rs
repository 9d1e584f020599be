// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Placeholder handler for platforms without an integration

use async_trait::async_trait;
use std::path::Path;

use super::{Platform, PostResult};
use crate::config::PlatformKind;
use crate::{ArtProcessorError, Result};

/// Handler that refuses every operation with `Unsupported`
pub struct StubPlatform {
    name: String,
    display_name: String,
    kind: PlatformKind,
    max_text_length: usize,
    supports_video: bool,
}

impl StubPlatform {
    pub fn new(name: &str, display_name: &str, kind: PlatformKind, max_text_length: usize) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            kind,
            max_text_length,
            supports_video: false,
        }
    }

    pub fn with_video(mut self) -> Self {
        self.supports_video = true;
        self
    }

    fn unsupported(&self, operation: &'static str) -> ArtProcessorError {
        ArtProcessorError::Unsupported {
            platform: self.display_name.clone(),
            operation,
        }
    }
}

#[async_trait]
impl Platform for StubPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn kind(&self) -> PlatformKind {
        self.kind
    }

    fn supports_video(&self) -> bool {
        self.supports_video
    }

    fn max_text_length(&self) -> usize {
        self.max_text_length
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn verify_credentials(&self) -> Result<()> {
        Err(self.unsupported("credential check"))
    }

    async fn post_image(&self, _image: &Path, _text: &str, _alt_text: &str) -> Result<PostResult> {
        Err(self.unsupported("posting"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_fails_explicitly() {
        let cara = StubPlatform::new("Cara", "Cara", PlatformKind::Social, 2000);

        let err = tokio_test::block_on(cara.post_image(Path::new("/x.jpg"), "text", "")).unwrap_err();
        assert!(matches!(err, ArtProcessorError::Unsupported { ref platform, .. } if platform == "Cara"));
        assert!(err.to_string().contains("not yet supported"));

        assert!(tokio_test::block_on(cara.verify_credentials()).is_err());
        assert!(!cara.is_configured());
        assert!(!cara.supports_video());
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Collection folder organizer
//!
//! Moves both variants of a painting into `<root>/<collection-folder>/`, where
//! the full-resolution and secondary variants live under separate roots but
//! share the same folder name. The organizer owns no state; callers persist
//! the returned paths through the metadata store.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::metadata::ImageVariant;
use crate::naming::sanitize_folder_name;
use crate::{AppConfig, ArtProcessorError, Result};

/// Outcome of one variant that reached its destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMove {
    pub variant: ImageVariant,
    pub from: PathBuf,
    pub to: PathBuf,
    /// `false` when the file already sat at its destination
    pub moved: bool,
}

/// Per-painting result; each variant is reported independently
#[derive(Debug)]
pub struct OrganizeOutcome {
    pub painting: String,
    pub folder: String,
    pub placed: Vec<VariantMove>,
    pub failed: Vec<(ImageVariant, ArtProcessorError)>,
}

impl OrganizeOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// New location of a variant, if it reached its destination
    pub fn path_of(&self, variant: ImageVariant) -> Option<&Path> {
        self.placed
            .iter()
            .find(|m| m.variant == variant)
            .map(|m| m.to.as_path())
    }
}

/// Computes collection folders and moves painting files into them
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    big_root: PathBuf,
    instagram_root: PathBuf,
}

impl FileOrganizer {
    pub fn new(big_root: PathBuf, instagram_root: PathBuf) -> Self {
        Self { big_root, instagram_root }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(config.big_root()?, config.instagram_root()?))
    }

    fn root_for(&self, variant: ImageVariant) -> &Path {
        match variant {
            ImageVariant::Big => &self.big_root,
            ImageVariant::Instagram => &self.instagram_root,
        }
    }

    /// Destination directory of a variant for a collection
    pub fn destination_dir(&self, variant: ImageVariant, collection: &str) -> Result<PathBuf> {
        let folder = sanitize_folder_name(collection)?;
        Ok(self.root_for(variant).join(folder))
    }

    /// Move the given variants of a painting into its collection folder.
    ///
    /// An unusable collection name fails the whole painting. Missing sources
    /// and occupied destinations are reported per variant in the outcome.
    pub fn organize(
        &self,
        painting: &str,
        collection: &str,
        big: Option<&Path>,
        instagram: Option<&Path>,
    ) -> Result<OrganizeOutcome> {
        if collection.trim().is_empty() {
            return Err(ArtProcessorError::Config(format!(
                "Painting '{}' has no collection set",
                painting
            )));
        }
        let folder = sanitize_folder_name(collection).map_err(|e| match e {
            ArtProcessorError::Config(msg) => {
                ArtProcessorError::Config(format!("Painting '{}': {}", painting, msg))
            }
            other => other,
        })?;

        let mut outcome = OrganizeOutcome {
            painting: painting.to_string(),
            folder: folder.clone(),
            placed: Vec::new(),
            failed: Vec::new(),
        };

        for (variant, source) in [(ImageVariant::Big, big), (ImageVariant::Instagram, instagram)] {
            let Some(source) = source else { continue };
            let dest_dir = self.root_for(variant).join(&folder);

            match self.place(painting, source, &dest_dir) {
                Ok((to, moved)) => outcome.placed.push(VariantMove {
                    variant,
                    from: source.to_path_buf(),
                    to,
                    moved,
                }),
                Err(e) => {
                    warn!("Could not organize {} file of '{}': {}", variant, painting, e);
                    outcome.failed.push((variant, e));
                }
            }
        }

        Ok(outcome)
    }

    /// Move one file into `dest_dir`, returning the absolute destination
    fn place(&self, painting: &str, source: &Path, dest_dir: &Path) -> Result<(PathBuf, bool)> {
        let file_name = source.file_name().ok_or_else(|| ArtProcessorError::MissingFile {
            painting: painting.to_string(),
            path: source.to_path_buf(),
        })?;
        let dest = absolutize(&dest_dir.join(file_name))?;

        if same_location(source, &dest) {
            if dest.is_file() {
                debug!("{:?} already in place", dest);
                return Ok((dest, false));
            }
            return Err(ArtProcessorError::MissingFile {
                painting: painting.to_string(),
                path: source.to_path_buf(),
            });
        }

        if !source.is_file() {
            return Err(ArtProcessorError::MissingFile {
                painting: painting.to_string(),
                path: source.to_path_buf(),
            });
        }

        if dest.exists() {
            return Err(ArtProcessorError::Collision {
                painting: painting.to_string(),
                path: dest,
            });
        }

        if let Some(parent) = dest.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created collection folder: {:?}", parent);
            }
            // A plain file squatting on the folder name is a collision, not a folder
            if !parent.is_dir() {
                return Err(ArtProcessorError::Collision {
                    painting: painting.to_string(),
                    path: parent.to_path_buf(),
                });
            }
        }

        move_file(source, &dest)?;
        info!("Moved {:?} -> {:?}", source, dest);
        Ok((dest, true))
    }
}

/// Rename both variants of a painting in place to a new stem.
///
/// The secondary variant keeps whatever suffix follows the old full stem
/// (`old_ig.jpg` becomes `new_ig.jpg`). Both destinations are checked before
/// anything is renamed.
pub fn rename_painting_pair(
    full: &Path,
    secondary: Option<&Path>,
    new_stem: &str,
) -> Result<(PathBuf, Option<PathBuf>)> {
    let old_stem = file_stem(full);
    let new_full = renamed(full, new_stem);

    let new_secondary = secondary.map(|s| {
        let stem = file_stem(s);
        let suffix = stem.strip_prefix(old_stem.as_str()).unwrap_or("");
        (s, renamed(s, &format!("{}{}", new_stem, suffix)))
    });

    for (from, to) in std::iter::once((full, &new_full)).chain(new_secondary.iter().map(|(s, t)| (*s, t))) {
        if !from.is_file() {
            return Err(ArtProcessorError::MissingFile {
                painting: new_stem.to_string(),
                path: from.to_path_buf(),
            });
        }
        if from != to.as_path() && to.exists() {
            return Err(ArtProcessorError::Collision {
                painting: new_stem.to_string(),
                path: to.clone(),
            });
        }
    }

    if full != new_full {
        std::fs::rename(full, &new_full)?;
        info!("Renamed {:?} -> {:?}", full, new_full);
    }
    let new_secondary = match new_secondary {
        Some((from, to)) => {
            if from != to {
                std::fs::rename(from, &to)?;
                info!("Renamed {:?} -> {:?}", from, to);
            }
            Some(to)
        }
        None => None,
    };

    Ok((new_full, new_secondary))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn renamed(path: &Path, stem: &str) -> PathBuf {
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{}.{}", stem, ext.to_string_lossy())),
        None => path.with_file_name(stem),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Rename, falling back to copy + delete across filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!("rename failed ({}), falling back to copy", rename_err);
            if std::fs::copy(from, to).is_err() {
                let _ = std::fs::remove_file(to);
                return Err(rename_err.into());
            }
            std::fs::remove_file(from)?;
            Ok(())
        }
    }
}

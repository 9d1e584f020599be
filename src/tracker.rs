// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Upload status tracking
//!
//! A single JSON document records, for every registered painting, whether it
//! has been uploaded to each known platform. The whole document is read into
//! memory, mutated, and written back atomically after every change.
//!
//! Gallery platforms are one-shot and stored as a plain flag. Social
//! platforms are repeatable and stored with a post counter and the time of
//! the last post. Every platform in the catalog is present as a key in every
//! painting's `uploads` map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{PlatformConfig, PlatformKind};
use crate::metadata::MetadataStore;
use crate::persist;
use crate::{ArtProcessorError, Result};

/// Upload state of one painting on one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadState {
    /// One-shot platforms
    Flag(bool),
    /// Repeatable platforms
    Posts(PostRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub uploaded: bool,
    #[serde(default)]
    pub post_count: u32,
    #[serde(default)]
    pub last_posted: Option<DateTime<Utc>>,
}

impl UploadState {
    /// "Not uploaded" in the shape the platform kind uses
    pub fn initial(kind: PlatformKind) -> Self {
        match kind {
            PlatformKind::Gallery => Self::Flag(false),
            PlatformKind::Social => Self::Posts(PostRecord::default()),
        }
    }

    pub fn is_uploaded(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Posts(record) => record.uploaded,
        }
    }

    pub fn post_count(&self) -> u32 {
        match self {
            Self::Flag(flag) => u32::from(*flag),
            Self::Posts(record) => record.post_count,
        }
    }

    fn record_upload(&mut self, kind: PlatformKind, at: DateTime<Utc>) {
        match kind {
            // one-shot platforms keep a single flag, whatever shape was stored
            PlatformKind::Gallery => *self = Self::Flag(true),
            PlatformKind::Social => {
                let mut record = match self {
                    Self::Posts(record) => record.clone(),
                    // flags written before the platform was known as social
                    Self::Flag(flag) => PostRecord {
                        uploaded: *flag,
                        post_count: u32::from(*flag),
                        last_posted: None,
                    },
                };
                record.uploaded = true;
                record.post_count += 1;
                record.last_posted = Some(at);
                *self = Self::Posts(record);
            }
        }
    }
}

/// One painting's entry in the tracker document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintingStatus {
    pub metadata_path: PathBuf,
    pub processed_date: DateTime<Utc>,
    #[serde(default)]
    pub uploads: BTreeMap<String, UploadState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrackerDocument {
    #[serde(default)]
    paintings: BTreeMap<String, PaintingStatus>,
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default)]
    platform_kinds: BTreeMap<String, PlatformKind>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// Per-platform counts for status output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSummary {
    pub name: String,
    pub kind: PlatformKind,
    pub uploaded: usize,
    pub pending: usize,
}

/// Owner of the upload status document
#[derive(Debug)]
pub struct UploadTracker {
    path: PathBuf,
    doc: TrackerDocument,
}

impl TrackerDocument {
    fn kind_of(&self, name: &str) -> PlatformKind {
        self.platform_kinds
            .get(name)
            .copied()
            .unwrap_or(PlatformKind::Gallery)
    }

    /// Canonical catalog name and kind, matched case-insensitively
    fn resolve(&self, name: &str) -> Option<(&str, PlatformKind)> {
        self.platforms
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .map(|p| (p.as_str(), self.kind_of(p)))
    }

    fn insert_platform(&mut self, name: &str, kind: PlatformKind) {
        self.platforms.push(name.to_string());
        self.platform_kinds.insert(name.to_string(), kind);
        for status in self.paintings.values_mut() {
            status
                .uploads
                .entry(name.to_string())
                .or_insert_with(|| UploadState::initial(kind));
        }
    }

    /// Take platform kinds from the configured catalog and add missing
    /// platforms. Kinds of platforms the catalog does not list are kept.
    fn sync_catalog(&mut self, catalog: &[PlatformConfig]) -> bool {
        let mut changed = false;
        for platform in catalog {
            match self.resolve(&platform.name).map(|(name, _)| name.to_string()) {
                Some(name) => {
                    if self.platform_kinds.get(&name) != Some(&platform.kind) {
                        debug!("Platform {} is now {}", name, platform.kind);
                        self.platform_kinds.insert(name, platform.kind);
                        changed = true;
                    }
                }
                None => {
                    self.insert_platform(&platform.name, platform.kind);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Give every painting a key for every catalog platform
    fn backfill(&mut self) -> bool {
        let initial: Vec<(String, UploadState)> = self
            .platforms
            .iter()
            .map(|name| (name.clone(), UploadState::initial(self.kind_of(name))))
            .collect();

        let mut changed = false;
        for status in self.paintings.values_mut() {
            for (name, state) in &initial {
                if !status.uploads.contains_key(name) {
                    status.uploads.insert(name.clone(), state.clone());
                    changed = true;
                }
            }
        }
        changed
    }
}

impl UploadTracker {
    /// Open (or start) the tracker document and merge in the configured catalog
    pub fn open(path: PathBuf, catalog: &[PlatformConfig]) -> Result<Self> {
        let doc: TrackerDocument = persist::read_json(&path)?.unwrap_or_default();
        let mut tracker = Self { path, doc: doc.clone() };

        let mut synced = doc;
        let catalog_changed = synced.sync_catalog(catalog);
        let backfilled = synced.backfill();
        if catalog_changed || backfilled {
            tracker.commit(synced)?;
        }

        debug!(
            "Tracker {:?}: {} paintings, {} platforms",
            tracker.path,
            tracker.doc.paintings.len(),
            tracker.doc.platforms.len()
        );
        Ok(tracker)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Catalog platforms in order, with their kinds
    pub fn platforms(&self) -> Vec<(String, PlatformKind)> {
        self.doc
            .platforms
            .iter()
            .map(|name| (name.clone(), self.doc.kind_of(name)))
            .collect()
    }

    pub fn painting_ids(&self) -> Vec<String> {
        self.doc.paintings.keys().cloned().collect()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.doc.paintings.contains_key(identifier)
    }

    pub fn status(&self, identifier: &str) -> Result<&PaintingStatus> {
        self.doc
            .paintings
            .get(identifier)
            .ok_or_else(|| ArtProcessorError::painting_not_found(identifier))
    }

    /// Register a painting as pending on every known platform.
    ///
    /// Returns `false` when it was already registered; its upload state and
    /// processed date are kept and only the metadata path is refreshed.
    pub fn register(&mut self, identifier: &str, metadata_path: &Path) -> Result<bool> {
        let mut doc = self.doc.clone();

        let is_new = match doc.paintings.get_mut(identifier) {
            Some(existing) => {
                existing.metadata_path = metadata_path.to_path_buf();
                false
            }
            None => {
                doc.paintings.insert(
                    identifier.to_string(),
                    PaintingStatus {
                        metadata_path: metadata_path.to_path_buf(),
                        processed_date: Utc::now(),
                        uploads: BTreeMap::new(),
                    },
                );
                true
            }
        };
        doc.backfill();

        self.commit(doc)?;
        if is_new {
            info!("Registered {} for upload tracking", identifier);
        }
        Ok(is_new)
    }

    /// Register a painting whose metadata record is in `store`
    pub fn register_from_store(&mut self, store: &MetadataStore, identifier: &str) -> Result<bool> {
        let record = store.load(identifier)?;
        self.register(record.identifier(), &store.path_for(record.identifier()))
    }

    /// Record an upload/post happening now
    pub fn mark_uploaded(&mut self, identifier: &str, platform: &str) -> Result<UploadState> {
        self.mark_uploaded_at(identifier, platform, Utc::now())
    }

    /// Record an upload/post at a given time
    pub fn mark_uploaded_at(
        &mut self,
        identifier: &str,
        platform: &str,
        at: DateTime<Utc>,
    ) -> Result<UploadState> {
        let mut doc = self.doc.clone();
        let (name, kind) = doc
            .resolve(platform)
            .map(|(name, kind)| (name.to_string(), kind))
            .ok_or_else(|| ArtProcessorError::platform_not_found(platform))?;

        let status = doc
            .paintings
            .get_mut(identifier)
            .ok_or_else(|| ArtProcessorError::painting_not_found(identifier))?;

        let state = status
            .uploads
            .entry(name.clone())
            .or_insert_with(|| UploadState::initial(kind));
        state.record_upload(kind, at);
        let state = state.clone();

        self.commit(doc)?;
        info!("Marked {} as uploaded to {}", identifier, name);
        Ok(state)
    }

    /// Add a platform to the catalog and back-fill it into every painting.
    ///
    /// Returns `false` when the platform is already known.
    pub fn add_platform(&mut self, name: &str, kind: PlatformKind) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ArtProcessorError::Config("Empty platform name".to_string()));
        }
        if self.doc.resolve(name).is_some() {
            return Ok(false);
        }

        let mut doc = self.doc.clone();
        doc.insert_platform(name, kind);
        self.commit(doc)?;
        info!(
            "Added {} platform {} to {} paintings",
            kind,
            name,
            self.doc.paintings.len()
        );
        Ok(true)
    }

    /// Paintings not yet uploaded to `platform`, sorted by identifier
    pub fn pending(&self, platform: &str) -> Result<Vec<String>> {
        let (name, _) = self
            .doc
            .resolve(platform)
            .ok_or_else(|| ArtProcessorError::platform_not_found(platform))?;

        Ok(self
            .doc
            .paintings
            .iter()
            .filter(|(_, status)| !status.uploads.get(name).is_some_and(UploadState::is_uploaded))
            .map(|(id, _)| id.clone())
            .collect())
    }

    pub fn summary(&self) -> Vec<PlatformSummary> {
        self.doc
            .platforms
            .iter()
            .map(|name| {
                let uploaded = self
                    .doc
                    .paintings
                    .values()
                    .filter(|s| s.uploads.get(name).is_some_and(UploadState::is_uploaded))
                    .count();
                PlatformSummary {
                    name: name.clone(),
                    kind: self.doc.kind_of(name),
                    uploaded,
                    pending: self.doc.paintings.len() - uploaded,
                }
            })
            .collect()
    }

    /// Write `doc` and make it current; on failure the previous state stays
    fn commit(&mut self, mut doc: TrackerDocument) -> Result<()> {
        doc.last_updated = Some(Utc::now());
        persist::write_json(&self.path, &doc)?;
        self.doc = doc;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn catalog() -> Vec<PlatformConfig> {
        vec![
            PlatformConfig::new("FASO", PlatformKind::Gallery),
            PlatformConfig::new("Instagram", PlatformKind::Social),
        ]
    }

    fn open(dir: &TempDir) -> UploadTracker {
        UploadTracker::open(dir.path().join("upload_status.json"), &catalog()).unwrap()
    }

    #[test]
    fn test_register_initializes_every_platform() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);

        assert!(tracker.register("sunset", Path::new("/meta/sunset.json")).unwrap());

        let status = tracker.status("sunset").unwrap();
        let keys: Vec<&String> = status.uploads.keys().collect();
        assert_eq!(keys, vec!["FASO", "Instagram"]);
        assert_eq!(status.uploads["FASO"], UploadState::Flag(false));
        assert_eq!(status.uploads["Instagram"], UploadState::Posts(PostRecord::default()));
    }

    #[test]
    fn test_reregister_keeps_state() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        tracker.register("sunset", Path::new("/old/sunset.json")).unwrap();
        tracker.mark_uploaded("sunset", "FASO").unwrap();
        let first_date = tracker.status("sunset").unwrap().processed_date;

        assert!(!tracker.register("sunset", Path::new("/new/sunset.json")).unwrap());

        let status = tracker.status("sunset").unwrap();
        assert!(status.uploads["FASO"].is_uploaded());
        assert_eq!(status.processed_date, first_date);
        assert_eq!(status.metadata_path, PathBuf::from("/new/sunset.json"));
    }

    #[test]
    fn test_one_shot_mark_twice_stays_true() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        tracker.register("sunset", Path::new("/m.json")).unwrap();

        tracker.mark_uploaded("sunset", "FASO").unwrap();
        let state = tracker.mark_uploaded("sunset", "faso").unwrap();

        assert_eq!(state, UploadState::Flag(true));
    }

    #[test]
    fn test_repeatable_mark_twice_counts_both() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        tracker.register("sunset", Path::new("/m.json")).unwrap();
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 1, 2, 18, 30, 0).unwrap();

        tracker.mark_uploaded_at("sunset", "Instagram", first).unwrap();
        let state = tracker.mark_uploaded_at("sunset", "Instagram", second).unwrap();

        assert_eq!(
            state,
            UploadState::Posts(PostRecord {
                uploaded: true,
                post_count: 2,
                last_posted: Some(second),
            })
        );
    }

    #[test]
    fn test_mark_unknown_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        tracker.register("sunset", Path::new("/m.json")).unwrap();

        assert!(matches!(
            tracker.mark_uploaded("ghost", "FASO"),
            Err(ArtProcessorError::NotFound { kind: "painting", .. })
        ));
        assert!(matches!(
            tracker.mark_uploaded("sunset", "Myspace"),
            Err(ArtProcessorError::NotFound { kind: "platform", .. })
        ));
    }

    #[test]
    fn test_add_platform_backfills_without_touching_others() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_status.json");
        let faso_only = vec![PlatformConfig::new("FASO", PlatformKind::Gallery)];
        let mut tracker = UploadTracker::open(path.clone(), &faso_only).unwrap();
        tracker.register("a", Path::new("/a.json")).unwrap();
        tracker.register("b", Path::new("/b.json")).unwrap();
        tracker.mark_uploaded("b", "FASO").unwrap();

        assert!(tracker.add_platform("Instagram", PlatformKind::Social).unwrap());
        assert!(!tracker.add_platform("instagram", PlatformKind::Social).unwrap());

        let reopened = UploadTracker::open(path, &faso_only).unwrap();
        for (id, faso) in [("a", false), ("b", true)] {
            let status = reopened.status(id).unwrap();
            assert_eq!(status.uploads["FASO"], UploadState::Flag(faso));
            assert_eq!(status.uploads["Instagram"], UploadState::Posts(PostRecord::default()));
        }
        assert_eq!(
            reopened.platforms(),
            vec![
                ("FASO".to_string(), PlatformKind::Gallery),
                ("Instagram".to_string(), PlatformKind::Social),
            ]
        );
    }

    #[test]
    fn test_pending_lists_not_uploaded() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        for id in ["c", "a", "b"] {
            tracker.register(id, Path::new("/m.json")).unwrap();
        }
        tracker.mark_uploaded("b", "FASO").unwrap();

        assert_eq!(tracker.pending("FASO").unwrap(), vec!["a", "c"]);
        assert_eq!(tracker.pending("Instagram").unwrap(), vec!["a", "b", "c"]);
        assert!(tracker.pending("Tumblr").is_err());

        let summary = tracker.summary();
        assert_eq!(summary[0].uploaded, 1);
        assert_eq!(summary[0].pending, 2);
    }

    #[test]
    fn test_reads_legacy_document_and_syncs_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_status.json");
        std::fs::write(
            &path,
            r#"{
                "paintings": {
                    "test_painting_1": {
                        "metadata_path": "/m/test_painting_1.json",
                        "processed_date": "2025-02-08T10:00:00Z",
                        "uploads": {"FASO": false, "Instagram": true}
                    }
                },
                "platforms": ["FASO", "Instagram"],
                "last_updated": "2025-02-08T12:00:00Z"
            }"#,
        )
        .unwrap();

        let mut catalog = catalog();
        catalog.push(PlatformConfig::new("Mastodon", PlatformKind::Social));
        let mut tracker = UploadTracker::open(path, &catalog).unwrap();

        let status = tracker.status("test_painting_1").unwrap();
        assert_eq!(status.uploads["Mastodon"], UploadState::Posts(PostRecord::default()));
        assert_eq!(status.uploads["Instagram"], UploadState::Flag(true));

        let state = tracker.mark_uploaded("test_painting_1", "Instagram").unwrap();
        assert_eq!(state.post_count(), 2);
    }

    #[test]
    fn test_open_backfills_missing_keys_for_known_platforms() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_status.json");
        std::fs::write(
            &path,
            r#"{
                "paintings": {
                    "p": {
                        "metadata_path": "/m/p.json",
                        "processed_date": "2025-02-08T10:00:00Z",
                        "uploads": {"FASO": true}
                    }
                },
                "platforms": ["FASO", "Instagram"],
                "platform_kinds": {"FASO": "gallery", "Instagram": "social"}
            }"#,
        )
        .unwrap();

        let tracker = UploadTracker::open(path.clone(), &catalog()).unwrap();
        let status = tracker.status("p").unwrap();
        let keys: Vec<&String> = status.uploads.keys().collect();
        assert_eq!(keys, vec!["FASO", "Instagram"]);
        assert_eq!(status.uploads["FASO"], UploadState::Flag(true));
        assert_eq!(status.uploads["Instagram"], UploadState::Posts(PostRecord::default()));
        assert_eq!(tracker.pending("Instagram").unwrap(), vec!["p"]);

        let reopened = UploadTracker::open(path, &[]).unwrap();
        assert_eq!(reopened.status("p").unwrap().uploads.len(), 2);
    }

    #[test]
    fn test_configured_kind_overrides_stored_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_status.json");
        let social = vec![PlatformConfig::new("Saatchi", PlatformKind::Social)];
        let mut tracker = UploadTracker::open(path.clone(), &social).unwrap();
        tracker.register("p", Path::new("/m/p.json")).unwrap();

        let gallery = vec![PlatformConfig::new("saatchi", PlatformKind::Gallery)];
        let mut tracker = UploadTracker::open(path.clone(), &gallery).unwrap();
        assert_eq!(tracker.platforms(), vec![("Saatchi".to_string(), PlatformKind::Gallery)]);

        let state = tracker.mark_uploaded("p", "Saatchi").unwrap();
        assert_eq!(state, UploadState::Flag(true));

        // a catalog that no longer lists the platform keeps the stored kind
        let reopened = UploadTracker::open(path, &[]).unwrap();
        assert_eq!(reopened.platforms(), vec![("Saatchi".to_string(), PlatformKind::Gallery)]);
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("tracker");
        let mut tracker = UploadTracker::open(sub.join("upload_status.json"), &catalog()).unwrap();
        tracker.register("a", Path::new("/a.json")).unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, "not a directory").unwrap();

        assert!(tracker.register("b", Path::new("/b.json")).is_err());
        assert!(tracker.mark_uploaded("a", "FASO").is_err());
        assert!(tracker.add_platform("Threads", PlatformKind::Social).is_err());
        assert_eq!(tracker.painting_ids(), vec!["a"]);
        assert!(!tracker.status("a").unwrap().uploads["FASO"].is_uploaded());
        assert_eq!(tracker.platforms().len(), 2);

        std::fs::remove_file(&sub).unwrap();
        tracker.register("c", Path::new("/c.json")).unwrap();
        let reopened = UploadTracker::open(sub.join("upload_status.json"), &catalog()).unwrap();
        assert_eq!(reopened.painting_ids(), vec!["a", "c"]);
    }

    #[test]
    fn test_writes_leave_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let mut tracker = open(&dir);
        tracker.register("a", Path::new("/a.json")).unwrap();

        assert!(dir.path().join("upload_status.json").exists());
        assert!(!dir.path().join(".upload_status.json.tmp").exists());
    }
}

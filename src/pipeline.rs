// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch steps run after a processing session
//!
//! Each painting is handled on its own: a failure is recorded in the report
//! and the batch moves on to the next painting.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::PlatformKind;
use crate::metadata::{ImageVariant, MetadataStore, PaintingMetadata};
use crate::organizer::{FileOrganizer, OrganizeOutcome};
use crate::platforms::{faso, PlatformRegistry, PostResult};
use crate::scheduler::{ScheduledPost, Scheduler};
use crate::tracker::UploadTracker;
use crate::{ArtProcessorError, Result};

/// Result of one painting within a batch
#[derive(Debug)]
pub struct PaintingReport {
    pub painting: String,
    pub result: Result<OrganizeOutcome>,
}

impl PaintingReport {
    /// Problems needing manual attention, one line each
    pub fn problems(&self) -> Vec<String> {
        match &self.result {
            Ok(outcome) => outcome
                .failed
                .iter()
                .map(|(variant, e)| format!("{} ({} file): {}", self.painting, variant, e))
                .collect(),
            Err(e) => vec![format!("{}: {}", self.painting, e)],
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.is_complete())
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub paintings: Vec<PaintingReport>,
}

impl BatchReport {
    pub fn complete(&self) -> impl Iterator<Item = &str> {
        self.paintings
            .iter()
            .filter(|r| r.is_complete())
            .map(|r| r.painting.as_str())
    }

    pub fn problems(&self) -> Vec<String> {
        self.paintings.iter().flat_map(PaintingReport::problems).collect()
    }
}

/// Organize one painting and commit the paths of the variants that moved
pub fn organize_painting(
    organizer: &FileOrganizer,
    store: &MetadataStore,
    identifier: &str,
) -> Result<OrganizeOutcome> {
    let record = store.load(identifier)?;
    let outcome = organizer.organize(
        identifier,
        &record.collection,
        record.path_of(ImageVariant::Big),
        record.path_of(ImageVariant::Instagram),
    )?;

    let moved = |variant: ImageVariant| {
        outcome
            .placed
            .iter()
            .find(|m| m.variant == variant && m.moved)
            .map(|m| m.to.clone())
    };
    store.update_paths(identifier, moved(ImageVariant::Big), moved(ImageVariant::Instagram))?;

    Ok(outcome)
}

/// Organize every listed painting, never stopping at a failure
pub fn organize_batch(organizer: &FileOrganizer, store: &MetadataStore, identifiers: &[String]) -> BatchReport {
    let mut report = BatchReport::default();

    for id in identifiers {
        let result = organize_painting(organizer, store, id);
        match &result {
            Ok(outcome) if outcome.is_complete() => info!("Organized {} into {}", id, outcome.folder),
            Ok(outcome) => warn!("Organized {} partially ({} failed)", id, outcome.failed.len()),
            Err(e) => error!("Failed to organize {}: {}", id, e),
        }
        report.paintings.push(PaintingReport { painting: id.clone(), result });
    }

    report
}

/// Register paintings as pending on every platform; per-painting results
pub fn register_batch(
    tracker: &mut UploadTracker,
    store: &MetadataStore,
    identifiers: &[String],
) -> Vec<(String, Result<bool>)> {
    identifiers
        .iter()
        .map(|id| {
            let result = tracker.register_from_store(store, id);
            if let Err(e) = &result {
                error!("Failed to register {}: {}", id, e);
            }
            (id.clone(), result)
        })
        .collect()
}

/// Register every stored painting the tracker does not know yet
pub fn sync_tracker(tracker: &mut UploadTracker, store: &MetadataStore) -> Result<Vec<String>> {
    let missing: Vec<String> = store
        .list_identifiers()?
        .into_iter()
        .filter(|id| !tracker.contains(id))
        .collect();

    for id in &missing {
        tracker.register_from_store(store, id)?;
    }
    Ok(missing)
}

/// Caption built from title and description, cut to `max_len` characters
pub fn caption(record: &PaintingMetadata, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let full = if record.description.trim().is_empty() {
        record.title.selected.clone()
    } else {
        format!("{}\n\n{}", record.title.selected, record.description.trim())
    };

    if full.chars().count() <= max_len {
        return full;
    }
    let cut: String = full.chars().take(max_len - 1).collect();
    format!("{}…", cut.trim_end())
}

/// Post a painting through its platform handler and record the post
pub async fn post_painting(
    registry: &PlatformRegistry,
    tracker: &mut UploadTracker,
    store: &MetadataStore,
    identifier: &str,
    platform: &str,
    text: Option<&str>,
) -> Result<PostResult> {
    tracker.status(identifier)?;
    let record = store.load(identifier)?;
    let kind = registry.kind(platform)?;
    let handler = registry.get(platform)?;

    let variant = match kind {
        PlatformKind::Gallery => {
            let missing = faso::upload_readiness(&record);
            if !missing.is_empty() {
                return Err(ArtProcessorError::Config(format!(
                    "'{}' is not ready for {}: missing {}",
                    identifier,
                    handler.display_name(),
                    missing.join(", ")
                )));
            }
            ImageVariant::Big
        }
        // full-resolution files exceed social upload limits
        PlatformKind::Social => ImageVariant::Instagram,
    };
    let image: &Path = match record.path_of(variant) {
        Some(path) if path.is_file() => path,
        Some(path) => {
            return Err(ArtProcessorError::MissingFile {
                painting: identifier.to_string(),
                path: path.to_path_buf(),
            })
        }
        None => {
            return Err(ArtProcessorError::Config(format!(
                "'{}' has no {} image recorded",
                identifier, variant
            )))
        }
    };

    let text = match text {
        Some(t) => t.to_string(),
        None => caption(&record, handler.max_text_length()),
    };

    let result = handler.post_image(image, &text, &record.title.selected).await?;
    let at = Utc::now();
    tracker.mark_uploaded_at(identifier, handler.name(), at)?;
    if kind.is_repeatable() {
        store.record_post(identifier, handler.name(), result.post_url.as_deref(), at)?;
    }
    Ok(result)
}

/// Queue a social post for a stored painting
pub fn schedule_post(
    registry: &PlatformRegistry,
    store: &MetadataStore,
    scheduler: &mut Scheduler,
    identifier: &str,
    platform: &str,
    at: DateTime<Utc>,
) -> Result<String> {
    let record = store.load(identifier)?;
    let handler = registry.get(platform)?;
    if !registry.kind(platform)?.is_repeatable() {
        return Err(ArtProcessorError::Config(format!(
            "{} is a gallery platform; only social posts can be scheduled",
            handler.display_name()
        )));
    }
    scheduler.add_post(record.identifier(), &store.path_for(record.identifier()), handler.name(), at)
}

/// Attempt every scheduled post that is due, recording each outcome
pub async fn run_due_posts(
    registry: &PlatformRegistry,
    tracker: &mut UploadTracker,
    store: &MetadataStore,
    scheduler: &mut Scheduler,
    now: DateTime<Utc>,
) -> Result<Vec<ScheduledPost>> {
    let due: Vec<ScheduledPost> = scheduler.pending_at(now).into_iter().cloned().collect();
    let mut done = Vec::with_capacity(due.len());

    for post in due {
        let outcome = post_painting(registry, tracker, store, &post.content_id, &post.platform, None).await;
        let finished = match outcome {
            Ok(result) => scheduler.mark_posted(&post.id, result.post_url.as_deref())?,
            Err(e) => scheduler.mark_failed(&post.id, &e.to_string())?,
        };
        done.push(finished);
    }

    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DimensionUnit, PlatformConfig};
    use crate::metadata::Dimensions;
    use crate::platforms::Platform;
    use crate::scheduler::PostStatus;
    use crate::tracker::UploadState;
    use crate::AppConfig;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Env {
        _dir: TempDir,
        config: AppConfig,
        store: MetadataStore,
        organizer: FileOrganizer,
    }

    fn env() -> Env {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        for root in [config.big_root().unwrap(), config.instagram_root().unwrap()] {
            std::fs::create_dir_all(root.join("new-paintings")).unwrap();
        }
        let store = MetadataStore::from_config(&config).unwrap();
        let organizer = FileOrganizer::from_config(&config).unwrap();
        Env { _dir: dir, config, store, organizer }
    }

    fn add_painting(env: &Env, id: &str, collection: &str, with_secondary: bool) -> PaintingMetadata {
        let big = env.config.big_root().unwrap().join("new-paintings").join(format!("{}.jpg", id));
        std::fs::write(&big, "big").unwrap();
        let mut record = PaintingMetadata::new(id, id, big);
        record.collection = collection.to_string();
        if with_secondary {
            let ig = env.config.instagram_root().unwrap().join("new-paintings").join(format!("{}_ig.jpg", id));
            std::fs::write(&ig, "ig").unwrap();
            record.files.instagram = Some(ig);
        }
        env.store.save(&record).unwrap();
        record
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let env = env();
        add_painting(&env, "first", "", true);
        add_painting(&env, "second", "Oils", true);
        let ids = vec!["first".to_string(), "ghost".to_string(), "second".to_string()];

        let report = organize_batch(&env.organizer, &env.store, &ids);

        assert_eq!(report.complete().collect::<Vec<_>>(), vec!["second"]);
        let problems = report.problems();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("first:"));
        assert!(problems[1].starts_with("ghost:"));

        let second = env.store.load("second").unwrap();
        assert_eq!(second.files.big, env.config.big_root().unwrap().join("oils/second.jpg"));
    }

    #[test]
    fn test_partial_move_commits_only_moved_variant() {
        let env = env();
        let record = add_painting(&env, "harbor", "Harbors", true);
        std::fs::remove_file(record.files.instagram.as_ref().unwrap()).unwrap();

        let outcome = organize_painting(&env.organizer, &env.store, "harbor").unwrap();
        assert_eq!(outcome.failed.len(), 1);

        let stored = env.store.load("harbor").unwrap();
        assert_eq!(stored.files.big, env.config.big_root().unwrap().join("harbors/harbor.jpg"));
        assert_eq!(stored.files.instagram, record.files.instagram);
    }

    #[test]
    fn test_register_batch_and_sync() {
        let env = env();
        add_painting(&env, "a", "Oils", false);
        add_painting(&env, "b", "Oils", false);
        let mut tracker = UploadTracker::open(env.config.tracker_path().unwrap(), &env.config.platforms).unwrap();

        let results = register_batch(&mut tracker, &env.store, &["a".to_string(), "nope".to_string()]);
        assert!(*results[0].1.as_ref().unwrap());
        assert!(results[1].1.is_err());

        assert_eq!(sync_tracker(&mut tracker, &env.store).unwrap(), vec!["b"]);
        assert_eq!(tracker.painting_ids(), vec!["a", "b"]);
        assert_eq!(
            tracker.status("a").unwrap().metadata_path,
            env.store.path_for("a")
        );
    }

    #[test]
    fn test_caption_truncates() {
        let mut record = PaintingMetadata::new("x", "Sunset", PathBuf::from("/x.jpg"));
        assert_eq!(caption(&record, 100), "Sunset");
        record.description = "A long description of the evening sky".to_string();
        let short = caption(&record, 12);
        assert_eq!(short.chars().count(), 12);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_caption_zero_length_is_empty() {
        let record = PaintingMetadata::new("x", "Sunset", PathBuf::from("/x.jpg"));
        assert_eq!(caption(&record, 0), "");
        assert_eq!(caption(&record, 1), "…");
    }

    /// Social handler that accepts every post
    struct Accepting {
        name: String,
    }

    #[async_trait]
    impl Platform for Accepting {
        fn name(&self) -> &str {
            &self.name
        }
        fn display_name(&self) -> &str {
            &self.name
        }
        fn kind(&self) -> PlatformKind {
            PlatformKind::Social
        }
        fn max_text_length(&self) -> usize {
            500
        }
        fn is_configured(&self) -> bool {
            true
        }
        async fn verify_credentials(&self) -> Result<()> {
            Ok(())
        }
        async fn post_image(&self, _image: &Path, _text: &str, _alt: &str) -> Result<PostResult> {
            Ok(PostResult {
                post_id: Some("42".to_string()),
                post_url: Some(format!("https://{}.example/42", self.name.to_lowercase())),
            })
        }
    }

    fn accepting(config: &PlatformConfig) -> Box<dyn Platform> {
        Box::new(Accepting { name: config.name.clone() })
    }

    fn accepting_registry(env: &Env) -> PlatformRegistry {
        let mut registry = PlatformRegistry::new(&env.config.platforms);
        registry.register(PlatformConfig::new("Mastodon", PlatformKind::Social), accepting);
        registry
    }

    #[tokio::test]
    async fn test_post_requires_registration_and_reports_unsupported() {
        let env = env();
        add_painting(&env, "a", "Oils", true);
        let registry = PlatformRegistry::new(&env.config.platforms);
        let mut tracker = UploadTracker::open(env.config.tracker_path().unwrap(), &env.config.platforms).unwrap();

        let err = post_painting(&registry, &mut tracker, &env.store, "a", "Cara", None).await.unwrap_err();
        assert!(matches!(err, ArtProcessorError::NotFound { kind: "painting", .. }));

        tracker.register_from_store(&env.store, "a").unwrap();
        let err = post_painting(&registry, &mut tracker, &env.store, "a", "Cara", None).await.unwrap_err();
        assert!(matches!(err, ArtProcessorError::Unsupported { .. }));
        assert_eq!(tracker.pending("Cara").unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_gallery_post_checks_readiness() {
        let env = env();
        let mut record = add_painting(&env, "a", "Oils", false);
        record.dimensions = Dimensions::new(30.0, 40.0, None, DimensionUnit::Centimeters);
        env.store.save(&record).unwrap();
        let registry = PlatformRegistry::new(&env.config.platforms);
        let mut tracker = UploadTracker::open(env.config.tracker_path().unwrap(), &env.config.platforms).unwrap();
        tracker.register_from_store(&env.store, "a").unwrap();

        let err = post_painting(&registry, &mut tracker, &env.store, "a", "FASO", None).await.unwrap_err();
        assert!(matches!(err, ArtProcessorError::Config(ref m) if m.contains("medium") && m.contains("description")));
    }

    #[tokio::test]
    async fn test_missing_secondary_reports_secondary_path() {
        let env = env();
        let record = add_painting(&env, "a", "Oils", true);
        let registry = accepting_registry(&env);
        let mut tracker = UploadTracker::open(env.config.tracker_path().unwrap(), &env.config.platforms).unwrap();
        tracker.register_from_store(&env.store, "a").unwrap();

        let ig = record.files.instagram.clone().unwrap();
        std::fs::remove_file(&ig).unwrap();
        let err = post_painting(&registry, &mut tracker, &env.store, "a", "Mastodon", None).await.unwrap_err();
        assert!(matches!(err, ArtProcessorError::MissingFile { ref path, .. } if *path == ig));

        add_painting(&env, "b", "Oils", false);
        tracker.register_from_store(&env.store, "b").unwrap();
        let err = post_painting(&registry, &mut tracker, &env.store, "b", "Mastodon", None).await.unwrap_err();
        assert!(matches!(err, ArtProcessorError::Config(ref m) if m.contains("no secondary image")));
    }

    #[tokio::test]
    async fn test_social_post_records_url_on_metadata() {
        let env = env();
        add_painting(&env, "a", "Oils", true);
        let registry = accepting_registry(&env);
        let mut tracker = UploadTracker::open(env.config.tracker_path().unwrap(), &env.config.platforms).unwrap();
        tracker.register_from_store(&env.store, "a").unwrap();

        let result = post_painting(&registry, &mut tracker, &env.store, "a", "mastodon", None).await.unwrap();
        assert_eq!(result.post_url.as_deref(), Some("https://mastodon.example/42"));

        let state = &tracker.status("a").unwrap().uploads["Mastodon"];
        assert_eq!(state.post_count(), 1);
        let posts = &env.store.load("a").unwrap().social_media["Mastodon"];
        assert_eq!(posts.post_count, 1);
        assert_eq!(posts.post_url.as_deref(), Some("https://mastodon.example/42"));
        assert!(matches!(state, UploadState::Posts(p) if p.last_posted == posts.last_posted));
    }

    #[tokio::test]
    async fn test_scheduled_posts_run_when_due() {
        let env = env();
        add_painting(&env, "a", "Oils", true);
        add_painting(&env, "b", "Oils", true);
        let registry = accepting_registry(&env);
        let mut tracker = UploadTracker::open(env.config.tracker_path().unwrap(), &env.config.platforms).unwrap();
        tracker.register_from_store(&env.store, "a").unwrap();
        tracker.register_from_store(&env.store, "b").unwrap();
        let mut scheduler = Scheduler::open(env.config.schedule_path().unwrap()).unwrap();

        let now = Utc::now();
        let due = schedule_post(&registry, &env.store, &mut scheduler, "a", "Mastodon", now - Duration::minutes(1)).unwrap();
        let failing = schedule_post(&registry, &env.store, &mut scheduler, "b", "Cara", now - Duration::minutes(2)).unwrap();
        schedule_post(&registry, &env.store, &mut scheduler, "b", "Mastodon", now + Duration::days(1)).unwrap();

        assert!(matches!(
            schedule_post(&registry, &env.store, &mut scheduler, "a", "FASO", now),
            Err(ArtProcessorError::Config(_))
        ));
        assert!(matches!(
            schedule_post(&registry, &env.store, &mut scheduler, "ghost", "Mastodon", now),
            Err(ArtProcessorError::NotFound { kind: "painting", .. })
        ));

        let done = run_due_posts(&registry, &mut tracker, &env.store, &mut scheduler, now).await.unwrap();
        assert_eq!(done.len(), 2);
        assert_eq!(done[0].id, failing);
        assert_eq!(done[0].status, PostStatus::Failed);
        assert!(done[0].error.is_some());
        assert_eq!(done[1].id, due);
        assert_eq!(done[1].status, PostStatus::Posted);
        assert_eq!(done[1].post_url.as_deref(), Some("https://mastodon.example/42"));

        assert!(scheduler.pending_at(now).is_empty());
        assert_eq!(scheduler.upcoming_at(now).len(), 1);
        assert_eq!(tracker.status("a").unwrap().uploads["Mastodon"].post_count(), 1);
        assert!(!tracker.status("b").unwrap().uploads["Cara"].is_uploaded());
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Scheduled social posts
//!
//! Posts waiting for their time live in `scheduled_posts`. Once a post is
//! attempted it moves to `history` with its outcome. Cancelled posts are
//! dropped. The document is written atomically after every change.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::persist;
use crate::{ArtProcessorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    Posted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub id: String,
    /// Painting identifier
    pub content_id: String,
    pub metadata_path: PathBuf,
    pub platform: String,
    pub scheduled_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: PostStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub post_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ScheduleDocument {
    #[serde(default)]
    scheduled_posts: Vec<ScheduledPost>,
    #[serde(default)]
    history: Vec<ScheduledPost>,
}

/// Owner of the schedule document
#[derive(Debug)]
pub struct Scheduler {
    path: PathBuf,
    doc: ScheduleDocument,
}

impl Scheduler {
    pub fn open(path: PathBuf) -> Result<Self> {
        let doc = persist::read_json(&path)?.unwrap_or_default();
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a post; returns its id
    pub fn add_post(
        &mut self,
        content_id: &str,
        metadata_path: &Path,
        platform: &str,
        scheduled_time: DateTime<Utc>,
    ) -> Result<String> {
        let post = ScheduledPost {
            id: uuid::Uuid::new_v4().to_string(),
            content_id: content_id.to_string(),
            metadata_path: metadata_path.to_path_buf(),
            platform: platform.to_string(),
            scheduled_time,
            created_at: Utc::now(),
            status: PostStatus::Scheduled,
            completed_at: None,
            post_url: None,
            error: None,
        };
        let id = post.id.clone();

        let mut doc = self.doc.clone();
        doc.scheduled_posts.push(post);
        self.commit(doc)?;

        info!("Scheduled {} on {} for {}", content_id, platform, scheduled_time);
        Ok(id)
    }

    /// Posts whose time has come, oldest first
    pub fn pending(&self) -> Vec<&ScheduledPost> {
        self.pending_at(Utc::now())
    }

    pub fn pending_at(&self, now: DateTime<Utc>) -> Vec<&ScheduledPost> {
        self.queued(|post| post.scheduled_time <= now)
    }

    /// Posts still in the future, soonest first
    pub fn upcoming(&self) -> Vec<&ScheduledPost> {
        self.upcoming_at(Utc::now())
    }

    pub fn upcoming_at(&self, now: DateTime<Utc>) -> Vec<&ScheduledPost> {
        self.queued(|post| post.scheduled_time > now)
    }

    fn queued(&self, keep: impl Fn(&ScheduledPost) -> bool) -> Vec<&ScheduledPost> {
        let mut posts: Vec<&ScheduledPost> =
            self.doc.scheduled_posts.iter().filter(|p| keep(p)).collect();
        posts.sort_by_key(|p| p.scheduled_time);
        posts
    }

    /// Drop a queued post; `false` when no such post is queued
    pub fn cancel_post(&mut self, id: &str) -> Result<bool> {
        if !self.doc.scheduled_posts.iter().any(|p| p.id == id) {
            return Ok(false);
        }

        let mut doc = self.doc.clone();
        doc.scheduled_posts.retain(|p| p.id != id);
        self.commit(doc)?;
        info!("Cancelled scheduled post {}", id);
        Ok(true)
    }

    pub fn mark_posted(&mut self, id: &str, post_url: Option<&str>) -> Result<ScheduledPost> {
        self.complete(id, PostStatus::Posted, post_url.map(String::from), None)
    }

    pub fn mark_failed(&mut self, id: &str, error: &str) -> Result<ScheduledPost> {
        warn!("Scheduled post {} failed: {}", id, error);
        self.complete(id, PostStatus::Failed, None, Some(error.to_string()))
    }

    /// Attempted posts, most recent first
    pub fn history(&self, limit: usize) -> Vec<&ScheduledPost> {
        self.doc.history.iter().rev().take(limit).collect()
    }

    fn complete(
        &mut self,
        id: &str,
        status: PostStatus,
        post_url: Option<String>,
        error: Option<String>,
    ) -> Result<ScheduledPost> {
        let mut doc = self.doc.clone();
        let index = doc
            .scheduled_posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ArtProcessorError::NotFound {
                kind: "scheduled post",
                name: id.to_string(),
            })?;

        let mut post = doc.scheduled_posts.remove(index);
        post.status = status;
        post.completed_at = Some(Utc::now());
        post.post_url = post_url;
        post.error = error;
        doc.history.push(post.clone());

        self.commit(doc)?;
        debug!("Scheduled post {} is now {:?}", id, status);
        Ok(post)
    }

    fn commit(&mut self, doc: ScheduleDocument) -> Result<()> {
        persist::write_json(&self.path, &doc)?;
        self.doc = doc;
        Ok(())
    }
}

/// Parse a schedule time: RFC 3339, or local `YYYY-MM-DD HH:MM` / `YYYY-MM-DDTHH:MM`
pub fn parse_schedule_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Ok(time.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ArtProcessorError::Config(format!("Unrecognized schedule time: {:?}", input)))
}

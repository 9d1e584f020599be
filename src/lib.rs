// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Art Processor: painting metadata, collection folders and upload tracking
//!
//! Bookkeeping for an artist's painting files. Each painting has a metadata
//! record, and a collection organizer moves its image files into collection
//! folders. An upload tracker records which platforms a painting went to,
//! and a schedule holds social posts waiting to go out.

pub mod config;
pub mod discovery;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod organizer;
pub mod persist;
pub mod pipeline;
pub mod platforms;
pub mod scheduler;
pub mod tracker;

pub use config::AppConfig;
pub use error::{ArtProcessorError, Result};

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Art Processor CLI
//!
//! Batch commands around the metadata store, collection organizer, upload
//! tracker and post schedule.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use art_processor::config::{AppConfig, OptionList, PlatformKind};
use art_processor::discovery::{find_painting_pairs, list_categories, suggested_creation_date};
use art_processor::metadata::MetadataStore;
use art_processor::naming::sanitize_filename;
use art_processor::organizer::{rename_painting_pair, FileOrganizer};
use art_processor::pipeline::{
    organize_batch, post_painting, register_batch, run_due_posts, schedule_post, sync_tracker,
};
use art_processor::platforms::{faso, PlatformRegistry};
use art_processor::scheduler::{parse_schedule_time, PostStatus, ScheduledPost, Scheduler};
use art_processor::tracker::{UploadState, UploadTracker};

/// Art Processor - painting metadata and upload bookkeeping
#[derive(Parser, Debug)]
#[command(name = "art-processor")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Organize painting files and track where they were uploaded", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List source categories and how many paintings each holds
    Categories,

    /// List painting pairs found in a category
    Scan {
        /// Category folder (default: the new-paintings folder)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Move paintings into their collection folders
    Organize {
        /// Painting identifiers
        ids: Vec<String>,

        /// Organize every stored painting
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Do not register organized paintings in the upload tracker
        #[arg(long)]
        no_register: bool,
    },

    /// Upload tracker operations
    Tracker {
        #[command(subcommand)]
        action: TrackerCommands,
    },

    /// Metadata record operations
    Metadata {
        #[command(subcommand)]
        action: MetadataCommands,
    },

    /// Gallery listing helpers
    Gallery {
        #[command(subcommand)]
        action: GalleryCommands,
    },

    /// Rename a painting pair after its title
    Rename {
        /// Full-resolution image
        full: PathBuf,

        /// Title to derive the new file name from
        title: String,

        /// Secondary (social) image
        #[arg(short, long)]
        secondary: Option<PathBuf>,
    },

    /// List known platforms
    Platforms,

    /// Post a painting to a platform
    Post {
        id: String,
        platform: String,

        /// Caption (default: title and description)
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Scheduled social posts
    Schedule {
        #[command(subcommand)]
        action: ScheduleCommands,
    },

    /// Extend the configured option lists
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Create the folder layout and a default config
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TrackerCommands {
    /// Register a painting as pending on every platform
    Register { id: String },

    /// Record an upload or post
    Mark { id: String, platform: String },

    /// List paintings not yet uploaded to a platform
    Pending { platform: String },

    /// Add a platform and back-fill it into every painting
    AddPlatform {
        name: String,

        #[arg(short, long, value_enum, default_value = "social")]
        kind: PlatformKind,
    },

    /// Show per-platform counts, or one painting's state
    Status { id: Option<String> },

    /// Register every stored painting not yet tracked
    Sync,
}

#[derive(Subcommand, Debug)]
enum MetadataCommands {
    /// Print a painting's record
    Show { id: String },

    /// List stored identifiers
    List,
}

#[derive(Subcommand, Debug)]
enum GalleryCommands {
    /// Show pending gallery uploads and what each is missing
    Check {
        /// Gallery platform name
        #[arg(short, long, default_value = "FASO")]
        platform: String,
    },
}

#[derive(Subcommand, Debug)]
enum ScheduleCommands {
    /// Queue a post for later
    Add {
        id: String,
        platform: String,

        /// When to post: RFC 3339, or local "YYYY-MM-DD HH:MM"
        time: String,
    },

    /// Show due and upcoming posts
    List,

    /// Drop a queued post
    Cancel { post_id: String },

    /// Attempt every post that is due
    Run,

    /// Show attempted posts, newest first
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    /// Append a value to an option list
    AddOption {
        #[arg(value_enum)]
        list: OptionList,
        value: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;

    match cli.command {
        Commands::Categories => run_categories(&config),
        Commands::Scan { category } => run_scan(&config, category),
        Commands::Organize { ids, all, no_register } => run_organize(&config, ids, all, no_register),
        Commands::Tracker { action } => run_tracker_command(&mut config, action, &cli.config),
        Commands::Metadata { action } => run_metadata_command(&config, action),
        Commands::Gallery { action } => run_gallery_command(&config, action),
        Commands::Rename { full, title, secondary } => run_rename(&full, &title, secondary.as_deref()),
        Commands::Platforms => run_platforms(&config),
        Commands::Post { id, platform, text } => run_post(&config, &id, &platform, text.as_deref()).await,
        Commands::Schedule { action } => run_schedule_command(&config, action).await,
        Commands::Admin { action } => run_admin_command(&mut config, action, &cli.config),
        Commands::Config { action } => run_config_command(&config, action, &cli.config),
        Commands::Init { dir, force } => run_init(dir, force),
    }
}

fn open_tracker(config: &AppConfig) -> anyhow::Result<UploadTracker> {
    let path = config.tracker_path()?;
    UploadTracker::open(path.clone(), &config.platforms)
        .with_context(|| format!("opening upload tracker {:?}", path))
}

fn open_scheduler(config: &AppConfig) -> anyhow::Result<Scheduler> {
    let path = config.schedule_path()?;
    Scheduler::open(path.clone()).with_context(|| format!("opening post schedule {:?}", path))
}

fn run_categories(config: &AppConfig) -> anyhow::Result<()> {
    let categories = list_categories(config)?;
    if categories.is_empty() {
        warn!("No categories found under {:?}", config.big_root()?);
        return Ok(());
    }

    println!("Categories:");
    for category in categories {
        let count = find_painting_pairs(config, &category)?.len();
        println!("  {}: {} painting(s)", category, count);
    }
    Ok(())
}

fn run_scan(config: &AppConfig, category: Option<String>) -> anyhow::Result<()> {
    let category = category.unwrap_or_else(|| config.paths.new_paintings_folder.clone());
    let pairs = find_painting_pairs(config, &category)?;

    println!("Found {} painting(s) in {}", pairs.len(), category);
    for pair in pairs {
        let date = suggested_creation_date(&pair.full)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| "unknown date".to_string());
        match &pair.secondary {
            Some(secondary) => println!("  {} + {} ({})", pair.full.display(), secondary.display(), date),
            None => println!("  {} (no secondary version, {})", pair.full.display(), date),
        }
    }
    Ok(())
}

fn run_organize(config: &AppConfig, ids: Vec<String>, all: bool, no_register: bool) -> anyhow::Result<()> {
    let store = MetadataStore::from_config(config)?;
    let organizer = FileOrganizer::from_config(config)?;

    let ids = if all { store.list_identifiers()? } else { ids };
    if ids.is_empty() {
        println!("Nothing to organize");
        return Ok(());
    }

    let report = organize_batch(&organizer, &store, &ids);
    let organized: Vec<String> = report.complete().map(String::from).collect();

    println!("Organized {} of {} painting(s)", organized.len(), ids.len());
    for painting in &report.paintings {
        if let Ok(outcome) = &painting.result {
            for placed in &outcome.placed {
                let marker = if placed.moved { "moved" } else { "in place" };
                println!("  {} [{}] {}", painting.painting, marker, placed.to.display());
            }
        }
    }

    let problems = report.problems();
    if !problems.is_empty() {
        println!("\nNeeds attention:");
        for problem in problems {
            println!("  {}", problem);
        }
    }

    if !no_register && !organized.is_empty() {
        let mut tracker = open_tracker(config)?;
        let registered = register_batch(&mut tracker, &store, &organized);
        let new = registered.iter().filter(|(_, r)| matches!(r, Ok(true))).count();
        info!("Registered {} new painting(s) for upload tracking", new);
        for (id, result) in registered {
            if let Err(e) = result {
                println!("  {}: not registered ({})", id, e);
            }
        }
    }

    Ok(())
}

fn describe_state(state: &UploadState) -> String {
    match state {
        UploadState::Flag(true) => "uploaded".to_string(),
        UploadState::Flag(false) => "pending".to_string(),
        UploadState::Posts(record) if record.uploaded => format!(
            "posted {}x, last {}",
            record.post_count,
            record
                .last_posted
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ),
        UploadState::Posts(_) => "pending".to_string(),
    }
}

fn run_tracker_command(config: &mut AppConfig, action: TrackerCommands, config_path: &Path) -> anyhow::Result<()> {
    let mut tracker = open_tracker(config)?;

    match action {
        TrackerCommands::Register { id } => {
            let store = MetadataStore::from_config(config)?;
            if tracker.register_from_store(&store, &id)? {
                println!("Registered {}", id);
            } else {
                println!("{} was already registered", id);
            }
        }
        TrackerCommands::Mark { id, platform } => {
            let state = tracker.mark_uploaded(&id, &platform)?;
            println!("{} on {}: {}", id, platform, describe_state(&state));
        }
        TrackerCommands::Pending { platform } => {
            let pending = tracker.pending(&platform)?;
            println!("Pending on {} ({}):", platform, pending.len());
            for id in pending {
                println!("  {}", id);
            }
        }
        TrackerCommands::AddPlatform { name, kind } => {
            let added = tracker.add_platform(&name, kind)?;
            if config.add_platform(&name, kind)? {
                config.save(config_path)?;
            }
            if added {
                println!("Added {} platform {}", kind, name);
            } else {
                println!("Platform {} already known", name);
            }
        }
        TrackerCommands::Status { id: Some(id) } => {
            let status = tracker.status(&id)?;
            println!("{}", id);
            println!("  Metadata: {}", status.metadata_path.display());
            println!("  Processed: {}", status.processed_date.format("%Y-%m-%d %H:%M"));
            for (platform, state) in &status.uploads {
                println!("  {}: {}", platform, describe_state(state));
            }
        }
        TrackerCommands::Status { id: None } => {
            println!("Upload status ({} paintings):", tracker.painting_ids().len());
            for summary in tracker.summary() {
                println!(
                    "  {:<12} {:<8} {} uploaded, {} pending",
                    summary.name, summary.kind.to_string(), summary.uploaded, summary.pending
                );
            }
        }
        TrackerCommands::Sync => {
            let store = MetadataStore::from_config(config)?;
            let added = sync_tracker(&mut tracker, &store)?;
            println!("Registered {} painting(s)", added.len());
            for id in added {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}

fn run_metadata_command(config: &AppConfig, action: MetadataCommands) -> anyhow::Result<()> {
    let store = MetadataStore::from_config(config)?;

    match action {
        MetadataCommands::Show { id } => {
            let record = store.load(&id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            for (platform, posts) in &record.social_media {
                if let Some(url) = &posts.post_url {
                    println!("Latest {} post: {}", platform, url);
                }
            }
        }
        MetadataCommands::List => {
            let ids = store.list_identifiers()?;
            println!("Metadata records ({}):", ids.len());
            for id in ids {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}

fn run_gallery_command(config: &AppConfig, action: GalleryCommands) -> anyhow::Result<()> {
    let GalleryCommands::Check { platform } = action;
    let store = MetadataStore::from_config(config)?;
    let tracker = open_tracker(config)?;

    let pending = tracker.pending(&platform)?;
    if pending.is_empty() {
        println!("No paintings pending {} upload.", platform);
        return Ok(());
    }

    let mut ready = 0;
    println!("Pending {} uploads:", platform);
    for id in pending {
        let missing = match store.load(&id) {
            Ok(record) => faso::upload_readiness(&record),
            Err(e) => vec![e.to_string()],
        };
        if missing.is_empty() {
            ready += 1;
            let year = store.load(&id).map(|r| faso::creation_year(&r)).unwrap_or_default();
            println!("  {:<30} ready ({})", id, year);
        } else {
            println!("  {:<30} missing: {}", id, missing.join(", "));
        }
    }
    println!("\n{} painting(s) ready for upload", ready);

    Ok(())
}

fn run_rename(full: &Path, title: &str, secondary: Option<&Path>) -> anyhow::Result<()> {
    let stem = sanitize_filename(title)?;
    let (new_full, new_secondary) = rename_painting_pair(full, secondary, &stem)?;

    println!("Painting identifier: {}", stem);
    println!("  {}", new_full.display());
    if let Some(path) = new_secondary {
        println!("  {}", path.display());
    }
    Ok(())
}

fn run_platforms(config: &AppConfig) -> anyhow::Result<()> {
    let registry = PlatformRegistry::new(&config.platforms);

    println!("Platforms ({}):", registry.len());
    for entry in registry.catalog() {
        let handler = registry.get(&entry.name)?;
        println!(
            "  {:<12} {:<8} {}",
            handler.display_name(),
            entry.kind.to_string(),
            if handler.is_configured() { "configured" } else { "not configured" }
        );
    }
    Ok(())
}

async fn run_post(config: &AppConfig, id: &str, platform: &str, text: Option<&str>) -> anyhow::Result<()> {
    let registry = PlatformRegistry::new(&config.platforms);
    let store = MetadataStore::from_config(config)?;
    let mut tracker = open_tracker(config)?;

    let result = post_painting(&registry, &mut tracker, &store, id, platform, text)
        .await
        .with_context(|| format!("posting {} to {}", id, platform))?;

    println!("Posted {} to {}", id, platform);
    if let Some(url) = result.post_url {
        println!("  {}", url);
    }
    Ok(())
}

fn describe_post(post: &ScheduledPost) -> String {
    let when = post.scheduled_time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
    let outcome = match post.status {
        PostStatus::Scheduled => String::new(),
        PostStatus::Posted => format!(" posted {}", post.post_url.as_deref().unwrap_or("")),
        PostStatus::Failed => format!(" failed: {}", post.error.as_deref().unwrap_or("unknown error")),
    };
    format!("{}  {} on {} at {}{}", post.id, post.content_id, post.platform, when, outcome)
}

async fn run_schedule_command(config: &AppConfig, action: ScheduleCommands) -> anyhow::Result<()> {
    let mut scheduler = open_scheduler(config)?;

    match action {
        ScheduleCommands::Add { id, platform, time } => {
            let at = parse_schedule_time(&time)?;
            let registry = PlatformRegistry::new(&config.platforms);
            let store = MetadataStore::from_config(config)?;
            let post_id = schedule_post(&registry, &store, &mut scheduler, &id, &platform, at)?;
            println!("Scheduled {} on {} ({})", id, platform, post_id);
        }
        ScheduleCommands::List => {
            let pending = scheduler.pending();
            println!("Due ({}):", pending.len());
            for post in pending {
                println!("  {}", describe_post(post));
            }
            let upcoming = scheduler.upcoming();
            println!("Upcoming ({}):", upcoming.len());
            for post in upcoming {
                println!("  {}", describe_post(post));
            }
        }
        ScheduleCommands::Cancel { post_id } => {
            if scheduler.cancel_post(&post_id)? {
                println!("Cancelled {}", post_id);
            } else {
                println!("No scheduled post {}", post_id);
            }
        }
        ScheduleCommands::Run => {
            let registry = PlatformRegistry::new(&config.platforms);
            let store = MetadataStore::from_config(config)?;
            let mut tracker = open_tracker(config)?;
            let done = run_due_posts(&registry, &mut tracker, &store, &mut scheduler, chrono::Utc::now()).await?;

            let posted = done.iter().filter(|p| p.status == PostStatus::Posted).count();
            println!("Posted {} of {} due post(s)", posted, done.len());
            for post in &done {
                println!("  {}", describe_post(post));
            }
        }
        ScheduleCommands::History { limit } => {
            for post in scheduler.history(limit) {
                println!("{}", describe_post(post));
            }
        }
    }

    Ok(())
}

fn run_admin_command(config: &mut AppConfig, action: AdminCommands, config_path: &Path) -> anyhow::Result<()> {
    match action {
        AdminCommands::AddOption { list, value } => {
            if config.add_option(list, &value)? {
                config.save(config_path)?;
                println!("Added '{}' to {}", value.trim(), list);
            } else {
                println!("'{}' already in {}", value.trim(), list);
            }
        }
    }
    Ok(())
}

fn run_config_command(config: &AppConfig, action: ConfigCommands, config_path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            let problems = config.validate();
            if problems.is_empty() {
                println!("Configuration at {:?} is valid", config_path);
            } else {
                println!("Configuration at {:?} has problems:", config_path);
                for problem in &problems {
                    println!("  {}", problem);
                }
            }
            let paths = [
                ("Big paintings", config.big_root()),
                ("Instagram paintings", config.instagram_root()),
                ("Metadata", config.metadata_root()),
                ("Upload tracker", config.tracker_path()),
                ("Schedule", config.schedule_path()),
            ];
            for (label, path) in paths {
                match path {
                    Ok(path) => println!("  {}: {}", label, path.display()),
                    Err(e) => println!("  {}: {}", label, e),
                }
            }
        }
    }

    Ok(())
}

fn run_init(dir: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        anyhow::bail!("config.json already exists. Use --force to overwrite");
    }

    let config = AppConfig::rooted_at(&target);
    for root in [config.big_root()?, config.instagram_root()?] {
        std::fs::create_dir_all(root.join(&config.paths.new_paintings_folder))?;
    }
    std::fs::create_dir_all(config.metadata_root()?)?;
    config.save(&config_path)?;

    println!("Art processor initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - my-paintings-big/{}/", config.paths.new_paintings_folder);
    println!("  - my-paintings-instagram/{}/", config.paths.new_paintings_folder);
    println!("  - processed-metadata/");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["art-processor"]).is_err());
    }

    #[test]
    fn test_cli_organize_command() {
        let cli = Cli::try_parse_from(["art-processor", "organize", "bavarian_twilight", "sunset"]).unwrap();

        match cli.command {
            Commands::Organize { ids, all, no_register } => {
                assert_eq!(ids, vec!["bavarian_twilight", "sunset"]);
                assert!(!all);
                assert!(!no_register);
            }
            _ => panic!("Expected Organize command"),
        }
    }

    #[test]
    fn test_cli_organize_all_conflicts_with_ids() {
        assert!(Cli::try_parse_from(["art-processor", "organize", "--all", "x"]).is_err());
    }

    #[test]
    fn test_cli_add_platform_kind() {
        let cli = Cli::try_parse_from([
            "art-processor", "tracker", "add-platform", "Saatchi", "--kind", "gallery",
        ])
        .unwrap();

        match cli.command {
            Commands::Tracker { action: TrackerCommands::AddPlatform { name, kind } } => {
                assert_eq!(name, "Saatchi");
                assert_eq!(kind, PlatformKind::Gallery);
            }
            _ => panic!("Expected tracker add-platform command"),
        }
    }

    #[test]
    fn test_cli_admin_add_option() {
        let cli = Cli::try_parse_from([
            "art-processor", "--config", "/tmp/c.json", "admin", "add-option", "mediums", "gouache",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("/tmp/c.json"));
        match cli.command {
            Commands::Admin { action: AdminCommands::AddOption { list, value } } => {
                assert_eq!(list, OptionList::Mediums);
                assert_eq!(value, "gouache");
            }
            _ => panic!("Expected admin add-option command"),
        }
    }

    #[test]
    fn test_cli_schedule_commands() {
        let cli = Cli::try_parse_from([
            "art-processor", "schedule", "add", "harbor", "Mastodon", "2030-01-01 10:00",
        ])
        .unwrap();
        match cli.command {
            Commands::Schedule { action: ScheduleCommands::Add { id, platform, time } } => {
                assert_eq!(id, "harbor");
                assert_eq!(platform, "Mastodon");
                assert_eq!(time, "2030-01-01 10:00");
            }
            _ => panic!("Expected schedule add command"),
        }

        let cli = Cli::try_parse_from(["art-processor", "schedule", "history"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Schedule { action: ScheduleCommands::History { limit: 10 } }
        ));

        let cli = Cli::try_parse_from(["art-processor", "schedule", "history", "--limit", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Schedule { action: ScheduleCommands::History { limit: 3 } }
        ));
    }

    #[test]
    fn test_describe_state() {
        assert_eq!(describe_state(&UploadState::Flag(false)), "pending");
        assert_eq!(describe_state(&UploadState::Flag(true)), "uploaded");
    }
}

//! Shared types, error model, and configuration for CourseHub.
//!
//! This crate is the foundation depended on by all other CourseHub crates.
//! It provides:
//! - [`CourseHubError`]: the unified error type
//! - Content types ([`Course`], [`Resource`], [`LearningPath`], [`DomainInfo`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, ContentConfig, LinkCheckConfig, QualityConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CourseHubError, Result};
pub use types::{
    BuildId, BuildManifest, CURRENT_SCHEMA_VERSION, Course, Difficulty, DomainInfo, EntityKind,
    ExternalLink, LearningPath, PathStep, Resource, ResourceKind, Session, SiteConfig,
};

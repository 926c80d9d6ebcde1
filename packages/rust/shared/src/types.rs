//! Core content types for the CourseHub portal.
//!
//! All records are read-only snapshots deserialized from YAML at load time.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the exported `manifest.json`.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// Course difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// A course in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier (also the URL slug).
    pub id: String,
    pub title: String,
    /// Free-form course type, e.g. `lecture` or `workshop`.
    #[serde(rename = "type")]
    pub course_type: String,
    pub year: u16,
    pub difficulty: Difficulty,
    pub summary: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub instructors: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Sessions in teaching order.
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub links: Vec<ExternalLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
}

/// A single session (lecture, lab, seminar) of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A labelled outbound link (slides, recordings, repositories).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLink {
    pub label: String,
    pub url: String,
}

fn default_language() -> String {
    "en".into()
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Kind of a standalone learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Dataset,
    Tool,
    Paper,
    Book,
    Video,
    Website,
    Tutorial,
    Other,
}

/// A standalone resource (dataset, tool, paper, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

// ---------------------------------------------------------------------------
// LearningPath
// ---------------------------------------------------------------------------

/// An ordered curriculum of steps referencing courses or resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub audience: String,
    /// Human-readable estimate, e.g. `8 weeks`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub steps: Vec<PathStep>,
}

/// One step of a learning path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathStep {
    pub order: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

// ---------------------------------------------------------------------------
// DomainInfo / SiteConfig
// ---------------------------------------------------------------------------

/// Static description of one application domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainInfo {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub methodologies: Vec<String>,
    /// Keywords matched against tags, titles and summaries.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Site-wide metadata from `site.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Canonical origin, e.g. `https://courses.example.org`.
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entity references
// ---------------------------------------------------------------------------

/// Which collection an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Course,
    LearningPath,
    Resource,
}

impl EntityKind {
    /// URL segment under which pages of this kind are exported.
    pub fn url_segment(self) -> &'static str {
        match self {
            Self::Course => "courses",
            Self::LearningPath => "paths",
            Self::Resource => "resources",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Course => "course",
            Self::LearningPath => "learning_path",
            Self::Resource => "resource",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Build manifest
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one static export run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub Uuid);

impl BuildId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `manifest.json` written at the root of every export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    pub schema_version: u32,
    pub build_id: BuildId,
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub course_count: usize,
    pub resource_count: usize,
    pub path_count: usize,
    /// Relative file path → SHA-256 hex digest.
    pub files: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_deserializes_with_defaults() {
        let yaml = r#"
id: urban-101
title: Urban Analytics
type: lecture
year: 2024
difficulty: beginner
summary: Introduction to urban data.
tags: [urban, gis, urban]
"#;
        let course: Course = serde_yaml::from_str(yaml).expect("parse course");
        assert_eq!(course.course_type, "lecture");
        assert_eq!(course.tags.len(), 2);
        assert_eq!(course.language, "en");
        assert!(course.sessions.is_empty());
        assert!(course.last_updated.is_none());
    }

    #[test]
    fn resource_kind_is_lowercase() {
        let yaml = "id: osm\ntitle: OpenStreetMap\ntype: dataset\nurl: https://www.openstreetmap.org\n";
        let res: Resource = serde_yaml::from_str(yaml).expect("parse resource");
        assert_eq!(res.kind, ResourceKind::Dataset);
        assert!(res.difficulty.is_none());
    }

    #[test]
    fn unknown_resource_kind_is_rejected() {
        let yaml = "id: x\ntitle: X\ntype: podcast\nurl: https://example.com\n";
        assert!(serde_yaml::from_str::<Resource>(yaml).is_err());
    }

    #[test]
    fn step_references_are_optional() {
        let yaml = "order: 1\ntitle: Read the intro\n";
        let step: PathStep = serde_yaml::from_str(yaml).expect("parse step");
        assert!(step.course_id.is_none());
        assert!(step.resource_id.is_none());
    }

    #[test]
    fn manifest_serialization() {
        let manifest = BuildManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            build_id: BuildId::new(),
            tool_version: "0.1.0".into(),
            generated_at: Utc::now(),
            course_count: 2,
            resource_count: 1,
            path_count: 1,
            files: BTreeMap::from([("index.json".to_string(), "abc".to_string())]),
        };
        let json = serde_json::to_string(&manifest).expect("serialize");
        let parsed: BuildManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.build_id, manifest.build_id);
        assert_eq!(parsed.files.len(), 1);
    }

    #[test]
    fn entity_kind_segments() {
        assert_eq!(EntityKind::Course.url_segment(), "courses");
        assert_eq!(EntityKind::LearningPath.to_string(), "learning_path");
    }
}

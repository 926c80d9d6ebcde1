//! Content invariants and quality checks.
//!
//! Errors fail the build; warnings are reported and never fail it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Months, NaiveDate};
use regex::Regex;
use serde::Serialize;
use url::Url;

use coursehub_shared::{CourseHubError, LearningPath, QualityConfig};

use crate::ContentStore;

/// Preferred id shape: lowercase URL slugs.
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("slug regex"));

/// BCP 47-ish language tag (`en`, `zh-CN`).
static LANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("language regex"));

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single finding, optionally tied to the file it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.path {
            Some(path) => write!(f, "{level}: {}: {}", path.display(), self.message),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}

/// Accumulated validation findings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub(crate) fn error(&mut self, path: Option<&Path>, message: impl Into<String>) {
        self.push(Severity::Error, path, message);
    }

    pub(crate) fn warning(&mut self, path: Option<&Path>, message: impl Into<String>) {
        self.push(Severity::Warning, path, message);
    }

    fn push(&mut self, severity: Severity, path: Option<&Path>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity,
            path: path.map(Path::to_path_buf),
            message: message.into(),
        });
    }

    /// Record a load failure (malformed YAML, missing field) as an error.
    pub(crate) fn load_error(&mut self, err: &CourseHubError) {
        match err {
            CourseHubError::Parse { path, message } => {
                self.error(Some(path.as_path()), format!("malformed YAML: {message}"))
            }
            CourseHubError::MissingField { path, field } => {
                self.error(Some(path.as_path()), format!("missing required field `{field}`"))
            }
            other => self.error(None, other.to_string()),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Fold all errors into one [`CourseHubError::Validation`].
    pub fn into_result(self) -> coursehub_shared::Result<()> {
        let messages: Vec<String> = self.errors().map(ToString::to_string).collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(CourseHubError::validation(messages.join("\n")))
        }
    }
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

/// Check the structural invariants every loaded store must satisfy.
pub(crate) fn check_invariants(store: &ContentStore, report: &mut ValidationReport) {
    if !is_http_url(&store.site.base_url) {
        report.error(
            None,
            format!("site base_url '{}' is not an absolute http(s) URL", store.site.base_url),
        );
    }

    check_ids(
        "course",
        store.sourced_courses().map(|(p, c)| (p, c.id.as_str())),
        report,
    );
    check_ids(
        "resource",
        store.sourced_resources().map(|(p, r)| (p, r.id.as_str())),
        report,
    );
    check_ids(
        "learning path",
        store.sourced_paths().map(|(p, lp)| (p, lp.id.as_str())),
        report,
    );
    check_ids(
        "domain",
        store.domains.iter().map(|d| (None, d.id.as_str())),
        report,
    );

    for (path, course) in store.sourced_courses() {
        for link in &course.links {
            if !is_http_url(&link.url) {
                report.error(
                    path,
                    format!("course '{}' link '{}' has malformed url '{}'", course.id, link.label, link.url),
                );
            }
        }
    }

    for (path, resource) in store.sourced_resources() {
        if !is_http_url(&resource.url) {
            report.error(
                path,
                format!("resource '{}' has malformed url '{}'", resource.id, resource.url),
            );
        }
    }

    for (path, lp) in store.sourced_paths() {
        check_path_steps(store, path, lp, report);
    }
}

/// Ids must be usable as one export path segment and unique within their
/// collection.
fn check_ids<'a>(
    kind: &str,
    ids: impl Iterator<Item = (Option<&'a Path>, &'a str)>,
    report: &mut ValidationReport,
) {
    let mut seen: BTreeMap<&str, Option<&Path>> = BTreeMap::new();
    for (path, id) in ids {
        if !is_path_segment(id) {
            report.error(
                path,
                format!("{kind} id '{id}' cannot be used as a file name or URL segment"),
            );
        }
        if let Some(first) = seen.insert(id, path) {
            let first = first
                .map(|p| format!(" (first defined in {})", p.display()))
                .unwrap_or_default();
            report.error(path, format!("duplicate {kind} id '{id}'{first}"));
        }
    }
}

fn check_path_steps(
    store: &ContentStore,
    path: Option<&Path>,
    lp: &LearningPath,
    report: &mut ValidationReport,
) {
    if lp.steps.is_empty() {
        report.warning(path, format!("learning path '{}' has no steps", lp.id));
        return;
    }

    let mut orders: Vec<u32> = lp.steps.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    let contiguous = orders
        .iter()
        .enumerate()
        .all(|(i, &order)| order as usize == i + 1);
    if !contiguous {
        report.error(
            path,
            format!(
                "learning path '{}' step orders {orders:?} must be contiguous starting at 1",
                lp.id
            ),
        );
    }

    for step in &lp.steps {
        match (&step.course_id, &step.resource_id) {
            (Some(_), Some(_)) => report.error(
                path,
                format!(
                    "learning path '{}' step {} references both a course and a resource",
                    lp.id, step.order
                ),
            ),
            (Some(course_id), None) if store.course(course_id).is_none() => report.warning(
                path,
                format!(
                    "learning path '{}' step {} references unknown course '{course_id}'",
                    lp.id, step.order
                ),
            ),
            (None, Some(resource_id)) if store.resource(resource_id).is_none() => report.warning(
                path,
                format!(
                    "learning path '{}' step {} references unknown resource '{resource_id}'",
                    lp.id, step.order
                ),
            ),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Quality checks
// ---------------------------------------------------------------------------

/// Editorial checks. Everything here is a warning.
pub(crate) fn check_quality(
    store: &ContentStore,
    quality: &QualityConfig,
    today: NaiveDate,
    report: &mut ValidationReport,
) {
    let stale_cutoff = today.checked_sub_months(Months::new(quality.stale_after_months));

    for (path, course) in store.sourced_courses() {
        slug_warning(report, path, "course", &course.id);
        if course.tags.is_empty() {
            report.warning(path, format!("course '{}' has no tags", course.id));
        }
        if course.summary.chars().count() < quality.min_summary_chars {
            report.warning(
                path,
                format!(
                    "course '{}' summary is shorter than {} characters",
                    course.id, quality.min_summary_chars
                ),
            );
        }
        if course.sessions.is_empty() {
            report.warning(path, format!("course '{}' lists no sessions", course.id));
        }
        if !LANG_RE.is_match(&course.language) {
            report.warning(
                path,
                format!("course '{}' language '{}' is not a language tag", course.id, course.language),
            );
        }
        match (course.last_updated, stale_cutoff) {
            (Some(updated), Some(cutoff)) if updated < cutoff => report.warning(
                path,
                format!(
                    "course '{}' was last updated {updated}, more than {} months ago",
                    course.id, quality.stale_after_months
                ),
            ),
            (None, _) => report.warning(path, format!("course '{}' has no last_updated date", course.id)),
            _ => {}
        }
        let instructors: HashSet<&str> = course.instructors.iter().map(String::as_str).collect();
        if instructors.len() != course.instructors.len() {
            report.warning(path, format!("course '{}' lists an instructor twice", course.id));
        }
    }

    for (path, resource) in store.sourced_resources() {
        slug_warning(report, path, "resource", &resource.id);
        if resource.tags.is_empty() {
            report.warning(path, format!("resource '{}' has no tags", resource.id));
        }
        if resource.description.trim().is_empty() {
            report.warning(path, format!("resource '{}' has no description", resource.id));
        }
    }

    for (path, lp) in store.sourced_paths() {
        slug_warning(report, path, "learning path", &lp.id);
    }
}

/// Non-empty, not `.`/`..`, no separators, whitespace or control characters.
fn is_path_segment(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
}

fn slug_warning(report: &mut ValidationReport, path: Option<&Path>, kind: &str, id: &str) {
    if is_path_segment(id) && !SLUG_RE.is_match(id) {
        report.warning(
            path,
            format!("{kind} id '{id}' is not a lowercase slug ([a-z0-9][a-z0-9_-]*)"),
        );
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

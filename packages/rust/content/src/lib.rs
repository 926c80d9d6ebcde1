//! Content store: loads the portal's YAML content into read-only records.
//!
//! This crate provides:
//! - [`ContentStore`]: the typed, validated snapshot of a content directory
//! - [`validate`]: a full validation + quality pass that reports every issue
//! - [`builtin_domains`]: the compiled-in domain table

pub mod domains;
pub mod loader;
pub mod checks;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use coursehub_shared::{
    Course, CourseHubError, DomainInfo, LearningPath, QualityConfig, Resource, Result, SiteConfig,
};

pub use domains::builtin_domains;
pub use loader::Sourced;
pub use checks::{Issue, Severity, ValidationReport};

use loader::{COURSES_DIR, PATHS_DIR, RESOURCES_DIR};

/// Immutable snapshot of all portal content.
///
/// Collections are sorted by id. Lookups by id return the first record with
/// that id; a store produced by [`ContentStore::load`] has no duplicates.
#[derive(Debug, Clone)]
pub struct ContentStore {
    pub site: SiteConfig,
    pub domains: Vec<DomainInfo>,
    courses: Vec<Course>,
    resources: Vec<Resource>,
    paths: Vec<LearningPath>,
    course_files: Vec<Option<PathBuf>>,
    resource_files: Vec<Option<PathBuf>>,
    path_files: Vec<Option<PathBuf>>,
    course_index: HashMap<String, usize>,
    resource_index: HashMap<String, usize>,
    path_index: HashMap<String, usize>,
}

impl ContentStore {
    /// Build a store from in-memory records (no source files).
    pub fn from_parts(
        site: SiteConfig,
        domains: Vec<DomainInfo>,
        courses: Vec<Course>,
        resources: Vec<Resource>,
        paths: Vec<LearningPath>,
    ) -> Self {
        Self::assemble(site, domains, unsourced(courses), unsourced(resources), unsourced(paths))
    }

    fn assemble(
        site: SiteConfig,
        domains: Vec<DomainInfo>,
        courses: Vec<(Option<PathBuf>, Course)>,
        resources: Vec<(Option<PathBuf>, Resource)>,
        paths: Vec<(Option<PathBuf>, LearningPath)>,
    ) -> Self {
        let (course_files, courses) = sort_by_id(courses, |c| &c.id);
        let (resource_files, resources) = sort_by_id(resources, |r| &r.id);
        let (path_files, paths) = sort_by_id(paths, |p| &p.id);

        let course_index = index_by_id(&courses, |c| &c.id);
        let resource_index = index_by_id(&resources, |r| &r.id);
        let path_index = index_by_id(&paths, |p| &p.id);

        Self {
            site,
            domains,
            courses,
            resources,
            paths,
            course_files,
            resource_files,
            path_files,
            course_index,
            resource_index,
            path_index,
        }
    }

    /// Load and validate a content directory.
    ///
    /// Fails on the first malformed or incomplete file, and on any invariant
    /// violation (duplicate ids, malformed URLs, broken step order).
    /// Warnings are logged and do not fail the load.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(root: &Path) -> Result<Self> {
        let loaded = read_all(root)?;
        if let Some(err) = loaded.errors.into_iter().next() {
            return Err(err);
        }
        let site = loaded
            .site
            .ok_or_else(|| CourseHubError::config("site.yaml could not be loaded"))?;

        let store = Self::assemble(
            site,
            loaded.domains,
            loaded.courses,
            loaded.resources,
            loaded.paths,
        );

        let mut report = ValidationReport::default();
        checks::check_invariants(&store, &mut report);
        for issue in report.warnings() {
            warn!("{issue}");
        }
        report.into_result()?;

        info!(
            courses = store.courses.len(),
            resources = store.resources.len(),
            paths = store.paths.len(),
            domains = store.domains.len(),
            "content loaded"
        );
        Ok(store)
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn paths(&self) -> &[LearningPath] {
        &self.paths
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.course_index.get(id).map(|&i| &self.courses[i])
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resource_index.get(id).map(|&i| &self.resources[i])
    }

    pub fn path(&self, id: &str) -> Option<&LearningPath> {
        self.path_index.get(id).map(|&i| &self.paths[i])
    }

    pub fn domain(&self, id: &str) -> Option<&DomainInfo> {
        self.domains.iter().find(|d| d.id == id)
    }

    pub(crate) fn sourced_courses(&self) -> impl Iterator<Item = (Option<&Path>, &Course)> {
        self.course_files.iter().map(|p| p.as_deref()).zip(&self.courses)
    }

    pub(crate) fn sourced_resources(&self) -> impl Iterator<Item = (Option<&Path>, &Resource)> {
        self.resource_files.iter().map(|p| p.as_deref()).zip(&self.resources)
    }

    pub(crate) fn sourced_paths(&self) -> impl Iterator<Item = (Option<&Path>, &LearningPath)> {
        self.path_files.iter().map(|p| p.as_deref()).zip(&self.paths)
    }
}

/// Run every load, invariant and quality check and report all findings.
///
/// Only I/O failures (unreadable directories) are returned as `Err`; broken
/// content ends up in the report.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn validate(root: &Path, quality: &QualityConfig, today: NaiveDate) -> Result<ValidationReport> {
    let loaded = read_all(root)?;
    let mut report = ValidationReport::default();

    for err in &loaded.errors {
        report.load_error(err);
    }

    if let Some(site) = loaded.site {
        let store = ContentStore::assemble(
            site,
            loaded.domains,
            loaded.courses,
            loaded.resources,
            loaded.paths,
        );
        checks::check_invariants(&store, &mut report);
        checks::check_quality(&store, quality, today, &mut report);
    }

    info!(
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "validation finished"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Loaded {
    site: Option<SiteConfig>,
    domains: Vec<DomainInfo>,
    courses: Vec<(Option<PathBuf>, Course)>,
    resources: Vec<(Option<PathBuf>, Resource)>,
    paths: Vec<(Option<PathBuf>, LearningPath)>,
    errors: Vec<CourseHubError>,
}

fn read_all(root: &Path) -> Result<Loaded> {
    if !root.is_dir() {
        return Err(CourseHubError::config(format!(
            "content directory '{}' not found",
            root.display()
        )));
    }

    let mut errors = Vec::new();

    let site = match loader::load_site(root) {
        Ok(site) => Some(site),
        Err(e @ (CourseHubError::Parse { .. } | CourseHubError::MissingField { .. })) => {
            errors.push(e);
            None
        }
        Err(e) => return Err(e),
    };

    let domains = match loader::load_domains(root) {
        Ok(Some(domains)) => domains,
        Ok(None) => builtin_domains().to_vec(),
        Err(e @ (CourseHubError::Parse { .. } | CourseHubError::MissingField { .. })) => {
            errors.push(e);
            builtin_domains().to_vec()
        }
        Err(e) => return Err(e),
    };

    let (courses, mut course_errors) = loader::load_collection::<Course>(&root.join(COURSES_DIR))?;
    let (resources, mut resource_errors) =
        loader::load_collection::<Resource>(&root.join(RESOURCES_DIR))?;
    let (paths, mut path_errors) = loader::load_collection::<LearningPath>(&root.join(PATHS_DIR))?;
    errors.append(&mut course_errors);
    errors.append(&mut resource_errors);
    errors.append(&mut path_errors);

    Ok(Loaded {
        site,
        domains,
        courses: unwrap_sourced(courses),
        resources: unwrap_sourced(resources),
        paths: unwrap_sourced(paths),
        errors,
    })
}

fn unsourced<T>(records: Vec<T>) -> Vec<(Option<PathBuf>, T)> {
    records.into_iter().map(|record| (None, record)).collect()
}

fn unwrap_sourced<T>(records: Vec<Sourced<T>>) -> Vec<(Option<PathBuf>, T)> {
    records.into_iter().map(|s| (Some(s.path), s.record)).collect()
}

fn sort_by_id<T>(
    mut records: Vec<(Option<PathBuf>, T)>,
    id: impl Fn(&T) -> &String,
) -> (Vec<Option<PathBuf>>, Vec<T>) {
    records.sort_by(|a, b| id(&a.1).cmp(id(&b.1)));
    records.into_iter().unzip()
}

fn index_by_id<T>(records: &[T], id: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        index.entry(id(record).clone()).or_insert(i);
    }
    index
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/content")
    }

    fn temp_content(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ch-content-test-{}", uuid::Uuid::now_v7()));
        for (rel, body) in files {
            let path = dir.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        dir
    }

    const SITE: &str = "title: Test Portal\nbase_url: https://courses.example.org\n";

    fn course_yaml(id: &str) -> String {
        format!(
            "id: {id}\ntitle: Course {id}\ntype: lecture\nyear: 2024\ndifficulty: beginner\nsummary: A course.\n"
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn fixture_content_loads() {
        let store = ContentStore::load(&fixture_root()).expect("load fixtures");
        assert_eq!(store.site.title, "Urban Systems Lab");
        assert_eq!(store.courses().len(), 3);
        assert_eq!(store.resources().len(), 3);
        assert_eq!(store.paths().len(), 1);
        assert!(store.domain("transportation").is_some());
        // Sorted by id
        let ids: Vec<&str> = store.courses().iter().map(|c| c.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn fixture_content_validates_without_errors() {
        let report = validate(&fixture_root(), &QualityConfig::default(), today()).unwrap();
        let errors: Vec<String> = report.errors().map(ToString::to_string).collect();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn missing_content_dir_is_config_error() {
        let err = ContentStore::load(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, CourseHubError::Config { .. }));
    }

    #[test]
    fn missing_field_fails_load() {
        let dir = temp_content(&[
            ("site.yaml", SITE),
            ("courses/a.yaml", "id: a\ntype: lecture\nyear: 2024\ndifficulty: beginner\nsummary: x\n"),
        ]);
        let err = ContentStore::load(&dir).unwrap_err();
        assert!(matches!(err, CourseHubError::MissingField { ref field, .. } if field == "title"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_course_id_fails_load() {
        let dir = temp_content(&[
            ("site.yaml", SITE),
            ("courses/a.yaml", &course_yaml("same")),
            ("courses/b.yaml", &course_yaml("same")),
        ]);
        let err = ContentStore::load(&dir).unwrap_err();
        assert!(err.to_string().contains("duplicate course id 'same'"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_resource_id_fails_load() {
        let resource = "id: same\ntitle: R\ntype: tool\nurl: https://r.example.org\n";
        let dir = temp_content(&[
            ("site.yaml", SITE),
            ("resources/a.yaml", resource),
            ("resources/b.yaml", resource),
        ]);
        let err = ContentStore::load(&dir).unwrap_err();
        assert!(err.to_string().contains("duplicate resource id 'same'"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_learning_path_id_fails_load() {
        let path = "- id: same\n  title: P1\n  steps: []\n- id: same\n  title: P2\n  steps: []\n";
        let dir = temp_content(&[("site.yaml", SITE), ("learning-paths/p.yaml", path)]);
        let err = ContentStore::load(&dir).unwrap_err();
        assert!(err.to_string().contains("duplicate learning path id 'same'"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn non_slug_ids_load_with_a_warning() {
        let dir = temp_content(&[
            ("site.yaml", SITE),
            ("courses/gis.yaml", &course_yaml("GIS-101")),
            ("courses/zh.yaml", &course_yaml("城市交通")),
        ]);
        let store = ContentStore::load(&dir).expect("non-slug ids are loadable");
        assert!(store.course("GIS-101").is_some());
        assert!(store.course("城市交通").is_some());

        let report = validate(&dir, &QualityConfig::default(), today()).unwrap();
        assert!(!report.has_errors());
        assert!(report
            .warnings()
            .any(|w| w.message.contains("course id 'GIS-101' is not a lowercase slug")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn id_with_path_separator_fails_load() {
        let dir = temp_content(&[("site.yaml", SITE), ("courses/a.yaml", &course_yaml("\"a/b\""))]);
        let err = ContentStore::load(&dir).unwrap_err();
        assert!(err.to_string().contains("cannot be used as a file name"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_resource_url_fails_load() {
        let dir = temp_content(&[
            ("site.yaml", SITE),
            ("resources/r.yaml", "id: r\ntitle: R\ntype: tool\nurl: not-a-url\n"),
        ]);
        let err = ContentStore::load(&dir).unwrap_err();
        assert!(err.to_string().contains("malformed url"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_step_reference_is_only_a_warning() {
        let path = "id: p\ntitle: P\nsteps:\n  - order: 1\n    title: Start\n    course_id: ghost\n";
        let dir = temp_content(&[("site.yaml", SITE), ("learning-paths/p.yaml", path)]);

        let store = ContentStore::load(&dir).expect("unknown reference does not fail");
        assert_eq!(store.paths().len(), 1);

        let report = validate(&dir, &QualityConfig::default(), today()).unwrap();
        assert!(!report.has_errors());
        assert!(report.warnings().any(|w| w.message.contains("unknown course 'ghost'")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn step_order_gap_and_double_reference_are_errors() {
        let path = "id: p\ntitle: P\nsteps:\n  - order: 1\n    title: A\n  - order: 3\n    title: B\n    course_id: a\n    resource_id: r\n";
        let dir = temp_content(&[("site.yaml", SITE), ("learning-paths/p.yaml", path)]);

        let report = validate(&dir, &QualityConfig::default(), today()).unwrap();
        let errors: Vec<&str> = report.errors().map(|i| i.message.as_str()).collect();
        assert!(errors.iter().any(|m| m.contains("contiguous")));
        assert!(errors.iter().any(|m| m.contains("both a course and a resource")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn validate_reports_every_broken_file() {
        let dir = temp_content(&[
            ("site.yaml", SITE),
            ("courses/a.yaml", "id: [broken"),
            ("courses/b.yaml", "id: b\n"),
            ("courses/c.yaml", &course_yaml("c")),
        ]);
        let report = validate(&dir, &QualityConfig::default(), today()).unwrap();
        assert_eq!(report.errors().count(), 2);
        assert!(report.errors().any(|i| i.message.starts_with("malformed YAML")));
        assert!(report.errors().any(|i| i.message.contains("missing required field")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn quality_checks_flag_stale_and_thin_courses() {
        let course = "id: old\ntitle: Old\ntype: lecture\nyear: 2019\ndifficulty: advanced\nsummary: short\nlanguage: Chinese\nlast_updated: 2020-01-01\n";
        let dir = temp_content(&[("site.yaml", SITE), ("courses/old.yaml", course)]);

        let report = validate(&dir, &QualityConfig::default(), today()).unwrap();
        assert!(!report.has_errors());
        let warnings: Vec<&str> = report.warnings().map(|i| i.message.as_str()).collect();
        assert!(warnings.iter().any(|m| m.contains("no tags")));
        assert!(warnings.iter().any(|m| m.contains("summary is shorter")));
        assert!(warnings.iter().any(|m| m.contains("no sessions")));
        assert!(warnings.iter().any(|m| m.contains("not a language tag")));
        assert!(warnings.iter().any(|m| m.contains("months ago")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn domains_file_replaces_builtin_table() {
        let domains = "- id: coastal\n  label: Coastal\n  keywords: [coast, 海岸]\n";
        let dir = temp_content(&[("site.yaml", SITE), ("domains.yaml", domains)]);
        let store = ContentStore::load(&dir).unwrap();
        assert_eq!(store.domains.len(), 1);
        assert!(store.domain("urban").is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

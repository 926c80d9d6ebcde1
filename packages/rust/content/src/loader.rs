//! YAML file discovery and parsing.
//!
//! Each collection directory holds `*.yaml`/`*.yml` files; a file may contain
//! a single record or a list of records. Files are read in sorted name order.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use coursehub_shared::{CourseHubError, DomainInfo, Result, SiteConfig};

pub(crate) const SITE_FILE: &str = "site.yaml";
pub(crate) const DOMAINS_FILE: &str = "domains.yaml";
pub(crate) const COURSES_DIR: &str = "courses";
pub(crate) const RESOURCES_DIR: &str = "resources";
pub(crate) const PATHS_DIR: &str = "learning-paths";

/// A parsed record together with the file it came from.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub path: PathBuf,
    pub record: T,
}

/// Parse one YAML document into one or more records.
pub(crate) fn parse_records<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>> {
    // A top-level sequence is a list of records.
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| CourseHubError::from_yaml(path, &e))?;

    if value.is_sequence() {
        serde_yaml::from_value::<Vec<T>>(value).map_err(|e| CourseHubError::from_yaml(path, &e))
    } else {
        serde_yaml::from_value::<T>(value)
            .map(|record| vec![record])
            .map_err(|e| CourseHubError::from_yaml(path, &e))
    }
}

/// Load every record of a collection directory.
///
/// Parse failures are collected rather than returned so validation can report
/// all broken files in one run. A missing directory is an empty collection.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub(crate) fn load_collection<T: DeserializeOwned>(
    dir: &Path,
) -> Result<(Vec<Sourced<T>>, Vec<CourseHubError>)> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    if !dir.is_dir() {
        debug!("collection directory absent");
        return Ok((records, errors));
    }

    for path in yaml_files(dir)? {
        let content = std::fs::read_to_string(&path).map_err(|e| CourseHubError::io(&path, e))?;
        match parse_records::<T>(&path, &content) {
            Ok(parsed) => {
                debug!(path = %path.display(), count = parsed.len(), "parsed content file");
                records.extend(parsed.into_iter().map(|record| Sourced {
                    path: path.clone(),
                    record,
                }));
            }
            Err(e) => errors.push(e),
        }
    }

    Ok((records, errors))
}

/// Load `site.yaml`, which is required.
pub(crate) fn load_site(root: &Path) -> Result<SiteConfig> {
    let path = root.join(SITE_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| CourseHubError::io(&path, e))?;
    serde_yaml::from_str(&content).map_err(|e| CourseHubError::from_yaml(&path, &e))
}

/// Load `domains.yaml` if present.
pub(crate) fn load_domains(root: &Path) -> Result<Option<Vec<DomainInfo>>> {
    let path = root.join(DOMAINS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| CourseHubError::io(&path, e))?;
    parse_records(&path, &content).map(Some)
}

/// List `*.yaml`/`*.yml` files of a directory, sorted by file name.
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CourseHubError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CourseHubError::io(dir, e))?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_shared::{Course, Resource};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ch-loader-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parses_single_record_and_list() {
        let single = "id: a\ntitle: A\ntype: dataset\nurl: https://a.example.com\n";
        let list = "- id: b\n  title: B\n  type: tool\n  url: https://b.example.com\n- id: c\n  title: C\n  type: paper\n  url: https://c.example.com\n";

        let one: Vec<Resource> = parse_records(Path::new("one.yaml"), single).unwrap();
        let many: Vec<Resource> = parse_records(Path::new("many.yaml"), list).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].id, "c");
    }

    #[test]
    fn missing_field_surfaces_field_name() {
        let yaml = "id: urban-101\ntype: lecture\nyear: 2024\ndifficulty: beginner\nsummary: x\n";
        let err = parse_records::<Course>(Path::new("courses/u.yaml"), yaml).unwrap_err();
        match err {
            CourseHubError::MissingField { field, .. } => assert_eq!(field, "title"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn collection_collects_errors_and_keeps_order() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("b.yaml"),
            "id: b\ntitle: B\ntype: tool\nurl: https://b.example.com\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("a.yml"),
            "id: a\ntitle: A\ntype: book\nurl: https://a.example.com\n",
        )
        .unwrap();
        std::fs::write(dir.join("broken.yaml"), "id: [oops").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let (records, errors) = load_collection::<Resource>(&dir).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CourseHubError::Parse { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn absent_collection_is_empty() {
        let dir = temp_dir().join("nope");
        let (records, errors) = load_collection::<Resource>(&dir).unwrap();
        assert!(records.is_empty());
        assert!(errors.is_empty());
    }
}

//! Static export writer.
//!
//! Every file is written atomically (temp file, then rename) and its SHA-256
//! recorded; `finish` writes `manifest.json` listing all of them and removes
//! files that the previous manifest listed but this build did not write.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use coursehub_shared::{BuildId, BuildManifest, CourseHubError, Result, CURRENT_SCHEMA_VERSION};

const MANIFEST_FILE: &str = "manifest.json";

/// Collection sizes recorded in the manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportCounts {
    pub courses: usize,
    pub resources: usize,
    pub paths: usize,
}

/// Writes export files under one output directory.
#[derive(Debug)]
pub struct SiteWriter {
    out_dir: PathBuf,
    files: BTreeMap<String, String>,
    /// Files listed by the manifest of the previous build, if any.
    previous: BTreeSet<String>,
}

impl SiteWriter {
    /// Create the output directory if needed and note the files of any
    /// previous build found there.
    pub fn create(out_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(out_dir).map_err(|e| CourseHubError::io(out_dir, e))?;
        let previous = previous_files(out_dir);
        debug!(path = %out_dir.display(), previous = previous.len(), "output directory ready");
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            files: BTreeMap::new(),
            previous,
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Number of files written so far (the manifest excluded).
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Write a pretty-printed JSON file at a `/`-separated relative path.
    pub fn write_json<T: serde::Serialize>(&mut self, rel: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| CourseHubError::Export(format!("JSON serialization of {rel} failed: {e}")))?;
        self.write_text(rel, &json)
    }

    /// Write a text file at a `/`-separated relative path.
    pub fn write_text(&mut self, rel: &str, content: &str) -> Result<()> {
        if rel == MANIFEST_FILE {
            return Err(CourseHubError::Export(format!("{MANIFEST_FILE} is reserved")));
        }
        if !is_relative_file(rel) {
            return Err(CourseHubError::Export(format!("'{rel}' is not a relative export path")));
        }
        write_atomic(&self.out_dir.join(rel), content)?;
        self.files.insert(rel.to_string(), sha256_hex(content));
        debug!(file = rel, size = content.len(), "wrote export file");
        Ok(())
    }

    /// Write `manifest.json` and return it.
    #[instrument(skip_all, fields(out_dir = %self.out_dir.display(), files = self.files.len()))]
    pub fn finish(self, counts: ExportCounts, tool_version: &str) -> Result<BuildManifest> {
        let manifest = BuildManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            build_id: BuildId::new(),
            tool_version: tool_version.to_string(),
            generated_at: Utc::now(),
            course_count: counts.courses,
            resource_count: counts.resources,
            path_count: counts.paths,
            files: self.files,
        };

        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| CourseHubError::Export(format!("manifest serialization failed: {e}")))?;
        write_atomic(&self.out_dir.join(MANIFEST_FILE), &json)?;

        let stale: Vec<&String> = self
            .previous
            .iter()
            .filter(|rel| !manifest.files.contains_key(*rel))
            .collect();
        for rel in &stale {
            remove_stale(&self.out_dir, rel)?;
        }

        info!(build_id = %manifest.build_id, removed = stale.len(), "export manifest written");
        Ok(manifest)
    }
}

/// Verify that an export directory is complete and unmodified.
pub fn verify_export(out_dir: &Path) -> Result<BuildManifest> {
    let manifest_path = out_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(CourseHubError::validation(format!(
            "missing {MANIFEST_FILE} in {}",
            out_dir.display()
        )));
    }

    let content = std::fs::read_to_string(&manifest_path)
        .map_err(|e| CourseHubError::io(&manifest_path, e))?;
    let manifest: BuildManifest = serde_json::from_str(&content)
        .map_err(|e| CourseHubError::validation(format!("invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(CourseHubError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }

    for (rel, expected) in &manifest.files {
        if !is_relative_file(rel) {
            return Err(CourseHubError::validation(format!(
                "{MANIFEST_FILE} lists '{rel}', which is outside the export"
            )));
        }
        let path = out_dir.join(rel);
        let body = std::fs::read_to_string(&path).map_err(|e| CourseHubError::io(&path, e))?;
        if &sha256_hex(&body) != expected {
            return Err(CourseHubError::validation(format!("{rel} does not match its checksum")));
        }
    }

    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A non-empty relative path made only of normal components (no `..`, no root).
fn is_relative_file(rel: &str) -> bool {
    !rel.is_empty()
        && Path::new(rel)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Files listed by an existing manifest. An unreadable manifest lists nothing.
fn previous_files(out_dir: &Path) -> BTreeSet<String> {
    let path = out_dir.join(MANIFEST_FILE);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return BTreeSet::new();
    };
    match serde_json::from_str::<BuildManifest>(&content) {
        Ok(manifest) => manifest
            .files
            .into_keys()
            .filter(|rel| is_relative_file(rel))
            .collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable previous manifest");
            BTreeSet::new()
        }
    }
}

fn remove_stale(out_dir: &Path, rel: &str) -> Result<()> {
    let path = out_dir.join(rel);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            debug!(file = rel, "removed stale export file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CourseHubError::io(&path, e)),
    }
}

fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| CourseHubError::Export(format!("{} has no parent", target.display())))?;
    std::fs::create_dir_all(parent).map_err(|e| CourseHubError::io(parent, e))?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| CourseHubError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| CourseHubError::io(target, e))?;
    Ok(())
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ch-export-test-{}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn writes_files_and_manifest() {
        let dir = temp_dir();
        let mut writer = SiteWriter::create(&dir).unwrap();
        writer.write_json("courses/gis.json", &serde_json::json!({"id": "gis"})).unwrap();
        writer.write_text("sitemap.xml", "<urlset/>").unwrap();
        assert_eq!(writer.file_count(), 2);

        let manifest = writer
            .finish(ExportCounts { courses: 1, resources: 0, paths: 0 }, "0.1.0-test")
            .unwrap();
        assert_eq!(manifest.files.len(), 2);
        assert!(dir.join("courses/gis.json").exists());
        assert!(dir.join("manifest.json").exists());
        // No temp files left behind
        assert!(!dir.join("courses/.gis.json.tmp").exists());

        let verified = verify_export(&dir).unwrap();
        assert_eq!(verified.build_id, manifest.build_id);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn verify_detects_tampering() {
        let dir = temp_dir();
        let mut writer = SiteWriter::create(&dir).unwrap();
        writer.write_text("index.json", "{}").unwrap();
        writer.finish(ExportCounts::default(), "0.1.0-test").unwrap();

        std::fs::write(dir.join("index.json"), "{\"changed\":true}").unwrap();
        let err = verify_export(&dir).unwrap_err();
        assert!(err.to_string().contains("checksum"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn verify_requires_manifest() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        assert!(verify_export(&dir).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn manifest_name_is_reserved() {
        let dir = temp_dir();
        let mut writer = SiteWriter::create(&dir).unwrap();
        assert!(writer.write_text("manifest.json", "{}").is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rebuild_removes_files_of_previous_build() {
        let dir = temp_dir();
        let mut writer = SiteWriter::create(&dir).unwrap();
        writer.write_text("courses/old.json", "{}").unwrap();
        writer.write_text("courses/keep.json", "{}").unwrap();
        writer.finish(ExportCounts::default(), "0.1.0-test").unwrap();

        // Unrelated files in the output directory are left alone.
        std::fs::write(dir.join("CNAME"), "courses.example.org").unwrap();

        let mut writer = SiteWriter::create(&dir).unwrap();
        writer.write_text("courses/keep.json", "{\"v\":2}").unwrap();
        let manifest = writer.finish(ExportCounts::default(), "0.1.0-test").unwrap();

        assert!(!dir.join("courses/old.json").exists());
        assert!(dir.join("courses/keep.json").exists());
        assert!(dir.join("CNAME").exists());
        assert_eq!(manifest.files.len(), 1);
        verify_export(&dir).unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn escaping_paths_are_rejected() {
        assert!(is_relative_file("courses/a.json"));
        assert!(!is_relative_file("../x"));
        assert!(!is_relative_file("courses/../../x"));
        assert!(!is_relative_file("/etc/passwd"));
        assert!(!is_relative_file(""));

        let dir = temp_dir();
        let mut writer = SiteWriter::create(&dir).unwrap();
        assert!(writer.write_text("../outside.json", "{}").is_err());
        writer.write_text("index.json", "{}").unwrap();
        writer.finish(ExportCounts::default(), "0.1.0-test").unwrap();

        // A hand-edited manifest pointing outside the export fails verification.
        let manifest_path = dir.join("manifest.json");
        let mut manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
        manifest["files"]["../x"] = serde_json::json!(sha256_hex(""));
        std::fs::write(&manifest_path, manifest.to_string()).unwrap();

        let err = verify_export(&dir).unwrap_err();
        assert!(err.to_string().contains("outside the export"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sha256_known_value() {
        assert_eq!(
            sha256_hex("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}

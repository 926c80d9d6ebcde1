//! End-to-end static build: content → classify → relate → sequence → export.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use coursehub_content::ContentStore;
use coursehub_shared::{BuildManifest, Result};

use crate::classifier::DomainClassifier;
use crate::export::{ExportCounts, SiteWriter};
use crate::pages::{self, Counts, IndexPage};
use crate::relations::{domain_co_occurrence, domain_stats, find_relationships};
use crate::search::SearchIndex;
use crate::seo;
use crate::sitemap::{render_sitemap, sitemap_entries};

/// Configuration for [`build_site`].
#[derive(Debug, Clone)]
pub struct BuildSiteConfig {
    /// Output directory for the export.
    pub out_dir: PathBuf,
    /// Overrides the site's configured base URL.
    pub base_url: Option<String>,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildResult {
    pub out_dir: PathBuf,
    pub manifest: BuildManifest,
    pub relationship_count: usize,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page file is written.
    fn page_written(&self, path: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_written(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full static build.
///
/// 1. Classify courses and resources into domains
/// 2. Compute relationships and domain statistics
/// 3. Write index, course, resource, path and domain pages
/// 4. Write the search index and sitemap
/// 5. Write the manifest
#[instrument(skip_all, fields(out_dir = %config.out_dir.display()))]
pub fn build_site(
    store: &ContentStore,
    config: &BuildSiteConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| store.site.base_url.clone());

    info!(%base_url, "starting static build");

    // --- Phase 1: Classification ---
    progress.phase("Classifying content");
    let classifier = DomainClassifier::new(&store.domains);
    let classification = classifier.classify_store(store);

    // --- Phase 2: Relationships ---
    progress.phase("Computing relationships");
    let relations = find_relationships(store.courses(), &classifier);
    let stats = domain_stats(&classifier, &classification);
    let co_occurrence = domain_co_occurrence(&classification);

    // --- Phase 3: Pages ---
    progress.phase("Writing pages");
    let mut writer = SiteWriter::create(&config.out_dir)?;
    let total = store.courses().len() + store.paths().len() + store.domains.len();
    let mut current = 0;
    let mut tick = |path: &str| {
        current += 1;
        progress.page_written(path, current, total);
    };

    writer.write_json(
        "index.json",
        &IndexPage {
            site: &store.site,
            seo: seo::home_seo(&store.site, &base_url),
            counts: Counts {
                courses: store.courses().len(),
                resources: store.resources().len(),
                learning_paths: store.paths().len(),
                domains: store.domains.len(),
            },
            domains: &stats,
            co_occurrence: &co_occurrence,
        },
    )?;

    let course_list: Vec<_> = store
        .courses()
        .iter()
        .map(|c| pages::course_summary(c, &classification))
        .collect();
    writer.write_json("courses/index.json", &course_list)?;

    for course in store.courses() {
        let rel = format!("courses/{}.json", course.id);
        let page = pages::course_page(store, &base_url, course, &classification, &relations);
        writer.write_json(&rel, &page)?;
        tick(&rel);
    }

    let resource_list: Vec<_> = store
        .resources()
        .iter()
        .map(|r| pages::resource_entry(r, &classification))
        .collect();
    writer.write_json("resources/index.json", &resource_list)?;

    let path_list: Vec<_> = store.paths().iter().map(pages::path_summary).collect();
    writer.write_json("paths/index.json", &path_list)?;

    for path in store.paths() {
        let rel = format!("paths/{}.json", path.id);
        writer.write_json(&rel, &pages::path_page(store, &base_url, path))?;
        tick(&rel);
    }

    writer.write_json("domains/index.json", &stats)?;
    for domain in &store.domains {
        let rel = format!("domains/{}.json", domain.id);
        let page = pages::domain_page(store, &base_url, domain, &classification, &co_occurrence);
        writer.write_json(&rel, &page)?;
        tick(&rel);
    }

    // --- Phase 4: Search index + sitemap ---
    progress.phase("Writing search index and sitemap");
    let index = SearchIndex::build(store);
    writer.write_json("search-index.json", &index.documents())?;
    writer.write_text(
        "sitemap.xml",
        &render_sitemap(&sitemap_entries(store, &base_url)),
    )?;

    // --- Phase 5: Manifest ---
    progress.phase("Writing manifest");
    let out_dir = writer.out_dir().to_path_buf();
    let manifest = writer.finish(
        ExportCounts {
            courses: store.courses().len(),
            resources: store.resources().len(),
            paths: store.paths().len(),
        },
        &config.tool_version,
    )?;

    let result = BuildResult {
        out_dir,
        manifest,
        relationship_count: relations.pairs().len(),
        elapsed: start.elapsed(),
    };

    info!(
        files = result.manifest.files.len(),
        relationships = result.relationship_count,
        elapsed_ms = result.elapsed.as_millis(),
        "static build complete"
    );
    progress.done(&result);

    Ok(result)
}

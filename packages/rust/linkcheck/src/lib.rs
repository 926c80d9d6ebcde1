//! External link checking and uptime monitoring for CourseHub content.
//!
//! Link failures are reported as warnings; only the uptime monitor treats
//! an unreachable URL as a failure.

mod checker;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, instrument};

use coursehub_content::ContentStore;

pub use checker::{CheckSummary, LinkChecker, LinkReport, LinkStatus};

/// One external URL and the entities that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTarget {
    pub url: String,
    /// `course:<id>` / `resource:<id>` labels.
    pub sources: Vec<String>,
}

/// Collect every external URL in the store: course links and resource urls.
///
/// Each URL appears once, sorted, with all of its referencing entities.
pub fn collect_links(store: &ContentStore) -> Vec<LinkTarget> {
    let mut by_url: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for course in store.courses() {
        for link in &course.links {
            by_url
                .entry(link.url.clone())
                .or_default()
                .push(format!("course:{}", course.id));
        }
    }
    for resource in store.resources() {
        by_url
            .entry(resource.url.clone())
            .or_default()
            .push(format!("resource:{}", resource.id));
    }

    by_url
        .into_iter()
        .map(|(url, mut sources)| {
            sources.dedup();
            LinkTarget { url, sources }
        })
        .collect()
}

/// Result of an uptime check against a deployed site.
#[derive(Debug, Clone, Serialize)]
pub struct UptimeReport {
    pub up: usize,
    pub down: Vec<LinkReport>,
}

impl UptimeReport {
    pub fn is_up(&self) -> bool {
        self.down.is_empty()
    }
}

/// Check that every given site URL responds successfully.
///
/// Unlike content link checks, a skipped URL counts as down here.
#[instrument(skip_all, fields(urls = urls.len()))]
pub async fn check_uptime(checker: &LinkChecker, urls: &[String]) -> UptimeReport {
    let targets: Vec<LinkTarget> = urls
        .iter()
        .map(|url| LinkTarget {
            url: url.clone(),
            sources: vec!["site".into()],
        })
        .collect();

    let summary = checker.check_all(&targets).await;
    let (up, down): (Vec<_>, Vec<_>) = summary
        .reports
        .into_iter()
        .partition(|r| matches!(r.status, LinkStatus::Ok { .. }));

    info!(up = up.len(), down = down.len(), "uptime check completed");
    UptimeReport { up: up.len(), down }
}

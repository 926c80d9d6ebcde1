//! JSON page models for the static export.

use serde::Serialize;

use coursehub_content::ContentStore;
use coursehub_shared::{Course, Difficulty, DomainInfo, LearningPath, Resource, SiteConfig};

use crate::classifier::{Classification, DomainSet};
use crate::relations::{DomainPairCount, DomainStats, RelatedCourse, RelationGraph};
use crate::seo::{self, SeoMeta};
use crate::sequencer::{self, StepView};

#[derive(Debug, Clone, Serialize)]
pub struct DomainRef {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Counts {
    pub courses: usize,
    pub resources: usize,
    pub learning_paths: usize,
    pub domains: usize,
}

/// `index.json`
#[derive(Debug, Serialize)]
pub struct IndexPage<'a> {
    pub site: &'a SiteConfig,
    pub seo: SeoMeta,
    pub counts: Counts,
    pub domains: &'a [DomainStats],
    pub co_occurrence: &'a [DomainPairCount],
}

/// Entry of `courses/index.json`.
#[derive(Debug, Serialize)]
pub struct CourseSummary<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub year: u16,
    pub difficulty: Difficulty,
    pub language: &'a str,
    pub tags: Vec<&'a str>,
    pub domains: Vec<&'a str>,
}

/// `courses/<id>.json`
#[derive(Debug, Serialize)]
pub struct CoursePage<'a> {
    pub course: &'a Course,
    pub domains: Vec<DomainRef>,
    pub related: Vec<RelatedCourse>,
    pub learning_paths: Vec<PathRef>,
    pub seo: SeoMeta,
}

/// Entry of `resources/index.json`.
#[derive(Debug, Serialize)]
pub struct ResourceEntry<'a> {
    #[serde(flatten)]
    pub resource: &'a Resource,
    pub domains: Vec<&'a str>,
}

/// Entry of `paths/index.json`.
#[derive(Debug, Serialize)]
pub struct PathSummary<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub audience: &'a str,
    pub duration: Option<&'a str>,
    pub step_count: usize,
}

/// `paths/<id>.json`
#[derive(Debug, Serialize)]
pub struct PathPage<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub audience: &'a str,
    pub duration: Option<&'a str>,
    pub steps: Vec<StepView>,
    pub seo: SeoMeta,
}

/// `domains/<id>.json`
#[derive(Debug, Serialize)]
pub struct DomainPage<'a> {
    pub domain: &'a DomainInfo,
    pub courses: Vec<&'a str>,
    pub resources: Vec<&'a str>,
    /// Domains co-occurring with this one on courses.
    pub related_domains: Vec<&'a DomainPairCount>,
    pub seo: SeoMeta,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn domain_refs(store: &ContentStore, set: Option<&DomainSet>) -> Vec<DomainRef> {
    set.into_iter()
        .flatten()
        .filter_map(|id| store.domain(id))
        .map(|d| DomainRef {
            id: d.id.clone(),
            label: d.label.clone(),
        })
        .collect()
}

fn domain_ids(set: Option<&DomainSet>) -> Vec<&str> {
    set.into_iter().flatten().map(String::as_str).collect()
}

pub fn course_summary<'a>(course: &'a Course, classification: &'a Classification) -> CourseSummary<'a> {
    CourseSummary {
        id: &course.id,
        title: &course.title,
        year: course.year,
        difficulty: course.difficulty,
        language: &course.language,
        tags: course.tags.iter().map(String::as_str).collect(),
        domains: domain_ids(classification.course_domains(&course.id)),
    }
}

pub fn course_page<'a>(
    store: &'a ContentStore,
    base_url: &str,
    course: &'a Course,
    classification: &Classification,
    relations: &RelationGraph,
) -> CoursePage<'a> {
    let domains = domain_refs(store, classification.course_domains(&course.id));
    let infos: Vec<&DomainInfo> = domains.iter().filter_map(|d| store.domain(&d.id)).collect();
    let seo = seo::course_seo(&store.site, base_url, course, &infos);

    let learning_paths = store
        .paths()
        .iter()
        .filter(|p| {
            p.steps
                .iter()
                .any(|s| s.course_id.as_deref() == Some(course.id.as_str()))
        })
        .map(|p| PathRef {
            id: p.id.clone(),
            title: p.title.clone(),
        })
        .collect();

    CoursePage {
        course,
        domains,
        related: relations.related_to(&course.id),
        learning_paths,
        seo,
    }
}

pub fn resource_entry<'a>(resource: &'a Resource, classification: &'a Classification) -> ResourceEntry<'a> {
    ResourceEntry {
        resource,
        domains: domain_ids(classification.resource_domains(&resource.id)),
    }
}

pub fn path_summary(path: &LearningPath) -> PathSummary<'_> {
    PathSummary {
        id: &path.id,
        title: &path.title,
        audience: &path.audience,
        duration: path.duration.as_deref(),
        step_count: path.steps.len(),
    }
}

pub fn path_page<'a>(store: &'a ContentStore, base_url: &str, path: &'a LearningPath) -> PathPage<'a> {
    PathPage {
        id: &path.id,
        title: &path.title,
        description: &path.description,
        audience: &path.audience,
        duration: path.duration.as_deref(),
        steps: sequencer::sequence(path, store).iter().map(|s| s.view()).collect(),
        seo: seo::path_seo(&store.site, base_url, path),
    }
}

pub fn domain_page<'a>(
    store: &'a ContentStore,
    base_url: &str,
    domain: &'a DomainInfo,
    classification: &'a Classification,
    co_occurrence: &'a [DomainPairCount],
) -> DomainPage<'a> {
    DomainPage {
        domain,
        courses: classification.courses_in(&domain.id),
        resources: classification.resources_in(&domain.id),
        related_domains: co_occurrence
            .iter()
            .filter(|p| p.domain_a == domain.id || p.domain_b == domain.id)
            .collect(),
        seo: seo::domain_seo(&store.site, base_url, domain),
    }
}

//! Domain classification by keyword/tag matching.
//!
//! An entity belongs to a domain when one of its tags equals the domain id or
//! one of the domain keywords, or when a keyword occurs in its title or
//! summary/description. Matching is case-insensitive.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use coursehub_content::ContentStore;
use coursehub_shared::{Course, DomainInfo, Resource};

/// Ordered set of domain ids.
pub type DomainSet = BTreeSet<String>;

/// A domain with its keywords pre-lowercased.
#[derive(Debug)]
struct CompiledDomain<'a> {
    info: &'a DomainInfo,
    id_lc: String,
    keywords: Vec<String>,
}

/// Classifies courses and resources against a domain table.
#[derive(Debug)]
pub struct DomainClassifier<'a> {
    domains: Vec<CompiledDomain<'a>>,
}

impl<'a> DomainClassifier<'a> {
    pub fn new(domains: &'a [DomainInfo]) -> Self {
        let domains = domains
            .iter()
            .map(|info| CompiledDomain {
                info,
                id_lc: info.id.to_lowercase(),
                keywords: info
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { domains }
    }

    /// The domain table this classifier was built from.
    pub fn domains(&self) -> impl Iterator<Item = &'a DomainInfo> + '_ {
        self.domains.iter().map(|d| d.info)
    }

    pub fn classify_course(&self, course: &Course) -> DomainSet {
        self.classify(course.tags.iter(), &[course.title.as_str(), course.summary.as_str()])
    }

    pub fn classify_resource(&self, resource: &Resource) -> DomainSet {
        self.classify(resource.tags.iter(), &[resource.title.as_str(), resource.description.as_str()])
    }

    fn classify<'t>(&self, tags: impl Iterator<Item = &'t String>, texts: &[&str]) -> DomainSet {
        let tags: BTreeSet<String> = tags.map(|t| t.trim().to_lowercase()).collect();
        let texts: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();

        self.domains
            .iter()
            .filter(|domain| {
                tags.contains(&domain.id_lc)
                    || domain.keywords.iter().any(|keyword| {
                        tags.contains(keyword) || texts.iter().any(|text| text.contains(keyword))
                    })
            })
            .map(|domain| domain.info.id.clone())
            .collect()
    }

    /// Classify every course and resource of a store.
    #[instrument(skip_all, fields(domains = self.domains.len()))]
    pub fn classify_store(&self, store: &ContentStore) -> Classification {
        let courses: BTreeMap<String, DomainSet> = store
            .courses()
            .iter()
            .map(|c| (c.id.clone(), self.classify_course(c)))
            .collect();
        let resources: BTreeMap<String, DomainSet> = store
            .resources()
            .iter()
            .map(|r| (r.id.clone(), self.classify_resource(r)))
            .collect();

        debug!(
            courses = courses.len(),
            resources = resources.len(),
            unclassified = courses.values().chain(resources.values()).filter(|d| d.is_empty()).count(),
            "classification complete"
        );

        Classification { courses, resources }
    }
}

/// Domain sets for every course and resource, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub courses: BTreeMap<String, DomainSet>,
    pub resources: BTreeMap<String, DomainSet>,
}

impl Classification {
    pub fn course_domains(&self, id: &str) -> Option<&DomainSet> {
        self.courses.get(id)
    }

    pub fn resource_domains(&self, id: &str) -> Option<&DomainSet> {
        self.resources.get(id)
    }

    /// Course ids in a domain, ascending.
    pub fn courses_in(&self, domain_id: &str) -> Vec<&str> {
        members(&self.courses, domain_id)
    }

    /// Resource ids in a domain, ascending.
    pub fn resources_in(&self, domain_id: &str) -> Vec<&str> {
        members(&self.resources, domain_id)
    }
}

fn members<'m>(sets: &'m BTreeMap<String, DomainSet>, domain_id: &str) -> Vec<&'m str> {
    sets.iter()
        .filter(|(_, domains)| domains.contains(domain_id))
        .map(|(id, _)| id.as_str())
        .collect()
}

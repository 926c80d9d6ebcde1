//! Cross-domain course relationships and per-domain statistics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use coursehub_shared::Course;

use crate::classifier::{Classification, DomainClassifier, DomainSet};

/// Two courses sharing at least one domain. `course_id < related_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRelation {
    pub course_id: String,
    pub related_id: String,
    pub shared_domains: Vec<String>,
}

/// One neighbour of a course, as seen from that course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedCourse {
    pub id: String,
    pub shared_domains: Vec<String>,
}

/// All course relationships, in deterministic order.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    pairs: Vec<CourseRelation>,
}

impl RelationGraph {
    /// Pairs ordered by shared-domain count descending, then course id,
    /// then related id.
    pub fn pairs(&self) -> &[CourseRelation] {
        &self.pairs
    }

    /// Neighbours of `course_id`, same ordering rule as [`Self::pairs`].
    pub fn related_to(&self, course_id: &str) -> Vec<RelatedCourse> {
        let mut related: Vec<RelatedCourse> = self
            .pairs
            .iter()
            .filter_map(|pair| {
                let other = if pair.course_id == course_id {
                    &pair.related_id
                } else if pair.related_id == course_id {
                    &pair.course_id
                } else {
                    return None;
                };
                Some(RelatedCourse {
                    id: other.clone(),
                    shared_domains: pair.shared_domains.clone(),
                })
            })
            .collect();

        related.sort_by(|a, b| by_shared_then_id(&a.shared_domains, &a.id, &b.shared_domains, &b.id));
        related
    }
}

/// Find every pair of courses sharing at least one domain.
#[instrument(skip_all, fields(courses = courses.len()))]
pub fn find_relationships(courses: &[Course], classifier: &DomainClassifier<'_>) -> RelationGraph {
    let mut classified: Vec<(&str, DomainSet)> = courses
        .iter()
        .map(|c| (c.id.as_str(), classifier.classify_course(c)))
        .collect();
    classified.sort_by(|a, b| a.0.cmp(b.0));
    classified.dedup_by(|a, b| a.0 == b.0);

    let mut pairs = Vec::new();
    for (i, (id, domains)) in classified.iter().enumerate() {
        for (other_id, other_domains) in &classified[i + 1..] {
            let shared: Vec<String> = domains.intersection(other_domains).cloned().collect();
            if !shared.is_empty() {
                pairs.push(CourseRelation {
                    course_id: (*id).to_string(),
                    related_id: (*other_id).to_string(),
                    shared_domains: shared,
                });
            }
        }
    }

    pairs.sort_by(|a, b| {
        by_shared_then_id(&a.shared_domains, &a.course_id, &b.shared_domains, &b.course_id)
            .then_with(|| a.related_id.cmp(&b.related_id))
    });

    debug!(pairs = pairs.len(), "relationships computed");
    RelationGraph { pairs }
}

fn by_shared_then_id(a_shared: &[String], a_id: &str, b_shared: &[String], b_id: &str) -> Ordering {
    b_shared.len().cmp(&a_shared.len()).then_with(|| a_id.cmp(b_id))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Course/resource counts for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainStats {
    pub domain_id: String,
    pub label: String,
    pub course_count: usize,
    pub resource_count: usize,
}

/// Number of courses carrying both domains. `domain_a < domain_b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainPairCount {
    pub domain_a: String,
    pub domain_b: String,
    pub course_count: usize,
}

/// Per-domain counts, in domain table order. Domains without members are kept.
pub fn domain_stats(
    classifier: &DomainClassifier<'_>,
    classification: &Classification,
) -> Vec<DomainStats> {
    classifier
        .domains()
        .map(|info| DomainStats {
            domain_id: info.id.clone(),
            label: info.label.clone(),
            course_count: classification.courses_in(&info.id).len(),
            resource_count: classification.resources_in(&info.id).len(),
        })
        .collect()
}

/// How often each pair of domains co-occurs on a course, most frequent first.
pub fn domain_co_occurrence(classification: &Classification) -> Vec<DomainPairCount> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for domains in classification.courses.values() {
        let domains: Vec<&str> = domains.iter().map(String::as_str).collect();
        for (i, a) in domains.iter().enumerate() {
            for b in &domains[i + 1..] {
                *counts.entry((*a, *b)).or_default() += 1;
            }
        }
    }

    let mut pairs: Vec<DomainPairCount> = counts
        .into_iter()
        .map(|((a, b), course_count)| DomainPairCount {
            domain_a: a.to_string(),
            domain_b: b.to_string(),
            course_count,
        })
        .collect();
    // Stable sort keeps the (a, b) order from the BTreeMap for ties.
    pairs.sort_by(|x, y| y.course_count.cmp(&x.course_count));
    pairs
}

//! In-memory keyword search across courses, learning paths and resources.
//!
//! Ranking: exact title match > tag match > substring match. Each entity is
//! reported once, at its best rank.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use coursehub_content::ContentStore;
use coursehub_shared::EntityKind;

/// How a document matched a query. Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRank {
    /// Query found in title or body text, or every query word found somewhere.
    Substring,
    /// Query equals one of the tags.
    Tag,
    /// Query equals the title.
    ExactTitle,
}

/// One searchable entity, pre-lowercased.
#[derive(Debug, Clone, Serialize)]
pub struct SearchDocument {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Summary/description plus secondary fields (instructors, audience).
    pub text: String,
    /// Site-relative page path.
    pub href: String,
    #[serde(skip)]
    title_lc: String,
    #[serde(skip)]
    tags_lc: Vec<String>,
    #[serde(skip)]
    text_lc: String,
}

impl SearchDocument {
    fn new(kind: EntityKind, id: &str, title: &str, tags: Vec<String>, text: String) -> Self {
        Self {
            kind,
            id: id.to_string(),
            title: title.to_string(),
            title_lc: title.trim().to_lowercase(),
            tags_lc: tags.iter().map(|t| t.trim().to_lowercase()).collect(),
            text_lc: text.to_lowercase(),
            href: format!("/{}/{id}", kind.url_segment()),
            tags,
            text,
        }
    }

    fn rank(&self, query: &str, words: &[&str]) -> Option<MatchRank> {
        if self.title_lc == query {
            return Some(MatchRank::ExactTitle);
        }
        if self.tags_lc.iter().any(|t| t == query) {
            return Some(MatchRank::Tag);
        }
        if self.title_lc.contains(query) || self.text_lc.contains(query) {
            return Some(MatchRank::Substring);
        }
        let all_words = words.len() > 1
            && words.iter().all(|w| {
                self.title_lc.contains(w)
                    || self.text_lc.contains(w)
                    || self.tags_lc.iter().any(|t| t.contains(w))
            });
        all_words.then_some(MatchRank::Substring)
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    pub rank: MatchRank,
    pub href: String,
}

/// Searchable snapshot of a content store.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    documents: Vec<SearchDocument>,
    limit: usize,
}

impl SearchIndex {
    /// Index every course, learning path and resource of `store`.
    #[instrument(skip_all)]
    pub fn build(store: &ContentStore) -> Self {
        let mut documents = Vec::new();

        for c in store.courses() {
            let text = [
                c.summary.as_str(),
                c.instructors.join(" ").as_str(),
                c.course_type.as_str(),
            ]
            .join(" ");
            documents.push(SearchDocument::new(
                EntityKind::Course,
                &c.id,
                &c.title,
                c.tags.iter().cloned().collect(),
                text,
            ));
        }

        for p in store.paths() {
            let steps: Vec<&str> = p.steps.iter().map(|s| s.title.as_str()).collect();
            let text = [
                p.description.as_str(),
                p.audience.as_str(),
                steps.join(" ").as_str(),
            ]
            .join(" ");
            documents.push(SearchDocument::new(
                EntityKind::LearningPath,
                &p.id,
                &p.title,
                Vec::new(),
                text,
            ));
        }

        for r in store.resources() {
            documents.push(SearchDocument::new(
                EntityKind::Resource,
                &r.id,
                &r.title,
                r.tags.iter().cloned().collect(),
                r.description.clone(),
            ));
        }

        debug!(documents = documents.len(), "search index built");
        Self {
            documents,
            limit: usize::MAX,
        }
    }

    /// Cap the number of hits returned per query.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn documents(&self) -> &[SearchDocument] {
        &self.documents
    }

    /// Run a query. Blank queries return nothing.
    ///
    /// Hits are ordered by rank, then kind (course, learning path,
    /// resource), then id.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let words: Vec<&str> = query.split_whitespace().collect();

        let mut best: HashMap<(EntityKind, &str), (MatchRank, &SearchDocument)> = HashMap::new();
        for doc in &self.documents {
            let Some(rank) = doc.rank(&query, &words) else {
                continue;
            };
            best.entry((doc.kind, doc.id.as_str()))
                .and_modify(|entry| {
                    if rank > entry.0 {
                        *entry = (rank, doc);
                    }
                })
                .or_insert((rank, doc));
        }

        let mut hits: Vec<SearchHit> = best
            .into_values()
            .map(|(rank, doc)| SearchHit {
                kind: doc.kind,
                id: doc.id.clone(),
                title: doc.title.clone(),
                rank,
                href: doc.href.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.rank
                .cmp(&a.rank)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(self.limit);
        hits
    }
}

//! SEO metadata for exported pages.

use std::collections::HashSet;

use serde::Serialize;

use coursehub_shared::{Course, DomainInfo, LearningPath, SiteConfig};

/// Search engines cut descriptions around this length.
const MAX_DESCRIPTION_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub keywords: Vec<String>,
    pub language: String,
}

/// Join a base URL and a site-relative path with exactly one slash.
pub fn page_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    }
}

/// Truncate on a char boundary, appending an ellipsis when shortened.
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

fn page_title(site: &SiteConfig, title: &str) -> String {
    format!("{title} | {}", site.title)
}

pub fn home_seo(site: &SiteConfig, base_url: &str) -> SeoMeta {
    SeoMeta {
        title: site.title.clone(),
        description: truncate_description(&site.description, MAX_DESCRIPTION_CHARS),
        canonical_url: page_url(base_url, "/"),
        keywords: site.keywords.clone(),
        language: site.language.clone(),
    }
}

pub fn course_seo(
    site: &SiteConfig,
    base_url: &str,
    course: &Course,
    domains: &[&DomainInfo],
) -> SeoMeta {
    let mut seen = HashSet::new();
    let keywords: Vec<String> = course
        .tags
        .iter()
        .chain(domains.iter().map(|d| &d.label))
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect();

    SeoMeta {
        title: page_title(site, &course.title),
        description: truncate_description(&course.summary, MAX_DESCRIPTION_CHARS),
        canonical_url: page_url(base_url, &format!("/courses/{}", course.id)),
        keywords,
        language: course.language.clone(),
    }
}

pub fn path_seo(site: &SiteConfig, base_url: &str, path: &LearningPath) -> SeoMeta {
    SeoMeta {
        title: page_title(site, &path.title),
        description: truncate_description(&path.description, MAX_DESCRIPTION_CHARS),
        canonical_url: page_url(base_url, &format!("/paths/{}", path.id)),
        keywords: site.keywords.clone(),
        language: site.language.clone(),
    }
}

pub fn domain_seo(site: &SiteConfig, base_url: &str, domain: &DomainInfo) -> SeoMeta {
    let mut keywords = vec![domain.label.clone()];
    keywords.extend(domain.methodologies.iter().cloned());
    keywords.extend(domain.tools.iter().cloned());

    SeoMeta {
        title: page_title(site, &domain.label),
        description: truncate_description(&domain.description, MAX_DESCRIPTION_CHARS),
        canonical_url: page_url(base_url, &format!("/domains/{}", domain.id)),
        keywords,
        language: site.language.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::course;

    fn site() -> SiteConfig {
        SiteConfig {
            title: "Urban Lab".into(),
            description: "Open courses.".into(),
            base_url: "https://courses.example.org/".into(),
            language: "zh-CN".into(),
            author: None,
            keywords: vec!["urban".into()],
        }
    }

    #[test]
    fn page_url_normalizes_slashes() {
        assert_eq!(page_url("https://a.org/", "/courses/x"), "https://a.org/courses/x");
        assert_eq!(page_url("https://a.org", "courses/x"), "https://a.org/courses/x");
        assert_eq!(page_url("https://a.org/", "/"), "https://a.org/");
        assert_eq!(page_url("https://a.org/sub", "/paths/p"), "https://a.org/sub/paths/p");
    }

    #[test]
    fn description_truncates_on_char_boundary() {
        let long = "交通".repeat(100);
        let out = truncate_description(&long, 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with('…'));
        assert_eq!(truncate_description("  short   text ", 160), "short text");
    }

    #[test]
    fn course_meta_uses_site_title_and_domain_labels() {
        let site = site();
        let c = course("gis", "GIS Fundamentals", &["gis"], "Maps.");
        let urban = coursehub_content::builtin_domains()
            .iter()
            .find(|d| d.id == "urban")
            .unwrap();
        let meta = course_seo(&site, &site.base_url, &c, &[urban]);
        assert_eq!(meta.title, "GIS Fundamentals | Urban Lab");
        assert_eq!(meta.canonical_url, "https://courses.example.org/courses/gis");
        assert_eq!(meta.keywords, vec!["gis", "Urban Studies"]);
        assert_eq!(meta.language, "en");
    }

    #[test]
    fn course_keywords_are_unique_in_first_seen_order() {
        let site = site();
        let c = course("u", "Urban", &["Urban Studies", "zzz"], "");
        let urban = coursehub_content::builtin_domains()
            .iter()
            .find(|d| d.id == "urban")
            .unwrap();
        let meta = course_seo(&site, &site.base_url, &c, &[urban]);
        assert_eq!(meta.keywords, vec!["Urban Studies", "zzz"]);
    }
}

//! `sitemap.xml` generation.

use chrono::NaiveDate;
use serde::Serialize;

use coursehub_content::ContentStore;

use crate::seo::page_url;

/// Site-relative static pages and their priorities.
pub const STATIC_PAGES: &[(&str, f32)] = &[
    ("/", 1.0),
    ("/courses", 0.9),
    ("/paths", 0.8),
    ("/resources", 0.8),
    ("/domains", 0.7),
    ("/search", 0.5),
    ("/about", 0.3),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<NaiveDate>,
    pub priority: f32,
}

/// Static pages, then one entry per course, learning path and domain.
pub fn sitemap_entries(store: &ContentStore, base_url: &str) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = STATIC_PAGES
        .iter()
        .map(|(path, priority)| SitemapEntry {
            loc: page_url(base_url, path),
            lastmod: None,
            priority: *priority,
        })
        .collect();

    entries.extend(store.courses().iter().map(|c| SitemapEntry {
        loc: page_url(base_url, &format!("/courses/{}", c.id)),
        lastmod: c.last_updated,
        priority: 0.8,
    }));
    entries.extend(store.paths().iter().map(|p| SitemapEntry {
        loc: page_url(base_url, &format!("/paths/{}", p.id)),
        lastmod: None,
        priority: 0.7,
    }));
    entries.extend(store.domains.iter().map(|d| SitemapEntry {
        loc: page_url(base_url, &format!("/domains/{}", d.id)),
        lastmod: None,
        priority: 0.6,
    }));

    entries
}

/// Render entries as a sitemaps.org `urlset` document.
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&entry.loc)));
        if let Some(lastmod) = entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod.format("%Y-%m-%d")));
        }
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::course;
    use coursehub_shared::SiteConfig;

    fn store() -> ContentStore {
        let mut c = course("gis", "GIS", &[], "");
        c.last_updated = NaiveDate::from_ymd_opt(2025, 1, 5);
        ContentStore::from_parts(
            SiteConfig {
                title: "T".into(),
                description: String::new(),
                base_url: "https://example.com".into(),
                language: "en".into(),
                author: None,
                keywords: vec![],
            },
            coursehub_content::builtin_domains().to_vec(),
            vec![c],
            vec![],
            vec![],
        )
    }

    #[test]
    fn entries_cover_static_course_and_domain_pages() {
        let store = store();
        let entries = sitemap_entries(&store, "https://example.com/");
        assert_eq!(
            entries.len(),
            STATIC_PAGES.len() + 1 + store.domains.len()
        );
        assert_eq!(entries[0].loc, "https://example.com/");
        assert!(entries.iter().any(|e| e.loc == "https://example.com/courses/gis"
            && e.lastmod == NaiveDate::from_ymd_opt(2025, 1, 5)));
        assert!(entries.iter().any(|e| e.loc == "https://example.com/domains/urban"));
    }

    #[test]
    fn render_produces_urlset() {
        let xml = render_sitemap(&sitemap_entries(&store(), "https://example.com"));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://example.com/courses/gis</loc>"));
        assert!(xml.contains("<lastmod>2025-01-05</lastmod>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn loc_is_escaped() {
        assert_eq!(xml_escape("https://a.org/?a=1&b=2"), "https://a.org/?a=1&amp;b=2");
    }
}

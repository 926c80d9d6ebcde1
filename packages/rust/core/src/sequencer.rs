//! Learning-path sequencing.
//!
//! Steps are returned sorted by `order` and resolved against the loaded
//! courses and resources. A reference to an id that is not loaded never
//! fails: the step is kept and marked as missing so it renders without a link.

use serde::Serialize;
use tracing::warn;

use coursehub_content::ContentStore;
use coursehub_shared::{Course, EntityKind, LearningPath, PathStep, Resource};

/// What a step points at after resolution.
#[derive(Debug, Clone, Copy)]
pub enum StepTarget<'a> {
    Course(&'a Course),
    Resource(&'a Resource),
    /// The step names an id that is not loaded.
    Missing { kind: EntityKind, id: &'a str },
    /// The step references nothing.
    Unlinked,
}

#[derive(Debug, Clone, Copy)]
pub struct SequencedStep<'a> {
    pub step: &'a PathStep,
    pub target: StepTarget<'a>,
}

/// Link to the entity a step resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepLink {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    /// Site-relative page path for courses, the external URL for resources.
    pub href: String,
}

/// Serializable view of a sequenced step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub order: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<StepLink>,
    /// Id of a reference that could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_reference: Option<String>,
}

impl SequencedStep<'_> {
    pub fn link(&self) -> Option<StepLink> {
        match self.target {
            StepTarget::Course(course) => Some(StepLink {
                kind: EntityKind::Course,
                id: course.id.clone(),
                title: course.title.clone(),
                href: format!("/{}/{}", EntityKind::Course.url_segment(), course.id),
            }),
            StepTarget::Resource(resource) => Some(StepLink {
                kind: EntityKind::Resource,
                id: resource.id.clone(),
                title: resource.title.clone(),
                href: resource.url.clone(),
            }),
            StepTarget::Missing { .. } | StepTarget::Unlinked => None,
        }
    }

    pub fn view(&self) -> StepView {
        StepView {
            order: self.step.order,
            title: self.step.title.clone(),
            description: self.step.description.clone(),
            link: self.link(),
            missing_reference: match self.target {
                StepTarget::Missing { id, .. } => Some(id.to_string()),
                _ => None,
            },
        }
    }
}

/// Sort a path's steps by `order` (stable) and resolve their references.
///
/// A step carrying both ids resolves its course; validation rejects such
/// content, so this only matters for stores built in memory.
pub fn sequence<'a>(path: &'a LearningPath, store: &'a ContentStore) -> Vec<SequencedStep<'a>> {
    let mut steps: Vec<&PathStep> = path.steps.iter().collect();
    steps.sort_by_key(|s| s.order);

    steps
        .into_iter()
        .map(|step| {
            let target = resolve(step, store);
            if let StepTarget::Missing { kind, id } = target {
                warn!(path = %path.id, order = step.order, %kind, id, "step references unknown entity, rendering without link");
            }
            SequencedStep { step, target }
        })
        .collect()
}

fn resolve<'a>(step: &'a PathStep, store: &'a ContentStore) -> StepTarget<'a> {
    if let Some(id) = step.course_id.as_deref() {
        return store.course(id).map_or(
            StepTarget::Missing {
                kind: EntityKind::Course,
                id,
            },
            StepTarget::Course,
        );
    }
    if let Some(id) = step.resource_id.as_deref() {
        return store.resource(id).map_or(
            StepTarget::Missing {
                kind: EntityKind::Resource,
                id,
            },
            StepTarget::Resource,
        );
    }
    StepTarget::Unlinked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::{course, resource};
    use coursehub_shared::SiteConfig;

    fn step(order: u32, course_id: Option<&str>, resource_id: Option<&str>) -> PathStep {
        PathStep {
            order,
            title: format!("Step {order}"),
            description: None,
            course_id: course_id.map(String::from),
            resource_id: resource_id.map(String::from),
        }
    }

    fn learning_path(steps: Vec<PathStep>) -> LearningPath {
        LearningPath {
            id: "lp".into(),
            title: "Path".into(),
            description: String::new(),
            audience: String::new(),
            duration: None,
            steps,
        }
    }

    fn store() -> ContentStore {
        ContentStore::from_parts(
            SiteConfig {
                title: "T".into(),
                description: String::new(),
                base_url: "https://example.com".into(),
                language: "en".into(),
                author: None,
                keywords: vec![],
            },
            vec![],
            vec![course("gis", "GIS", &[], "")],
            vec![resource("osm", "OSM", &[], "")],
            vec![],
        )
    }

    #[test]
    fn steps_come_back_in_order() {
        let store = store();
        let lp = learning_path(vec![
            step(3, None, Some("osm")),
            step(1, None, None),
            step(2, Some("gis"), None),
        ]);
        let orders: Vec<u32> = sequence(&lp, &store).iter().map(|s| s.step.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert!(orders.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn references_resolve_to_links() {
        let store = store();
        let lp = learning_path(vec![step(1, Some("gis"), None), step(2, None, Some("osm"))]);
        let seq = sequence(&lp, &store);

        let course_link = seq[0].link().unwrap();
        assert_eq!(course_link.kind, EntityKind::Course);
        assert_eq!(course_link.href, "/courses/gis");

        let resource_link = seq[1].link().unwrap();
        assert_eq!(resource_link.href, "https://example.com/osm");
    }

    #[test]
    fn missing_course_renders_without_link() {
        let store = store();
        let lp = learning_path(vec![step(1, Some("ghost"), None)]);
        let seq = sequence(&lp, &store);

        assert_eq!(seq.len(), 1);
        assert!(matches!(
            seq[0].target,
            StepTarget::Missing { kind: EntityKind::Course, id: "ghost" }
        ));
        let view = seq[0].view();
        assert!(view.link.is_none());
        assert_eq!(view.missing_reference.as_deref(), Some("ghost"));
        assert_eq!(view.title, "Step 1");
    }

    #[test]
    fn equal_orders_keep_file_order() {
        let store = store();
        let mut first = step(1, None, None);
        first.title = "first".into();
        let mut second = step(1, None, None);
        second.title = "second".into();
        let lp = learning_path(vec![first, second]);
        let titles: Vec<&str> = sequence(&lp, &store).iter().map(|s| s.step.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}

//! Scene store and capture collaborators the modeller publishes to.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub mod capture;
pub mod node;
pub mod object;

pub use capture::{MarkupCapture, PointCapture};
pub use node::{DisplayStyle, NodeId, SceneNode};
pub use object::{CrossSectionView, ObjectKind, SceneObject};

/// Persistent store of named objects.
pub trait SceneStore {
    fn add_object(&mut self, name: &str, object: SceneObject) -> NodeId;

    /// Swaps the payload of an existing node; the kind must not change.
    fn replace_object(&mut self, id: NodeId, object: SceneObject) -> Result<(), SceneError>;

    fn find(&self, kind: ObjectKind, name: &str) -> Option<NodeId>;

    fn node(&self, id: NodeId) -> Option<&SceneNode>;

    /// `None` when the host has no style for `kind` yet.
    fn default_style(&self, kind: ObjectKind) -> Option<DisplayStyle>;

    fn set_style(&mut self, id: NodeId, style: DisplayStyle) -> Result<(), SceneError>;

    fn set_visibility(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError>;

    fn view_mut(&mut self, view_id: &str) -> Option<&mut CrossSectionView>;

    /// Replaces the object called `name` or adds it with the default style.
    fn upsert(&mut self, name: &str, object: SceneObject) -> Result<NodeId, SceneError> {
        let kind = object.kind();
        if let Some(id) = self.find(kind, name) {
            self.replace_object(id, object)?;
            return Ok(id);
        }

        let id = self.add_object(name, object);
        match self.default_style(kind) {
            Some(style) => self.set_style(id, style)?,
            None => log::warn!("no display style for {kind} '{name}'"),
        }
        Ok(id)
    }
}

/// In-memory scene with name indices, per-kind default styles and named views.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    node_index: HashMap<NodeId, usize>,
    name_index: HashMap<(ObjectKind, String), NodeId>,
    styles: HashMap<ObjectKind, DisplayStyle>,
    views: BTreeMap<String, CrossSectionView>,
    next_id: usize,
}

impl Scene {
    /// Empty scene without styles or views.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_styles(mut self) -> Self {
        for kind in ObjectKind::ALL {
            self.styles.insert(kind, DisplayStyle::default_for(kind));
        }
        self
    }

    #[must_use]
    pub fn with_view(mut self, view_id: impl Into<String>) -> Self {
        self.views.insert(view_id.into(), CrossSectionView::default());
        self
    }

    pub fn register_style(&mut self, kind: ObjectKind, style: DisplayStyle) {
        self.styles.insert(kind, style);
    }

    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn nodes_of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().filter(move |node| node.kind() == kind)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn view(&self, view_id: &str) -> Option<&CrossSectionView> {
        self.views.get(view_id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.node_index
            .get(&id)
            .copied()
            .and_then(move |idx| self.nodes.get_mut(idx))
            .ok_or(SceneError::UnknownNode(id))
    }
}

impl SceneStore for Scene {
    fn add_object(&mut self, name: &str, object: SceneObject) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;

        self.name_index.insert((object.kind(), normalize_name(name)), id);
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(SceneNode::new(id, name, object));
        id
    }

    fn replace_object(&mut self, id: NodeId, object: SceneObject) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        let (expected, found) = (node.kind(), object.kind());
        if expected != found {
            return Err(SceneError::KindMismatch { id, expected, found });
        }
        node.object = object;
        Ok(())
    }

    fn find(&self, kind: ObjectKind, name: &str) -> Option<NodeId> {
        self.name_index.get(&(kind, normalize_name(name))).copied()
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.node_index
            .get(&id)
            .and_then(|idx| self.nodes.get(*idx))
    }

    fn default_style(&self, kind: ObjectKind) -> Option<DisplayStyle> {
        self.styles.get(&kind).copied()
    }

    fn set_style(&mut self, id: NodeId, style: DisplayStyle) -> Result<(), SceneError> {
        self.node_mut(id)?.style = Some(style);
        Ok(())
    }

    fn set_visibility(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        node.style.get_or_insert_with(DisplayStyle::default).visible = visible;
        Ok(())
    }

    fn view_mut(&mut self, view_id: &str) -> Option<&mut CrossSectionView> {
        self.views.get_mut(view_id)
    }
}

/// Errors raised by scene mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    UnknownNode(NodeId),
    KindMismatch {
        id: NodeId,
        expected: ObjectKind,
        found: ObjectKind,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {} not found in scene", id.0),
            Self::KindMismatch { id, expected, found } => {
                write!(f, "node {} holds a {expected}, cannot store a {found}", id.0)
            }
        }
    }
}

impl std::error::Error for SceneError {}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Polyline};

    fn curve(x: f64) -> Polyline {
        Polyline::open(vec![Point3::ORIGIN, Point3::new(x, 0.0, 0.0)])
    }

    #[test]
    fn upsert_replaces_by_kind_and_name() {
        let mut scene = Scene::new().with_default_styles();
        let first = scene
            .upsert("Leaflet1", SceneObject::LeafletCurve { slot: 1, curve: curve(1.0) })
            .unwrap();
        let second = scene
            .upsert(" leaflet1 ", SceneObject::LeafletCurve { slot: 1, curve: curve(2.0) })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(scene.node_count(), 1);
        let node = scene.node(first).unwrap();
        assert_eq!(node.object.as_polyline(), Some(&curve(2.0)));
        assert_eq!(node.style, Some(DisplayStyle::default_for(ObjectKind::LeafletCurve)));

        // Same name, different kind: a separate node.
        scene.upsert("Leaflet1", SceneObject::Profile(curve(3.0))).unwrap();
        assert_eq!(scene.node_count(), 2);
    }

    #[test]
    fn missing_style_leaves_node_unstyled() {
        let mut scene = Scene::new();
        let id = scene.upsert("MVOpening", SceneObject::Profile(curve(1.0))).unwrap();
        assert_eq!(scene.node(id).unwrap().style, None);
        assert!(scene.node(id).unwrap().is_visible());
    }

    #[test]
    fn replace_checks_kind_and_existence() {
        let mut scene = Scene::new();
        let id = scene.add_object("MVOpening", SceneObject::Profile(curve(1.0)));

        let err = scene
            .replace_object(id, SceneObject::LeafletCurve { slot: 2, curve: curve(1.0) })
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::KindMismatch { expected: ObjectKind::Profile, found: ObjectKind::LeafletCurve, .. }
        ));
        assert!(matches!(
            scene.set_visibility(NodeId::new(42), false),
            Err(SceneError::UnknownNode(id)) if id == NodeId::new(42)
        ));
    }

    #[test]
    fn visibility_and_views() {
        let mut scene = Scene::new().with_view("CrossSectionRed");
        let id = scene.add_object("MVOpening", SceneObject::Profile(curve(1.0)));
        scene.set_visibility(id, false).unwrap();
        assert!(!scene.node(id).unwrap().is_visible());

        assert!(scene.view_mut("CrossSectionRed").is_some());
        assert!(scene.view_mut("CrossSectionGreen").is_none());
    }
}

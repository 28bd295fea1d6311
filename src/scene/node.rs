//! Nodes stored in the scene.

use serde::{Deserialize, Serialize};

use super::object::{ObjectKind, SceneObject};

/// Identifier of a node within the scene.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

/// Display attributes a host applies when drawing a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayStyle {
    pub color: [f32; 3],
    pub opacity: f32,
    pub visible: bool,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            opacity: 1.0,
            visible: true,
        }
    }
}

impl DisplayStyle {
    #[must_use]
    pub const fn colored(color: [f32; 3]) -> Self {
        Self {
            color,
            opacity: 1.0,
            visible: true,
        }
    }

    /// Style used for `kind` when a scene is created with default styles.
    #[must_use]
    pub fn default_for(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Profile => Self::colored([1.0, 0.85, 0.0]),
            ObjectKind::Plane => Self {
                opacity: 0.3,
                ..Self::colored([0.3, 0.6, 1.0])
            },
            ObjectKind::LeafletCurve => Self::colored([0.0, 0.9, 0.4]),
            ObjectKind::Surface => Self::colored([0.9, 0.5, 0.5]),
        }
    }
}

/// A named object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub object: SceneObject,
    /// `None` until a style has been assigned.
    pub style: Option<DisplayStyle>,
}

impl SceneNode {
    #[must_use]
    pub fn new(id: NodeId, name: impl Into<String>, object: SceneObject) -> Self {
        Self {
            id,
            name: name.into(),
            object,
            style: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.object.kind()
    }

    /// Nodes without a style count as visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.style.is_none_or(|style| style.visible)
    }
}

//! Interactive landmark placement.

use crate::geom::Point3;

/// A point-placement tool bound to one target at a time.
pub trait PointCapture {
    /// Enters persistent placement mode for `target`.
    fn begin(&mut self, target: &str);

    /// Leaves placement mode; captured points stay readable.
    fn end(&mut self);

    fn clear(&mut self);

    fn is_active(&self) -> bool;

    /// Target of the current or most recent session.
    fn target(&self) -> Option<&str>;

    fn point_count(&self) -> usize;

    fn point(&self, index: usize) -> Option<Point3>;

    fn set_target_visible(&mut self, visible: bool);

    /// Captured points in placement order.
    fn landmarks(&self) -> Vec<Point3> {
        (0..self.point_count()).filter_map(|i| self.point(i)).collect()
    }
}

/// In-memory markup list.
#[derive(Debug, Clone, Default)]
pub struct MarkupCapture {
    target: Option<String>,
    active: bool,
    points: Vec<Point3>,
    target_visible: bool,
}

impl MarkupCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a landmark. Ignored outside a session.
    pub fn add_point(&mut self, point: Point3) -> bool {
        if self.active {
            self.points.push(point);
        }
        self.active
    }

    pub fn remove_point(&mut self, index: usize) -> Option<Point3> {
        (index < self.points.len()).then(|| self.points.remove(index))
    }

    pub fn move_point(&mut self, index: usize, point: Point3) -> bool {
        match self.points.get_mut(index) {
            Some(slot) => {
                *slot = point;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_target_visible(&self) -> bool {
        self.target_visible
    }
}

impl PointCapture for MarkupCapture {
    fn begin(&mut self, target: &str) {
        self.target = Some(target.to_owned());
        self.active = true;
        self.target_visible = true;
    }

    fn end(&mut self) {
        self.active = false;
    }

    fn clear(&mut self) {
        self.points.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    fn set_target_visible(&mut self, visible: bool) {
        self.target_visible = visible;
    }
}

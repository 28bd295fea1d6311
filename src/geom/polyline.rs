use serde::{Deserialize, Serialize};

use super::Point3;

/// Ordered point sequence with a closed flag.
///
/// An empty polyline is valid and is used as the "not yet captured" sentinel
/// by the leaflet store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point3>,
    closed: bool,
}

impl Polyline {
    #[must_use]
    pub fn new(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    #[must_use]
    pub fn open(points: Vec<Point3>) -> Self {
        Self::new(points, false)
    }

    #[must_use]
    pub fn closed(points: Vec<Point3>) -> Self {
        Self::new(points, true)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    #[must_use]
    pub fn first(&self) -> Option<Point3> {
        self.points.first().copied()
    }

    #[must_use]
    pub fn last(&self) -> Option<Point3> {
        self.points.last().copied()
    }

    /// Arc length, including the closing segment for closed polylines.
    #[must_use]
    pub fn length(&self) -> f64 {
        let mut total: f64 = self
            .points
            .windows(2)
            .map(|w| w[0].distance_to(w[1]))
            .sum();
        if self.closed && self.points.len() > 2 {
            if let (Some(first), Some(last)) = (self.first(), self.last()) {
                total += last.distance_to(first);
            }
        }
        total
    }
}

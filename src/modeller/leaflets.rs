//! Fixed-capacity store of leaflet boundary curves, one per plane slot.

use serde::{Deserialize, Serialize};

use crate::geom::Polyline;

/// Number of leaflet slots; one per cross-section plane.
pub const LEAFLET_SLOT_COUNT: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("leaflet slot {slot} is outside 1..=11")]
    SlotOutOfRange { slot: usize },
}

/// Slots are addressed 1-based. An empty polyline marks a slot that has not
/// been captured yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeafletCurveStore {
    slots: [Polyline; LEAFLET_SLOT_COUNT],
}

impl LeafletCurveStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the curve in `slot`.
    pub fn set(&mut self, slot: usize, curve: Polyline) -> Result<(), StoreError> {
        let index = Self::index(slot)?;
        self.slots[index] = curve;
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Result<&Polyline, StoreError> {
        Ok(&self.slots[Self::index(slot)?])
    }

    /// All slots in order; `all()[0]` is slot 1.
    #[must_use]
    pub fn all(&self) -> &[Polyline] {
        &self.slots
    }

    /// Non-empty slots with their 1-based slot numbers.
    pub fn populated(&self) -> impl Iterator<Item = (usize, &Polyline)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, curve)| !curve.is_empty())
            .map(|(i, curve)| (i + 1, curve))
    }

    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.populated().count()
    }

    fn index(slot: usize) -> Result<usize, StoreError> {
        if (1..=LEAFLET_SLOT_COUNT).contains(&slot) {
            Ok(slot - 1)
        } else {
            Err(StoreError::SlotOutOfRange { slot })
        }
    }
}

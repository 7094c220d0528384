// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated damage and how it is reported to the embedder.

use alloc::vec::Vec;

use kurbo::Rect;

/// How accumulated damage is forwarded to the scene client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// Damage is tracked but never forwarded.
    #[default]
    None,
    /// Forward every damage rectangle.
    Region,
    /// Forward a single rectangle bounding all damage.
    Unified,
}

/// A region of the surface that needs repainting.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Damage {
    /// Nothing changed; the previous frame can be reused.
    #[default]
    None,
    /// Root-space rectangles that need repainting.
    Rects(Vec<Rect>),
    /// The whole surface needs repainting.
    Full,
}

impl Damage {
    /// Returns `true` if nothing needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds a rectangle. Empty rectangles are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        if rect.area() <= 0.0 {
            return;
        }
        match self {
            Self::Full => {}
            Self::None => *self = Self::Rects(alloc::vec![rect]),
            Self::Rects(rects) => rects.push(rect),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Full, _) | (_, Self::None) => {}
            (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (Self::Rects(a), Self::Rects(b)) => a.extend_from_slice(b),
        }
    }

    /// Returns the bounding rectangle of all rects, or `None` if the damage
    /// is empty or full.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::None | Self::Full => None,
        }
    }

    /// Returns the damage to forward under `propagation`, or `None` when
    /// nothing should be forwarded.
    #[must_use]
    pub fn for_propagation(&self, propagation: Propagation) -> Option<Self> {
        if self.is_empty() {
            return None;
        }
        match propagation {
            Propagation::None => None,
            Propagation::Region => Some(self.clone()),
            Propagation::Unified => Some(match self.bounds() {
                Some(b) => Self::Rects(alloc::vec![b]),
                None => self.clone(),
            }),
        }
    }

    /// Clears the damage.
    pub fn clear(&mut self) {
        *self = Self::None;
    }

    /// Returns the individual rectangles (empty for `None` and `Full`).
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        match self {
            Self::Rects(r) => r,
            Self::None | Self::Full => &[],
        }
    }
}

impl From<Vec<Rect>> for Damage {
    fn from(rects: Vec<Rect>) -> Self {
        let mut damage = Self::None;
        for r in rects {
            damage.add_rect(r);
        }
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_full_dominates() {
        let mut d = Damage::from(alloc::vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);
        d.merge(&Damage::Full);
        assert_eq!(d, Damage::Full);
        d.merge(&Damage::None);
        assert_eq!(d, Damage::Full);
    }

    #[test]
    fn add_rect_ignores_empty() {
        let mut d = Damage::None;
        d.add_rect(Rect::new(3.0, 3.0, 3.0, 9.0));
        assert!(d.is_empty());
    }

    #[test]
    fn unified_propagation_forwards_bounding_box() {
        let d = Damage::from(alloc::vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(50.0, 20.0, 60.0, 30.0),
        ]);
        assert_eq!(
            d.for_propagation(Propagation::Unified),
            Some(Damage::Rects(alloc::vec![Rect::new(0.0, 0.0, 60.0, 30.0)]))
        );
        assert_eq!(d.for_propagation(Propagation::Region), Some(d.clone()));
        assert_eq!(d.for_propagation(Propagation::None), None);
    }

    #[test]
    fn empty_damage_is_never_forwarded() {
        assert_eq!(Damage::None.for_propagation(Propagation::Region), None);
    }
}

//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857, UTM), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An inverted box that any point expands.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// True until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow the box to include a point.
    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Zeroed extent for empty boxes, as file headers expect.
    pub fn or_zero(&self) -> BoundingBox {
        if self.is_empty() {
            BoundingBox::new(0.0, 0.0, 0.0, 0.0)
        } else {
            *self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_from_empty() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());

        bbox.expand(5.0, 60.0);
        bbox.expand(7.5, 61.0);
        assert!(!bbox.is_empty());
        assert_eq!(bbox, BoundingBox::new(5.0, 60.0, 7.5, 61.0));
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 15.0, 5.0);

        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, -5.0, 15.0, 10.0));
        assert_eq!(u.width(), 15.0);
        assert_eq!(u.height(), 15.0);
    }

    #[test]
    fn test_or_zero() {
        assert_eq!(
            BoundingBox::empty().or_zero(),
            BoundingBox::new(0.0, 0.0, 0.0, 0.0)
        );
    }
}

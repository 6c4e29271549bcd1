//! Observable footprint of the instrument and the membership test.
#![allow(clippy::doc_markdown)]

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box used to reject points before the edge walk.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its extents.
    #[must_use]
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Returns true if the point lies outside the box.
    #[inline]
    #[must_use]
    pub fn excludes(&self, x: f64, y: f64) -> bool {
        x < self.x_min || x > self.x_max || y < self.y_min || y > self.y_max
    }
}

/// Boundary of the region the IFU can observe.
///
/// The boundary is a sequence of vertices walked edge by edge; each edge
/// rejects the half-plane to its left. Callers must therefore supply the
/// vertices in **clockwise** order. The test only looks at the edges
/// `(v[i], v[i + 1])` and never pairs the last vertex with the first, so a
/// closed ring needs the first vertex repeated at the end of the list.
///
/// Points within `min_radius` of the origin are always inside, whatever the
/// polygon says. `max_radius` is carried from the input but not used.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FootprintBoundary {
    vertices: Vec<(f64, f64)>,
    min_radius: f64,
    max_radius: f64,
    bounds: BoundingBox,
}

impl FootprintBoundary {
    /// Builds a footprint, validating what the membership test relies on.
    ///
    /// # Errors
    /// Returns [`Error::MalformedBoundary`] when there are fewer than two
    /// vertices, a radius is not finite, or the bounding box is not finite
    /// or inverted.
    pub fn new(
        vertices: Vec<(f64, f64)>,
        min_radius: f64,
        max_radius: f64,
        bounds: BoundingBox,
    ) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(Error::MalformedBoundary(format!(
                "need at least 2 vertices, got {}",
                vertices.len()
            )));
        }
        if !min_radius.is_finite() || !max_radius.is_finite() {
            return Err(Error::MalformedBoundary(format!(
                "radii must be finite (min {min_radius}, max {max_radius})"
            )));
        }
        let BoundingBox {
            x_min,
            x_max,
            y_min,
            y_max,
        } = bounds;
        if ![x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite()) {
            return Err(Error::MalformedBoundary(
                "bounding box must be finite".to_string(),
            ));
        }
        if x_min > x_max || y_min > y_max {
            return Err(Error::MalformedBoundary(format!(
                "inverted bounding box x [{x_min}, {x_max}] y [{y_min}, {y_max}]"
            )));
        }
        if let Some(i) = vertices
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(Error::MalformedBoundary(format!(
                "vertex {i} is not finite"
            )));
        }

        Ok(Self {
            vertices,
            min_radius,
            max_radius,
            bounds,
        })
    }

    /// Returns true if `(x, y)` lies in the observable footprint.
    ///
    /// 1. within `min_radius` of the origin: inside;
    /// 2. outside the bounding box: outside;
    /// 3. strictly left of any open-chain edge: outside;
    /// 4. otherwise inside.
    #[must_use]
    pub fn is_inside(&self, x: f64, y: f64) -> bool {
        if (x * x + y * y).sqrt() <= self.min_radius {
            return true;
        }
        if self.bounds.excludes(x, y) {
            return false;
        }

        for edge in self.vertices.windows(2) {
            let (x0, y0) = edge[0];
            let (x1, y1) = edge[1];
            let dx = x1 - x0;
            let dy = y1 - y0;
            if (y - y0) * dx - (x - x0) * dy > 0.0 {
                return false;
            }
        }

        true
    }

    /// Boundary vertices in input order.
    #[must_use]
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Radius below which every point is accepted.
    #[must_use]
    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    /// Outer radius from the input file.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Fast-reject bounding box.
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(closed: bool) -> FootprintBoundary {
        let mut vertices = vec![(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)];
        if closed {
            vertices.push((-1.0, 1.0));
        }
        FootprintBoundary::new(vertices, 0.0, 0.0, BoundingBox::new(-2.0, 2.0, -2.0, 2.0))
            .unwrap()
    }

    #[test]
    fn test_square_interior() {
        let fp = square(true);
        assert!(fp.is_inside(0.5, 0.5));
        assert!(fp.is_inside(-0.9, -0.9));
        assert!(fp.is_inside(0.99, -0.2));
    }

    #[test]
    fn test_square_exterior_within_box() {
        let fp = square(true);
        assert!(!fp.is_inside(1.5, 0.0));
        assert!(!fp.is_inside(0.0, 1.5));
        assert!(!fp.is_inside(0.0, -1.5));
        assert!(!fp.is_inside(-1.5, 0.0));
    }

    #[test]
    fn test_square_with_tight_box_and_zero_radii() {
        let fp = FootprintBoundary::new(
            vec![(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)],
            0.0,
            0.0,
            BoundingBox::new(-1.0, 1.0, -1.0, 1.0),
        )
        .unwrap();

        assert!(fp.is_inside(0.0, 0.0));
        assert!(fp.is_inside(0.5, 0.5));
        assert!(fp.is_inside(-0.5, -0.75));
        assert!(fp.is_inside(1.0, 0.0));

        assert!(!fp.is_inside(1.5, 0.0));
        assert!(!fp.is_inside(-1.5, 0.0));
        assert!(!fp.is_inside(0.0, 1.01));
        assert!(!fp.is_inside(0.0, -1.01));
    }

    #[test]
    fn test_open_chain_skips_closing_edge() {
        // Without the repeated first vertex the left side is never tested.
        let fp = square(false);
        assert!(fp.is_inside(-1.5, 0.0));
        assert!(!fp.is_inside(1.5, 0.0));
    }

    #[test]
    fn test_min_radius_overrides_polygon() {
        let fp = FootprintBoundary::new(
            vec![(10.0, 11.0), (11.0, 11.0), (11.0, 10.0)],
            2.0,
            20.0,
            BoundingBox::new(10.0, 11.0, 10.0, 11.0),
        )
        .unwrap();
        assert!(fp.is_inside(0.0, 0.0));
        assert!(fp.is_inside(-0.6, 0.8));
        assert!(fp.is_inside(0.0, -1.99));
        assert!(fp.is_inside(2.0, 0.0));
        assert!(!fp.is_inside(2.01, 0.0));
    }

    #[test]
    fn test_bounding_box_rejects() {
        let fp = square(true);
        assert!(!fp.is_inside(2.5, 0.0));
        assert!(!fp.is_inside(0.0, -2.5));
    }

    #[test]
    fn test_malformed_boundaries() {
        let bounds = BoundingBox::new(-1.0, 1.0, -1.0, 1.0);
        assert!(matches!(
            FootprintBoundary::new(vec![(0.0, 0.0)], 0.0, 1.0, bounds),
            Err(Error::MalformedBoundary(_))
        ));
        assert!(matches!(
            FootprintBoundary::new(vec![(0.0, 0.0), (1.0, 0.0)], f64::NAN, 1.0, bounds),
            Err(Error::MalformedBoundary(_))
        ));
        assert!(matches!(
            FootprintBoundary::new(
                vec![(0.0, 0.0), (1.0, 0.0)],
                0.0,
                f64::INFINITY,
                bounds
            ),
            Err(Error::MalformedBoundary(_))
        ));
        assert!(matches!(
            FootprintBoundary::new(
                vec![(0.0, 0.0), (1.0, 0.0)],
                0.0,
                1.0,
                BoundingBox::new(1.0, -1.0, -1.0, 1.0)
            ),
            Err(Error::MalformedBoundary(_))
        ));
    }
}

//! Spatial indexing for nearest-bin lookup.
//!
//! Bin centroids are fixed for a run, so the index is a 2-D k-d tree built
//! once with median splits and then queried read-only from any thread.

use mockifu_core::BinGeometry;
use std::cmp::Ordering;

/// A balanced 2-D k-d tree over bin centroids.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array (the bin id).
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split dimension (0 = x, 1 = y).
    split_dim: usize,
}

#[derive(Debug, Clone, Copy)]
struct Best {
    index: usize,
    dist_sq: f64,
}

impl KdTree {
    /// Builds a tree from a list of points. Returns `None` if `points` is
    /// empty.
    #[must_use]
    pub fn build(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self::from_points(points.to_vec()))
    }

    /// Builds a tree over the centroids of `geometry`; point `i` is bin `i`.
    #[must_use]
    pub fn from_geometry(geometry: &BinGeometry) -> Self {
        Self::from_points(geometry.centroids())
    }

    fn from_points(points: Vec<(f64, f64)>) -> Self {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        Self::build_recursive(&points, &mut indices, 0, &mut nodes);
        Self { nodes, points }
    }

    fn build_recursive(
        points: &[(f64, f64)],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 2;
        indices.sort_by(|&a, &b| {
            coord(points[a], split_dim)
                .total_cmp(&coord(points[b], split_dim))
                .then(a.cmp(&b))
        });

        let median = indices.len() / 2;
        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx: indices[median],
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);
        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    /// Id of the point closest to `(x, y)`.
    ///
    /// Equidistant points resolve to the lowest id. Returns `None` for an
    /// empty tree or a non-finite query.
    #[must_use]
    pub fn nearest(&self, x: f64, y: f64) -> Option<usize> {
        if self.nodes.is_empty() || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let mut best = Best {
            index: usize::MAX,
            dist_sq: f64::INFINITY,
        };
        self.nearest_recursive(0, (x, y), &mut best);
        Some(best.index)
    }

    fn nearest_recursive(&self, node_idx: usize, query: (f64, f64), best: &mut Best) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        let dist_sq = distance_squared(query, point);
        let closer = match dist_sq.total_cmp(&best.dist_sq) {
            Ordering::Less => true,
            Ordering::Equal => node.point_idx < best.index,
            Ordering::Greater => false,
        };
        if closer {
            *best = Best {
                index: node.point_idx,
                dist_sq,
            };
        }

        let diff = coord(query, node.split_dim) - coord(point, node.split_dim);
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(first_idx) = first {
            self.nearest_recursive(first_idx, query, best);
        }
        // `<=` keeps equidistant candidates across the plane reachable.
        if let Some(second_idx) = second {
            if diff * diff <= best.dist_sq {
                self.nearest_recursive(second_idx, query, best);
            }
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the tree holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point by id.
    #[must_use]
    pub fn point(&self, idx: usize) -> Option<(f64, f64)> {
        self.points.get(idx).copied()
    }
}

#[inline]
fn coord(p: (f64, f64), dim: usize) -> f64 {
    if dim == 0 {
        p.0
    } else {
        p.1
    }
}

#[inline]
fn distance_squared(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockifu_core::SpatialBin;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn brute_force(points: &[(f64, f64)], query: (f64, f64)) -> usize {
        let mut best = 0;
        for (i, &p) in points.iter().enumerate() {
            if distance_squared(query, p) < distance_squared(query, points[best]) {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_build_empty() {
        assert!(KdTree::build(&[]).is_none());
    }

    #[test]
    fn test_nearest_basic() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.5, 0.5)];
        let tree = KdTree::build(&points).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.nearest(0.45, 0.55), Some(4));
        assert_eq!(tree.nearest(0.9, 0.05), Some(1));
        assert_eq!(tree.nearest(-3.0, 4.0), Some(2));
    }

    #[test]
    fn test_single_bin_always_wins() {
        let geometry = BinGeometry::new(vec![SpatialBin::new(0, 3.0, -2.0, 1.0, true)]).unwrap();
        let tree = KdTree::from_geometry(&geometry);
        for &(x, y) in &[(0.0, 0.0), (100.0, -50.0), (3.0, -2.0), (-1e6, 1e6)] {
            assert_eq!(tree.nearest(x, y), Some(0));
        }
    }

    #[test]
    fn test_ties_resolve_to_lowest_id() {
        // Query at the centre is equidistant from all four corners.
        let points = vec![(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
        let tree = KdTree::build(&points).unwrap();
        assert_eq!(tree.nearest(0.0, 0.0), Some(0));

        let duplicated = vec![(2.0, 2.0), (0.0, 0.0), (0.0, 0.0), (0.0, 0.0)];
        let tree = KdTree::build(&duplicated).unwrap();
        assert_eq!(tree.nearest(0.1, 0.1), Some(1));
    }

    #[test]
    fn test_non_finite_query() {
        let tree = KdTree::build(&[(0.0, 0.0)]).unwrap();
        assert_eq!(tree.nearest(f64::NAN, 0.0), None);
        assert_eq!(tree.nearest(0.0, f64::INFINITY), None);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let points: Vec<(f64, f64)> = (0..300)
            .map(|_| (rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)))
            .collect();
        let tree = KdTree::build(&points).unwrap();

        for _ in 0..2000 {
            let query = (rng.gen_range(-25.0..25.0), rng.gen_range(-25.0..25.0));
            assert_eq!(tree.nearest(query.0, query.1), Some(brute_force(&points, query)));
        }
    }
}

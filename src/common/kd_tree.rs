//! A thin wrapper over the kiddo KD tree, keeping the index/distance call
//! shapes used throughout the crate in one place. Distances returned from
//! this module are true euclidean distances, not the squared values kiddo
//! works with internally.

use crate::Point3;
use kiddo::SquaredEuclidean;
use kiddo::float::kdtree::KdTree;
use std::num::NonZero;

pub struct KdTree3 {
    tree: KdTree<f64, usize, 3, 32, u32>,
}

impl KdTree3 {
    /// Build a tree over a slice of points. Entries are identified by their
    /// index in the slice.
    pub fn new(points: &[Point3]) -> Self {
        let mut tree = KdTree::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            tree.add(&[p.x, p.y, p.z], i);
        }
        Self { tree }
    }

    /// The index and distance of the single closest entry to the query point.
    pub fn nearest_one(&self, point: &Point3) -> (usize, f64) {
        let r = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[point.x, point.y, point.z]);
        (r.item, r.distance.sqrt())
    }

    /// The indices and distances of the `n` closest entries to the query
    /// point, closest first.
    pub fn nearest(&self, point: &Point3, n: NonZero<usize>) -> Vec<(usize, f64)> {
        self.tree
            .nearest_n::<SquaredEuclidean>(&[point.x, point.y, point.z], n.get())
            .into_iter()
            .map(|r| (r.item, r.distance.sqrt()))
            .collect()
    }

    /// All entries within `radius` of the query point, in no particular
    /// order.
    pub fn within(&self, point: &Point3, radius: f64) -> Vec<(usize, f64)> {
        self.tree
            .within_unsorted::<SquaredEuclidean>(&[point.x, point.y, point.z], radius * radius)
            .into_iter()
            .map(|r| (r.item, r.distance.sqrt()))
            .collect()
    }
}

use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use std::num::NonZero;
use tabletop_core::PointCloud;

/// Immutable KD-tree over the positions of a point cloud.
///
/// Backed by kiddo's `ImmutableKdTree`; items are `u32` indices into the
/// source cloud, so query results can be fed straight into
/// [`PointCloud::select`].
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f32, u32, 3, 32>,
    num_points: usize,
}

impl KdTree {
    pub fn build(cloud: &PointCloud) -> Self {
        Self::from_points(&cloud.points())
    }

    pub fn from_points(points: &[[f32; 3]]) -> Self {
        Self {
            tree: ImmutableKdTree::new_from_slice(points),
            num_points: points.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    /// Find the `k` nearest neighbours to `query`.
    ///
    /// Returns `(indices, distances)` where distances are Euclidean (not
    /// squared), sorted ascending. Empty when `k == 0`, the tree is empty, or
    /// the query is not finite.
    pub fn knn(&self, query: &[f32; 3], k: usize) -> (Vec<usize>, Vec<f32>) {
        let Some(nz_k) = self.checked_k(query, k) else {
            return (Vec::new(), Vec::new());
        };

        self.tree
            .nearest_n::<SquaredEuclidean>(query, nz_k)
            .into_iter()
            .map(|nn| (nn.item as usize, nn.distance.sqrt()))
            .unzip()
    }

    /// Find the `k` nearest neighbours to `query`, returning only indices.
    pub fn knn_indices(&self, query: &[f32; 3], k: usize) -> Vec<usize> {
        let Some(nz_k) = self.checked_k(query, k) else {
            return Vec::new();
        };

        self.tree
            .nearest_n::<SquaredEuclidean>(query, nz_k)
            .iter()
            .map(|nn| nn.item as usize)
            .collect()
    }

    /// Find all points within `radius` (Euclidean distance, inclusive) of
    /// `query`, sorted by index.
    pub fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if !self.radius_query_valid(query, radius) {
            return Vec::new();
        }

        let radius_sq = radius * radius;

        // kiddo's `within_unsorted` uses strict `<`; widen by an epsilon and
        // post-filter with `<=` so boundary points are kept.
        let query_radius_sq = radius_sq + f32::EPSILON * radius_sq.max(1.0);

        let mut indices: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(query, query_radius_sq)
            .into_iter()
            .filter(|nn| nn.distance <= radius_sq)
            .map(|nn| nn.item as usize)
            .collect();

        indices.sort_unstable();
        indices
    }

    /// Number of points within `radius` of `query`, the query point included
    /// when it belongs to the tree.
    pub fn radius_count(&self, query: &[f32; 3], radius: f32) -> usize {
        self.radius_search(query, radius).len()
    }

    /// Hybrid search: at most `max_nn` nearest neighbours that also lie within
    /// `radius`, nearest first.
    pub fn hybrid_search(&self, query: &[f32; 3], radius: f32, max_nn: usize) -> Vec<usize> {
        if !self.radius_query_valid(query, radius) {
            return Vec::new();
        }
        let Some(nz_k) = NonZero::new(max_nn) else {
            return Vec::new();
        };

        let radius_sq = radius * radius;
        self.tree
            .nearest_n::<SquaredEuclidean>(query, nz_k)
            .into_iter()
            .take_while(|nn| nn.distance <= radius_sq)
            .map(|nn| nn.item as usize)
            .collect()
    }

    fn checked_k(&self, query: &[f32; 3], k: usize) -> Option<NonZero<usize>> {
        if self.is_empty() || !query.iter().all(|v| v.is_finite()) {
            return None;
        }
        NonZero::new(k)
    }

    fn radius_query_valid(&self, query: &[f32; 3], radius: f32) -> bool {
        !self.is_empty()
            && radius > 0.0
            && radius.is_finite()
            && query.iter().all(|v| v.is_finite())
    }
}

use std::collections::VecDeque;

use rayon::prelude::*;
use tabletop_core::PointCloud;
use tabletop_spatial::KdTree;

/// Label of a point that belongs to no cluster.
pub const NOISE: i32 = -1;

/// Per-point cluster ids: [`NOISE`] or a dense id in `0..num_clusters`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterLabels {
    labels: Vec<i32>,
    num_clusters: usize,
}

impl ClusterLabels {
    pub fn as_slice(&self) -> &[i32] {
        &self.labels
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Point indices of every cluster, ascending, indexed by cluster id.
    pub fn cluster_indices(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.num_clusters];
        for (i, &label) in self.labels.iter().enumerate() {
            if label != NOISE {
                clusters[label as usize].push(i);
            }
        }
        clusters
    }
}

/// Density-based clustering (DBSCAN).
///
/// A point is *core* when at least `min_points` points, itself included, lie
/// within `eps` of it. Core points within `eps` of each other share a
/// cluster; non-core points within `eps` of a core point join the first
/// cluster that reaches them; all other points are noise. Cluster ids are
/// assigned in order of the lowest-index core point of each cluster.
///
/// `eps <= 0` (or non-finite) or `min_points == 0` labels everything noise.
pub fn dbscan(cloud: &PointCloud, eps: f32, min_points: usize) -> ClusterLabels {
    let n = cloud.len();
    let mut labels = vec![NOISE; n];

    if n == 0 || !(eps.is_finite() && eps > 0.0) || min_points == 0 {
        return ClusterLabels {
            labels,
            num_clusters: 0,
        };
    }

    let points = cloud.points();
    let tree = KdTree::from_points(&points);
    let neighbours: Vec<Vec<usize>> = points
        .par_iter()
        .map(|p| tree.radius_search(p, eps))
        .collect();
    let is_core = |i: usize| neighbours[i].len() >= min_points;

    let mut visited = vec![false; n];
    let mut next_id: i32 = 0;

    for seed in 0..n {
        if visited[seed] || !is_core(seed) {
            continue;
        }

        let id = next_id;
        next_id += 1;

        let mut queue = VecDeque::new();
        queue.push_back(seed);
        visited[seed] = true;
        labels[seed] = id;

        while let Some(current) = queue.pop_front() {
            for &nb in &neighbours[current] {
                if labels[nb] == NOISE {
                    labels[nb] = id;
                }
                if !visited[nb] && is_core(nb) {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
    }

    log::debug!(
        "DBSCAN eps={} min_points={}: {} clusters over {} points",
        eps,
        min_points,
        next_id,
        n
    );

    ClusterLabels {
        labels,
        num_clusters: next_id as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn line(start: [f32; 3], count: usize, step: f32) -> Vec<[f32; 3]> {
        (0..count)
            .map(|i| [start[0] + i as f32 * step, start[1], start[2]])
            .collect()
    }

    #[test]
    fn two_separated_clusters() {
        let mut points = line([0.0; 3], 5, 0.1);
        points.extend(line([100.0; 3], 5, 0.1));
        let labels = dbscan(&PointCloud::from_points(&points), 0.15, 3);

        assert_eq!(labels.num_clusters(), 2);
        assert_eq!(labels.as_slice(), &[0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn isolated_points_are_noise() {
        let mut points = line([0.0; 3], 6, 0.1);
        points.push([50.0, 0.0, 0.0]);
        let labels = dbscan(&PointCloud::from_points(&points), 0.15, 3);
        assert_eq!(labels.num_clusters(), 1);
        assert_eq!(labels.as_slice()[6], NOISE);
        assert_eq!(labels.noise_count(), 1);
    }

    #[test]
    fn min_points_counts_the_point_itself() {
        // each point sees itself and one neighbour
        let points = vec![[0.0; 3], [0.1, 0.0, 0.0]];
        let cloud = PointCloud::from_points(&points);
        assert_eq!(dbscan(&cloud, 0.15, 2).num_clusters(), 1);
        assert_eq!(dbscan(&cloud, 0.15, 3).num_clusters(), 0);
    }

    #[test]
    fn border_point_joins_cluster() {
        // a dense run plus one point reachable only from the run's end
        let mut points = line([0.0; 3], 5, 0.1);
        points.push([0.55, 0.0, 0.0]);
        let labels = dbscan(&PointCloud::from_points(&points), 0.15, 3);
        assert_eq!(labels.as_slice()[5], 0);
    }

    #[test]
    fn ids_follow_lowest_core_index() {
        let mut points = line([10.0, 0.0, 0.0], 4, 0.1);
        points.extend(line([0.0; 3], 4, 0.1));
        let labels = dbscan(&PointCloud::from_points(&points), 0.15, 2);
        assert_eq!(labels.as_slice()[0], 0);
        assert_eq!(labels.as_slice()[4], 1);
    }

    #[test]
    fn degenerate_parameters_label_everything_noise() {
        let cloud = PointCloud::from_points(&line([0.0; 3], 4, 0.1));
        for labels in [
            dbscan(&cloud, 0.0, 2),
            dbscan(&cloud, f32::NAN, 2),
            dbscan(&cloud, 0.5, 0),
        ] {
            assert_eq!(labels.num_clusters(), 0);
            assert_eq!(labels.noise_count(), 4);
        }
    }

    #[test]
    fn empty_cloud() {
        let labels = dbscan(&PointCloud::new(), 0.1, 3);
        assert!(labels.is_empty());
        assert!(labels.cluster_indices().is_empty());
    }

    proptest! {
        #[test]
        fn labels_partition_the_cloud(
            pts in prop::collection::vec(
                (-5.0f32..5.0, -5.0f32..5.0, -5.0f32..5.0),
                1..200
            ),
            eps in 0.2f32..2.0,
            min_points in 1usize..6,
        ) {
            let points: Vec<[f32; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let labels = dbscan(&PointCloud::from_points(&points), eps, min_points);

            prop_assert_eq!(labels.len(), points.len());
            let clusters = labels.cluster_indices();
            let mut seen = HashSet::new();
            for cluster in &clusters {
                prop_assert!(!cluster.is_empty(), "cluster ids must be dense");
                for &i in cluster {
                    prop_assert!(seen.insert(i), "index {} in two clusters", i);
                }
            }
            prop_assert_eq!(seen.len() + labels.noise_count(), points.len());
            for &l in labels.as_slice() {
                prop_assert!(l == NOISE || (l >= 0 && (l as usize) < labels.num_clusters()));
            }
        }
    }
}

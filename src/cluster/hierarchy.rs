use anyhow::Result;
use rstar::RTree;

use crate::cluster::{ClusterParams, tree::CondensedTree};

/// An edge of the mutual-reachability minimum spanning tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

/// A merge in the single-linkage hierarchy. Nodes `0..n` are the points,
/// node `n + i` is the `i`th merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

/// HDBSCAN over planar points.
///
/// Returns one label per point: `Some(cluster)` with clusters numbered from 0
/// in order of their birth in the hierarchy, or `None` for noise. Fully
/// deterministic: ties are broken by point index.
pub fn hdbscan(points: &[[f64; 2]], params: &ClusterParams) -> Result<Vec<Option<usize>>> {
    params.validate()?;
    if points.is_empty() { return Ok(Vec::new()) }

    let core = core_distances(points, params.min_samples);
    let mst = mutual_reachability_mst(points, &core);
    let hierarchy = single_linkage(points.len(), mst);
    let tree = CondensedTree::new(points.len(), &hierarchy, params.min_cluster_size);
    Ok(tree.labels(params.cluster_selection_epsilon_m))
}

#[inline]
fn distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Distance from each point to its `min_samples`-th nearest neighbour,
/// counting the point itself.
pub(super) fn core_distances(points: &[[f64; 2]], min_samples: usize) -> Vec<f64> {
    let rtree = RTree::bulk_load(points.to_vec());
    let k = min_samples.clamp(1, points.len());
    points.iter()
        .map(|point| rtree.nearest_neighbor_iter_with_distance_2(point)
            .nth(k - 1)
            .map(|(_, distance_2)| distance_2.sqrt())
            .unwrap_or(0.0))
        .collect()
}

/// Prim's algorithm over the complete mutual-reachability graph,
/// `max(core(a), core(b), d(a, b))`. Quadratic time, linear memory.
pub(super) fn mutual_reachability_mst(points: &[[f64; 2]], core: &[f64]) -> Vec<Edge> {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut source = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[current] = true;
    for _ in 1..n {
        let mut next = None;
        for j in 0..n {
            if in_tree[j] { continue }
            let reach = distance(&points[current], &points[j]).max(core[current]).max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                source[j] = current;
            }
            if next.is_none_or(|k: usize| best[j] < best[k]) {
                next = Some(j);
            }
        }
        let Some(next) = next else { break };
        in_tree[next] = true;
        edges.push(Edge { a: source[next], b: next, weight: best[next] });
        current = next;
    }
    edges
}

/// Build the single-linkage merge hierarchy from spanning-tree edges.
pub(super) fn single_linkage(n: usize, mut edges: Vec<Edge>) -> Vec<Merge> {
    edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));

    let mut parent = (0..2 * n).collect::<Vec<usize>>();
    let mut size = vec![1usize; 2 * n];

    fn find(parent: &mut [usize], mut node: usize) -> usize {
        let mut root = node;
        while parent[root] != root { root = parent[root] }
        while parent[node] != root {
            let next = parent[node];
            parent[node] = root;
            node = next;
        }
        root
    }

    edges.into_iter().enumerate()
        .map(|(i, edge)| {
            let (left, right) = (find(&mut parent, edge.a), find(&mut parent, edge.b));
            let node = n + i;
            size[node] = size[left] + size[right];
            parent[left] = node;
            parent[right] = node;
            Merge { left, right, distance: edge.weight, size: size[node] }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `count` points on a regular grid with `spacing` metres, offset by `origin`.
    fn grid(origin: [f64; 2], count: usize, spacing: f64) -> Vec<[f64; 2]> {
        (0..count)
            .map(|i| [origin[0] + (i % 4) as f64 * spacing, origin[1] + (i / 4) as f64 * spacing])
            .collect()
    }

    fn params(min_cluster_size: usize, min_samples: usize, epsilon: f64) -> ClusterParams {
        ClusterParams { min_cluster_size, min_samples, cluster_selection_epsilon_m: epsilon }
    }

    #[test]
    fn core_distance_counts_the_point_itself() {
        let points = [[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]];
        assert_eq!(core_distances(&points, 1), vec![0.0, 0.0, 0.0]);
        assert_eq!(core_distances(&points, 2), vec![3.0, 3.0, 4.0]);
        // Capped at the number of points.
        assert_eq!(core_distances(&points, 10), core_distances(&points, 3));
    }

    #[test]
    fn spanning_tree_is_minimal() {
        let points = [[0.0, 0.0], [1.0, 0.0], [5.0, 0.0], [6.0, 0.0]];
        let core = core_distances(&points, 1);
        let mst = mutual_reachability_mst(&points, &core);
        assert_eq!(mst.len(), 3);
        let total = mst.iter().map(|edge| edge.weight).sum::<f64>();
        assert!((total - 6.0).abs() < 1e-12);
    }

    #[test]
    fn linkage_sizes_accumulate() {
        let points = [[0.0, 0.0], [1.0, 0.0], [5.0, 0.0], [6.0, 0.0]];
        let mst = mutual_reachability_mst(&points, &core_distances(&points, 1));
        let merges = single_linkage(points.len(), mst);
        assert_eq!(merges.iter().map(|m| m.size).collect::<Vec<_>>(), vec![2, 2, 4]);
        assert_eq!(merges[2].distance, 4.0);
    }

    #[test]
    fn tight_group_with_two_outliers_is_one_block() {
        let mut points = grid([0.0, 0.0], 10, 3.0);
        points.push([400.0, 250.0]);
        points.push([-380.0, -600.0]);

        let labels = hdbscan(&points, &params(8, 2, 10.0)).unwrap();
        assert!(labels[..10].iter().all(|label| *label == Some(0)));
        assert_eq!(labels[10], None);
        assert_eq!(labels[11], None);
    }

    #[test]
    fn group_spaced_wider_than_epsilon_is_still_one_block() {
        let mut points = grid([0.0, 0.0], 10, 12.0);
        points.push([1000.0, 800.0]);
        points.push([-900.0, -1200.0]);

        let labels = hdbscan(&points, &params(8, 2, 10.0)).unwrap();
        assert!(labels[..10].iter().all(|label| *label == Some(0)));
        assert_eq!(labels[10..], [None, None]);
    }

    #[test]
    fn separated_groups_become_separate_blocks() {
        let mut points = grid([0.0, 0.0], 12, 4.0);
        points.extend(grid([500.0, 0.0], 12, 4.0));
        points.push([250.0, 900.0]);

        let labels = hdbscan(&points, &params(8, 2, 10.0)).unwrap();
        let first = labels[0].unwrap();
        let second = labels[12].unwrap();
        assert_ne!(first, second);
        assert!(labels[..12].iter().all(|label| *label == Some(first)));
        assert!(labels[12..24].iter().all(|label| *label == Some(second)));
        assert_eq!(labels[24], None);
    }

    #[test]
    fn too_few_points_are_all_noise() {
        let points = grid([0.0, 0.0], 5, 2.0);
        let labels = hdbscan(&points, &params(8, 2, 10.0)).unwrap();
        assert!(labels.iter().all(Option::is_none));
        assert!(hdbscan(&[], &params(8, 2, 10.0)).unwrap().is_empty());
        assert_eq!(hdbscan(&[[1.0, 1.0]], &params(8, 2, 10.0)).unwrap(), vec![None]);
    }

    #[test]
    fn repeated_runs_agree() {
        let mut points = grid([0.0, 0.0], 16, 5.0);
        points.extend(grid([200.0, 40.0], 9, 6.0));
        points.extend([[90.0, 300.0], [-150.0, 10.0], [100.0, 100.0]]);
        let p = params(8, 2, 10.0);
        assert_eq!(hdbscan(&points, &p).unwrap(), hdbscan(&points, &p).unwrap());
    }

    #[test]
    fn duplicate_points_do_not_break_selection() {
        let mut points = vec![[0.0, 0.0]; 9];
        points.extend(vec![[300.0, 0.0]; 9]);
        let labels = hdbscan(&points, &params(8, 2, 10.0)).unwrap();
        assert!(labels[..9].iter().all(|label| label.is_some() && *label == labels[0]));
        assert!(labels[9..].iter().all(|label| label.is_some() && *label == labels[9]));
        assert_ne!(labels[0], labels[9]);
    }
}

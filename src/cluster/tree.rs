use std::collections::VecDeque;

use crate::cluster::hierarchy::Merge;

/// Upper bound on `1 / distance`; coincident points would otherwise give an
/// infinite lambda.
const MAX_LAMBDA: f64 = 1e12;

#[inline]
fn lambda(distance: f64) -> f64 {
    if distance > 0.0 { (1.0 / distance).min(MAX_LAMBDA) } else { MAX_LAMBDA }
}

/// A point leaving a cluster at density `lambda`.
#[derive(Debug, Clone, Copy)]
struct PointExit {
    cluster: usize,
    point: usize,
    lambda: f64,
}

/// A cluster of the condensed tree. Cluster 0 is the root.
#[derive(Debug, Clone)]
struct Cluster {
    parent: Option<usize>,
    children: Vec<usize>,
    /// Density at which the cluster split off its parent (0 for the root).
    birth: f64,
    stability: f64,
}

/// The single-linkage hierarchy condensed to clusters of at least
/// `min_cluster_size` points.
#[derive(Debug, Clone)]
pub(super) struct CondensedTree {
    num_points: usize,
    min_cluster_size: usize,
    clusters: Vec<Cluster>,
    exits: Vec<PointExit>,
}

impl CondensedTree {
    pub(super) fn new(num_points: usize, merges: &[Merge], min_cluster_size: usize) -> Self {
        let mut tree = Self {
            num_points,
            min_cluster_size,
            clusters: vec![Cluster { parent: None, children: Vec::new(), birth: 0.0, stability: 0.0 }],
            exits: Vec::new(),
        };
        if merges.is_empty() {
            tree.exits.extend((0..num_points).map(|point| PointExit { cluster: 0, point, lambda: 0.0 }));
            return tree;
        }

        let size_of = |node: usize| if node < num_points { 1 } else { merges[node - num_points].size };

        // Breadth-first over hierarchy nodes that still carry a cluster.
        let root = num_points + merges.len() - 1;
        let mut queue = VecDeque::from([(root, 0usize)]);
        while let Some((node, cluster)) = queue.pop_front() {
            if node < num_points {
                tree.exits.push(PointExit { cluster, point: node, lambda: MAX_LAMBDA });
                continue;
            }
            let merge = merges[node - num_points];
            let lambda = lambda(merge.distance);
            let (left_big, right_big) = (
                size_of(merge.left) >= min_cluster_size,
                size_of(merge.right) >= min_cluster_size,
            );

            match (left_big, right_big) {
                (true, true) => for child in [merge.left, merge.right] {
                    let id = tree.clusters.len();
                    tree.clusters.push(Cluster { parent: Some(cluster), children: Vec::new(), birth: lambda, stability: 0.0 });
                    tree.clusters[cluster].children.push(id);
                    queue.push_back((child, id));
                },
                (true, false) => {
                    tree.fall_out(merge.right, cluster, lambda, merges);
                    queue.push_back((merge.left, cluster));
                }
                (false, true) => {
                    tree.fall_out(merge.left, cluster, lambda, merges);
                    queue.push_back((merge.right, cluster));
                }
                (false, false) => {
                    tree.fall_out(merge.left, cluster, lambda, merges);
                    tree.fall_out(merge.right, cluster, lambda, merges);
                }
            }
        }

        tree.compute_stability();
        tree
    }

    /// Every point under `node` leaves `cluster` at `lambda`.
    fn fall_out(&mut self, node: usize, cluster: usize, lambda: f64, merges: &[Merge]) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            if node < self.num_points {
                self.exits.push(PointExit { cluster, point: node, lambda });
            } else {
                let merge = merges[node - self.num_points];
                stack.extend([merge.left, merge.right]);
            }
        }
    }

    /// Excess of mass: every point and child cluster contributes the density
    /// range over which it stayed in the cluster.
    fn compute_stability(&mut self) {
        // Points passing through each cluster, accumulated bottom-up.
        let mut sizes = vec![0usize; self.clusters.len()];
        for exit in &self.exits {
            let cluster = &mut self.clusters[exit.cluster];
            cluster.stability += exit.lambda - cluster.birth;
            sizes[exit.cluster] += 1;
        }
        for id in (1..self.clusters.len()).rev() {
            let Some(parent) = self.clusters[id].parent else { continue };
            sizes[parent] += sizes[id];
            let contribution = (self.clusters[id].birth - self.clusters[parent].birth) * sizes[id] as f64;
            self.clusters[parent].stability += contribution;
        }
    }

    /// Clusters chosen by excess of mass, excluding the root. Children always
    /// have larger ids than their parents, so a reverse sweep is bottom-up.
    fn select_eom(&self) -> Vec<bool> {
        let mut selected = vec![true; self.clusters.len()];
        selected[0] = false;
        let mut stability = self.clusters.iter().map(|c| c.stability).collect::<Vec<_>>();

        for id in (1..self.clusters.len()).rev() {
            let subtree = self.clusters[id].children.iter().map(|&child| stability[child]).sum::<f64>();
            if subtree > stability[id] {
                selected[id] = false;
                stability[id] = subtree;
            } else {
                for descendant in self.descendants(id) {
                    selected[descendant] = false;
                }
            }
        }
        selected
    }

    /// Strict descendants of `cluster`.
    fn descendants(&self, cluster: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = self.clusters[cluster].children.clone();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.clusters[id].children.iter().copied());
        }
        out
    }

    /// Replace selected clusters born at a separation below `epsilon` with
    /// their nearest ancestor born above it (never the root).
    fn apply_epsilon(&self, selected: Vec<bool>, epsilon: f64) -> Vec<bool> {
        let mut chosen = vec![false; self.clusters.len()];
        let mut processed = vec![false; self.clusters.len()];

        for leaf in (1..self.clusters.len()).filter(|&id| selected[id]) {
            if processed[leaf] { continue }
            if 1.0 / self.clusters[leaf].birth >= epsilon {
                chosen[leaf] = true;
                continue;
            }
            let mut current = leaf;
            while let Some(parent) = self.clusters[current].parent.filter(|&p| p != 0) {
                current = parent;
                if 1.0 / self.clusters[parent].birth > epsilon { break }
            }
            chosen[current] = true;
            for descendant in self.descendants(current) {
                processed[descendant] = true;
            }
        }
        chosen
    }

    /// Flat labelling of every point. Clusters are numbered from 0 in order of
    /// birth; `None` marks noise.
    pub(super) fn labels(&self, epsilon: f64) -> Vec<Option<usize>> {
        let mut labels = vec![None; self.num_points];
        if self.clusters.len() == 1 {
            // No split ever produced two large clusters: the root is the only
            // block. Points still inside it when it dissolves are members, as
            // are points that left within epsilon; earlier departures are noise.
            if self.num_points >= self.min_cluster_size {
                let dissolve = self.exits.iter().map(|exit| exit.lambda).fold(0.0, f64::max);
                let threshold = if epsilon > 0.0 { dissolve.min(1.0 / epsilon) } else { dissolve };
                for exit in self.exits.iter().filter(|exit| exit.lambda >= threshold) {
                    labels[exit.point] = Some(0);
                }
            }
            return labels;
        }

        let mut selected = self.select_eom();
        if epsilon > 0.0 {
            selected = self.apply_epsilon(selected, epsilon);
        }

        // Selected ancestor of each cluster (itself included).
        let mut owner: Vec<Option<usize>> = vec![None; self.clusters.len()];
        for id in 1..self.clusters.len() {
            owner[id] = if selected[id] {
                Some(id)
            } else {
                self.clusters[id].parent.and_then(|parent| owner[parent])
            };
        }

        let numbering = {
            let mut numbering = vec![None; self.clusters.len()];
            for (label, id) in (0..self.clusters.len()).filter(|&id| selected[id]).enumerate() {
                numbering[id] = Some(label);
            }
            numbering
        };

        for exit in &self.exits {
            labels[exit.point] = owner[exit.cluster].and_then(|id| numbering[id]);
        }
        labels
    }
}

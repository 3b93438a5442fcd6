use ndarray::{ArrayView1, ArrayView2};

/// Smallest squared-error reduction that justifies a split.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf { value: f64 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

/// Depth-limited least-squares regression tree with Newton-step leaf values,
/// the weak learner of [`GradientBoostingClassifier`](super::GradientBoostingClassifier).
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RegressionTree {
    nodes: Vec<Node>,
}

/// Per-round training data: features, gradients (residuals) and hessians.
struct Targets<'a> {
    x: ArrayView2<'a, f64>,
    gradient: &'a [f64],
    hessian: &'a [f64],
}

impl RegressionTree {
    /// Fit to `gradient` over `rows` of `x`. Splits minimise squared error of
    /// the gradient; leaf values are `sum(gradient) / sum(hessian)`.
    pub(super) fn fit(
        x: ArrayView2<f64>,
        gradient: &[f64],
        hessian: &[f64],
        rows: &[usize],
        max_depth: usize,
        min_samples_leaf: usize,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let targets = Targets { x: x.view(), gradient, hessian };
        let mut rows = rows.to_vec();
        tree.grow(&targets, &mut rows, max_depth, min_samples_leaf);
        tree
    }

    fn grow(&mut self, targets: &Targets, rows: &mut [usize], depth: usize, min_leaf: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: leaf_value(targets, rows) });

        if depth == 0 || rows.len() < 2 * min_leaf { return id }
        let Some((feature, threshold)) = best_split(targets, rows, min_leaf) else { return id };

        // Partition rows in place: left part has x <= threshold.
        let mut boundary = 0;
        for i in 0..rows.len() {
            if targets.x[[rows[i], feature]] <= threshold {
                rows.swap(i, boundary);
                boundary += 1;
            }
        }
        let (left_rows, right_rows) = rows.split_at_mut(boundary);
        let left = self.grow(targets, left_rows, depth - 1, min_leaf);
        let right = self.grow(targets, right_rows, depth - 1, min_leaf);
        self.nodes[id] = Node::Split { feature, threshold, left, right };
        id
    }

    pub(super) fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        loop {
            match self.nodes[node] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    node = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    #[cfg(test)]
    pub(super) fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| matches!(node, Node::Leaf { .. })).count()
    }
}

fn leaf_value(targets: &Targets, rows: &[usize]) -> f64 {
    let numerator = rows.iter().map(|&r| targets.gradient[r]).sum::<f64>();
    let denominator = rows.iter().map(|&r| targets.hessian[r]).sum::<f64>();
    if denominator.abs() < 1e-150 { 0.0 } else { numerator / denominator }
}

/// Feature and threshold with the largest squared-error reduction, ties going
/// to the lowest feature index and smallest threshold.
fn best_split(targets: &Targets, rows: &[usize], min_leaf: usize) -> Option<(usize, f64)> {
    let n = rows.len();
    let total = rows.iter().map(|&r| targets.gradient[r]).sum::<f64>();
    let parent_score = total * total / n as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    let mut sorted = rows.to_vec();
    for feature in 0..targets.x.ncols() {
        sorted.sort_by(|&a, &b| targets.x[[a, feature]].total_cmp(&targets.x[[b, feature]]).then(a.cmp(&b)));

        let mut left_sum = 0.0;
        for i in 0..n - 1 {
            left_sum += targets.gradient[sorted[i]];
            let (n_left, n_right) = (i + 1, n - i - 1);
            if n_left < min_leaf || n_right < min_leaf { continue }

            let (here, next) = (targets.x[[sorted[i], feature]], targets.x[[sorted[i + 1], feature]]);
            if here >= next { continue }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64 - parent_score;
            if gain > MIN_GAIN && best.is_none_or(|(_, _, g)| gain > g) {
                best = Some((feature, here + (next - here) / 2.0, gain));
            }
        }
    }
    best.map(|(feature, threshold, _)| (feature, threshold))
}

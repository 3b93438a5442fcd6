use anyhow::{Result, ensure};
use ndarray::{ArrayView1, ArrayView2};

use super::{ClassifierParams, tree::RegressionTree};

/// Binary gradient-boosted trees under log-loss.
///
/// Starts from the training log-odds and adds `learning_rate`-scaled Newton
/// steps of depth-limited regression trees fitted to the residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostingClassifier {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

#[inline]
fn sigmoid(z: f64) -> f64 { 1.0 / (1.0 + (-z).exp()) }

impl GradientBoostingClassifier {
    /// Fit on the rows of `x` with binary targets `y`.
    ///
    /// A single-class training set yields a constant model that always
    /// predicts that class.
    pub fn fit(x: ArrayView2<f64>, y: &[bool], params: &ClassifierParams) -> Result<Self> {
        ensure!(x.nrows() > 0, "[classify::boosting] cannot fit on zero rows");
        ensure!(x.nrows() == y.len(),
            "[classify::boosting] {} feature rows but {} targets", x.nrows(), y.len());

        let n = y.len();
        let positives = y.iter().filter(|&&label| label).count();
        if positives == 0 || positives == n {
            let init = if positives == 0 { f64::NEG_INFINITY } else { f64::INFINITY };
            return Ok(Self { init, learning_rate: params.learning_rate, trees: Vec::new() });
        }

        let init = (positives as f64 / (n - positives) as f64).ln();
        let targets = y.iter().map(|&label| if label { 1.0 } else { 0.0 }).collect::<Vec<f64>>();
        let rows = (0..n).collect::<Vec<_>>();
        let mut raw = vec![init; n];
        let mut gradient = vec![0.0; n];
        let mut hessian = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                gradient[i] = targets[i] - p;
                hessian[i] = p * (1.0 - p);
            }

            let tree = RegressionTree::fit(x, &gradient, &hessian, &rows, params.max_depth, params.min_samples_leaf);
            for (i, row) in x.rows().into_iter().enumerate() {
                raw[i] += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self { init, learning_rate: params.learning_rate, trees })
    }

    /// Raw log-odds score of one row.
    fn decision(&self, row: ArrayView1<f64>) -> f64 {
        self.init + self.trees.iter().map(|tree| self.learning_rate * tree.predict(row)).sum::<f64>()
    }

    /// Probability of the positive class for every row.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Vec<f64> {
        x.rows().into_iter().map(|row| sigmoid(self.decision(row))).collect()
    }

    /// Positive iff the predicted probability exceeds one half.
    pub fn predict(&self, x: ArrayView2<f64>) -> Vec<bool> {
        self.predict_proba(x).into_iter().map(|p| p > 0.5).collect()
    }

    /// Share of rows whose prediction matches `y`; `None` for no rows.
    pub fn accuracy(&self, x: ArrayView2<f64>, y: &[bool]) -> Option<f64> {
        if y.is_empty() || x.nrows() != y.len() { return None }
        let correct = self.predict(x).into_iter().zip(y).filter(|(p, t)| p == *t).count();
        Some(correct as f64 / y.len() as f64)
    }

    #[inline] pub fn num_trees(&self) -> usize { self.trees.len() }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    use super::*;

    #[test]
    fn separates_a_threshold_concept() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = (0..40).map(|i| i >= 20).collect::<Vec<_>>();
        let model = GradientBoostingClassifier::fit(x.view(), &y, &ClassifierParams::default()).unwrap();

        assert_eq!(model.num_trees(), 100);
        assert_eq!(model.accuracy(x.view(), &y), Some(1.0));
        assert_eq!(model.predict(array![[3.0, 0.0], [35.0, 1.0]].view()), vec![false, true]);
    }

    #[test]
    fn single_class_training_is_constant() {
        let x = array![[1.0], [2.0]];
        let model = GradientBoostingClassifier::fit(x.view(), &[true, true], &ClassifierParams::default()).unwrap();
        assert_eq!(model.num_trees(), 0);
        assert_eq!(model.predict(array![[-100.0], [100.0]].view()), vec![true, true]);

        let model = GradientBoostingClassifier::fit(x.view(), &[false, false], &ClassifierParams::default()).unwrap();
        assert_eq!(model.predict_proba(array![[0.0]].view()), vec![0.0]);
    }

    #[test]
    fn balanced_start_is_even_odds() {
        let x = array![[0.0], [0.0]];
        let params = ClassifierParams { n_estimators: 1, ..ClassifierParams::default() };
        let model = GradientBoostingClassifier::fit(x.view(), &[true, false], &params).unwrap();
        assert_relative_eq!(model.predict_proba(x.view())[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_shapes() {
        let params = ClassifierParams::default();
        assert!(GradientBoostingClassifier::fit(Array2::<f64>::zeros((0, 3)).view(), &[], &params).is_err());
        assert!(GradientBoostingClassifier::fit(array![[1.0]].view(), &[true, false], &params).is_err());
    }
}

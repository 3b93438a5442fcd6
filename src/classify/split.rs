use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Shuffle `0..n` with a seeded generator and hold out `ceil(test_fraction * n)`
/// indices for testing, keeping at least one for training.
///
/// Returns `(train, test)`; the same `n`, fraction and seed always give the
/// same split.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices = (0..n).collect::<Vec<_>>();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_test = ((test_fraction * n as f64).ceil() as usize).min(n.saturating_sub(1));
    let train = indices.split_off(n_test);
    (train, indices)
}

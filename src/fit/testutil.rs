//! Seeded synthetic problems shared by the fitting tests.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::math::sigmoid;

/// `n` rows of `p` standard-normal features with a sparse logistic signal on
/// the first three columns.
pub(crate) fn synthetic_problem(n: usize, p: usize, seed: u64) -> (DMatrix<f64>, Vec<u8>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let truth = [1.5, -1.0, 0.8];
    let x = DMatrix::from_fn(n, p, |_, _| rng.sample::<f64, _>(StandardNormal));
    let y = (0..n)
        .map(|i| {
            let eta = -0.5
                + truth
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j < p)
                    .map(|(j, b)| b * x[(i, j)])
                    .sum::<f64>();
            u8::from(rng.r#gen::<f64>() < sigmoid(eta))
        })
        .collect();
    (x, y)
}

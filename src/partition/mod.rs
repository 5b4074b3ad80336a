//! Stratified train/test splitting and cross-validation fold assignment.
//!
//! Both operations take an explicit seed and build their own `StdRng`, so
//! repeated or concurrent calls never interfere with each other. Classes are
//! always processed in the order `good` then `bad`, which keeps the random
//! stream (and therefore the output) a pure function of `(y, params, seed)`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::domain::Label;

#[derive(Debug, Error, PartialEq)]
pub enum PartitionError {
    #[error("label vector is empty")]
    EmptyLabels,

    #[error("train fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),

    #[error("no rows labelled `{}`; both classes are required", .0.display_name())]
    MissingClass(Label),

    #[error(
        "class `{}` has {count} rows; a {fraction} split would leave one side empty",
        .label.display_name()
    )]
    DegenerateClass { label: Label, count: usize, fraction: f64 },

    #[error("at least 2 folds are required, got {0}")]
    TooFewFolds(usize),

    #[error("{rows} training rows cannot fill {folds} folds")]
    TooFewRows { rows: usize, folds: usize },

    #[error("fold {0} received no rows")]
    EmptyFold(usize),
}

/// Disjoint, sorted row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Fold id per training row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    k: usize,
    fold_of: Vec<usize>,
}

impl FoldAssignment {
    /// Number of folds.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of assigned rows.
    pub fn len(&self) -> usize {
        self.fold_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fold_of.is_empty()
    }

    /// Fold ids in row order.
    pub fn ids(&self) -> &[usize] {
        &self.fold_of
    }

    /// Rows held out in `fold`, ascending.
    pub fn holdout(&self, fold: usize) -> Vec<usize> {
        self.fold_of
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| (f == fold).then_some(i))
            .collect()
    }

    /// Rows used for fitting when `fold` is held out, ascending.
    pub fn complement(&self, fold: usize) -> Vec<usize> {
        self.fold_of
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| (f != fold).then_some(i))
            .collect()
    }
}

/// Stratified train/test split.
///
/// For each class with `n_c` rows, `ceil(train_fraction * n_c)` rows are drawn
/// for training without replacement; the remainder form the test set.
pub fn split(y: &[u8], train_fraction: f64, seed: u64) -> Result<Split, PartitionError> {
    if y.is_empty() {
        return Err(PartitionError::EmptyLabels);
    }
    if !(train_fraction.is_finite() && train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(PartitionError::InvalidFraction(train_fraction));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(y.len());

    for label in [Label::Good, Label::Bad] {
        let members = class_members(y, label);
        let count = members.len();
        if count == 0 {
            return Err(PartitionError::MissingClass(label));
        }
        // The small offset keeps products like 0.8 * 5 from rounding up past 4.
        let n_train = (train_fraction * count as f64 - 1e-9).ceil() as usize;
        if n_train == 0 || n_train >= count {
            return Err(PartitionError::DegenerateClass {
                label,
                count,
                fraction: train_fraction,
            });
        }
        train.extend(members.choose_multiple(&mut rng, n_train).copied());
    }

    train.sort_unstable();
    let mut in_train = vec![false; y.len()];
    for &i in &train {
        in_train[i] = true;
    }
    let test: Vec<usize> = (0..y.len()).filter(|&i| !in_train[i]).collect();

    debug!(train = train.len(), test = test.len(), seed, "stratified split");
    Ok(Split { train, test })
}

/// Stratified fold assignment over the training labels.
///
/// Within each class the fold sequence `0..k` is repeated `n_c / k` times,
/// padded with `n_c % k` distinct random folds and shuffled, so per-fold class
/// counts differ by at most one.
pub fn assign_folds(y_train: &[u8], k: usize, seed: u64) -> Result<FoldAssignment, PartitionError> {
    if k < 2 {
        return Err(PartitionError::TooFewFolds(k));
    }
    if y_train.len() < k {
        return Err(PartitionError::TooFewRows {
            rows: y_train.len(),
            folds: k,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut fold_of = vec![0usize; y_train.len()];
    let all_folds: Vec<usize> = (0..k).collect();

    for label in [Label::Good, Label::Bad] {
        let members = class_members(y_train, label);
        let count = members.len();
        if count == 0 {
            continue;
        }

        let reps = count / k;
        let spares = count % k;
        let mut sequence: Vec<usize> = if reps > 0 {
            let mut seq: Vec<usize> = (0..reps).flat_map(|_| 0..k).collect();
            seq.extend(all_folds.choose_multiple(&mut rng, spares).copied());
            seq
        } else {
            all_folds.choose_multiple(&mut rng, count).copied().collect()
        };
        sequence.shuffle(&mut rng);

        for (&row, fold) in members.iter().zip(sequence) {
            fold_of[row] = fold;
        }
    }

    let mut sizes = vec![0usize; k];
    for &f in &fold_of {
        sizes[f] += 1;
    }
    if let Some(empty) = sizes.iter().position(|&s| s == 0) {
        return Err(PartitionError::EmptyFold(empty));
    }

    debug!(folds = k, rows = y_train.len(), seed, "stratified fold assignment");
    Ok(FoldAssignment { k, fold_of })
}

fn class_members(y: &[u8], label: Label) -> Vec<usize> {
    let target = label.indicator();
    y.iter()
        .enumerate()
        .filter_map(|(i, &v)| (v == target).then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(n_good: usize, n_bad: usize) -> Vec<u8> {
        // Interleave so class membership is not contiguous.
        let mut y = Vec::with_capacity(n_good + n_bad);
        let (mut g, mut b) = (n_good, n_bad);
        while g > 0 || b > 0 {
            if g > 0 {
                y.push(0);
                g -= 1;
            }
            if b > 0 {
                y.push(1);
                b -= 1;
            }
        }
        y
    }

    #[test]
    fn split_is_stratified_with_ceiling_counts() {
        let y = labels(700, 300);
        let s = split(&y, 0.8, 42).unwrap();
        let bad_train = s.train.iter().filter(|&&i| y[i] == 1).count();
        let good_train = s.train.len() - bad_train;
        assert_eq!(good_train, 560);
        assert_eq!(bad_train, 240);
        assert_eq!(s.test.len(), 200);
    }

    #[test]
    fn split_rounds_partial_rows_up() {
        let y = labels(7, 3);
        let s = split(&y, 0.5, 1).unwrap();
        // ceil(3.5) good + ceil(1.5) bad
        assert_eq!(s.train.len(), 4 + 2);
    }

    #[test]
    fn split_rejects_degenerate_class() {
        let y = labels(10, 1);
        let err = split(&y, 0.8, 7).unwrap_err();
        assert_eq!(
            err,
            PartitionError::DegenerateClass {
                label: Label::Bad,
                count: 1,
                fraction: 0.8
            }
        );
    }

    #[test]
    fn split_rejects_bad_inputs() {
        assert_eq!(split(&[], 0.8, 1).unwrap_err(), PartitionError::EmptyLabels);
        assert_eq!(split(&[0, 1], 1.0, 1).unwrap_err(), PartitionError::InvalidFraction(1.0));
        assert_eq!(
            split(&[0, 0, 0], 0.5, 1).unwrap_err(),
            PartitionError::MissingClass(Label::Bad)
        );
    }

    #[test]
    fn different_seeds_give_different_splits() {
        let y = labels(100, 50);
        let a = split(&y, 0.8, 1).unwrap();
        let b = split(&y, 0.8, 2).unwrap();
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn fold_counts_per_class_are_balanced() {
        let y = labels(563, 237);
        let folds = assign_folds(&y, 10, 99).unwrap();
        assert_eq!(folds.k(), 10);
        assert_eq!(folds.len(), y.len());
        for f in 0..10 {
            let held = folds.holdout(f);
            let bad = held.iter().filter(|&&i| y[i] == 1).count();
            let good = held.len() - bad;
            assert!((56..=57).contains(&good), "fold {f}: {good} good");
            assert!((23..=24).contains(&bad), "fold {f}: {bad} bad");
        }
    }

    #[test]
    fn holdout_and_complement_partition_rows() {
        let y = labels(30, 12);
        let folds = assign_folds(&y, 5, 3).unwrap();
        for f in 0..5 {
            let mut all = folds.holdout(f);
            all.extend(folds.complement(f));
            all.sort_unstable();
            assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn fold_errors() {
        assert_eq!(assign_folds(&[0, 1, 0], 1, 0).unwrap_err(), PartitionError::TooFewFolds(1));
        assert_eq!(
            assign_folds(&[0, 1, 0], 10, 0).unwrap_err(),
            PartitionError::TooFewRows { rows: 3, folds: 10 }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_split_deterministic_disjoint_complete(
            n_good in 5usize..200,
            n_bad in 5usize..200,
            seed in any::<u64>(),
        ) {
            let y = labels(n_good, n_bad);
            let a = split(&y, 0.8, seed).unwrap();
            let b = split(&y, 0.8, seed).unwrap();
            prop_assert_eq!(&a, &b);

            let mut seen = vec![0u8; y.len()];
            for &i in a.train.iter().chain(a.test.iter()) {
                seen[i] += 1;
            }
            prop_assert!(seen.iter().all(|&c| c == 1));
        }

        #[test]
        fn prop_every_row_gets_one_valid_fold(
            n_good in 30usize..300,
            n_bad in 30usize..300,
            seed in any::<u64>(),
        ) {
            let y = labels(n_good, n_bad);
            let folds = assign_folds(&y, 10, seed).unwrap();
            prop_assert_eq!(folds.ids().len(), y.len());
            prop_assert!(folds.ids().iter().all(|&f| f < 10));

            let overall = n_bad as f64 / y.len() as f64;
            for f in 0..10 {
                let held = folds.holdout(f);
                let bad = held.iter().filter(|&&i| y[i] == 1).count();
                // Per-class counts are within one of an even share.
                prop_assert!((bad as f64 - n_bad as f64 / 10.0).abs() < 1.0 + 1e-9);
                let frac = bad as f64 / held.len() as f64;
                prop_assert!((frac - overall).abs() < 0.2);
            }

            let again = assign_folds(&y, 10, seed).unwrap();
            prop_assert_eq!(folds, again);
        }
    }
}

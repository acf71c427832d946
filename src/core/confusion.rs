use crate::prelude::*;

/// Square count matrix indexed `[real][pred]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Array2<u64>,
}

impl ConfusionMatrix {
    pub fn new(classes: usize) -> Self {
        Self {
            counts: Array2::zeros((classes, classes)),
        }
    }

    pub fn classes(&self) -> usize {
        self.counts.nrows()
    }

    /// # Panics
    ///
    /// If `real` or `pred` is not below `classes()`, as with ndarray indexing.
    /// `get` has the same contract.
    pub fn record(&mut self, real: usize, pred: usize) {
        self.counts[[real, pred]] += 1;
    }

    pub fn get(&self, real: usize, pred: usize) -> u64 {
        self.counts[[real, pred]]
    }

    pub fn counts(&self) -> ArrayView2<u64> {
        self.counts.view()
    }

    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let correct: u64 = self.counts.diag().sum();
        Some(correct as f64 / total as f64)
    }

    pub fn reset(&mut self) {
        self.counts.fill(0);
    }
}

/// Index of the largest value, first occurrence on ties.
///
/// NaN entries never win. Returns 0 for an empty or all-NaN input.
pub fn argmax<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i).unwrap_or(0)
}

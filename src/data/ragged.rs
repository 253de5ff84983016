use serde::{Deserialize, Serialize};

/// Rows of differing length stored flat, with `row_splits[i]..row_splits[i + 1]` marking row `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ragged<T> {
    values: Vec<T>,
    row_splits: Vec<usize>,
}

impl<T> Default for Ragged<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            row_splits: vec![0],
        }
    }
}

impl<T> Ragged<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
    {
        let mut ragged = Self::default();
        for row in rows {
            ragged.push_row(row);
        }
        ragged
    }

    pub fn push_row<R: IntoIterator<Item = T>>(&mut self, row: R) {
        self.values.extend(row);
        self.row_splits.push(self.values.len());
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.row_splits.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> Option<&[T]> {
        if i >= self.len() {
            return None;
        }
        Some(&self.values[self.row_splits[i]..self.row_splits[i + 1]])
    }

    pub fn row_lengths(&self) -> Vec<usize> {
        self.row_splits.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn row_splits(&self) -> &[usize] {
        &self.row_splits
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.row_splits
            .windows(2)
            .map(move |w| &self.values[w[0]..w[1]])
    }

    pub fn into_rows(self) -> Vec<Vec<T>> {
        let lengths = self.row_lengths();
        let mut values = self.values.into_iter();
        lengths
            .into_iter()
            .map(|n| values.by_ref().take(n).collect())
            .collect()
    }
}

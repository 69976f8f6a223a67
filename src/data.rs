//! Tabular input and train/test splitting.
//!
//! A [`Frame`] is a small named-column table. Training selects feature columns (`X`)
//! and a target column (`Y`) from it into a [`Dataset`], either splitting rows at random
//! or pairing it with an explicit test frame.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::{Error, Matrix, Result};

/// Default target column name.
pub const DEFAULT_TARGET: &str = "Y";

/// Named `f32` columns of equal length, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<f32>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a column. Its length must match the existing columns.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f32>) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f32>) -> Result<()> {
        let name = name.into();
        let pos = self.position(&name);
        let other_len = self
            .columns
            .iter()
            .enumerate()
            .find(|(i, _)| Some(*i) != pos)
            .map(|(_, c)| c.len());
        if let Some(len) = other_len {
            if values.len() != len {
                return Err(Error::InvalidData(format!(
                    "column {name:?} has {} rows, frame has {len}",
                    values.len()
                )));
            }
        }

        match pos {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Result<&[f32]> {
        self.position(name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| Error::InvalidData(format!("unknown column {name:?}")))
    }

    /// Feature matrix with one column per name, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Matrix> {
        let cols = names
            .iter()
            .map(|n| self.column(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let rows = self.len();
        let mut data = Vec::with_capacity(rows * cols.len());
        for r in 0..rows {
            data.extend(cols.iter().map(|c| c[r]));
        }
        Matrix::from_vec(rows, cols.len(), data)
    }

    /// Features `x` and target `y` as a [`Dataset`].
    pub fn dataset<S: AsRef<str>>(&self, x: &[S], y: &str) -> Result<Dataset> {
        let features = self.select(x)?;
        let targets = self.column(y)?.to_vec();
        Dataset::new(features, targets)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Feature rows and one target per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix,
    targets: Vec<f32>,
}

impl Dataset {
    pub fn new(features: Matrix, targets: Vec<f32>) -> Result<Self> {
        if features.rows() != targets.len() {
            return Err(Error::InvalidData(format!(
                "features have {} rows, targets have {}",
                features.rows(),
                targets.len()
            )));
        }
        Ok(Self { features, targets })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.features.cols()
    }

    #[inline]
    pub fn features(&self) -> &Matrix {
        &self.features
    }

    #[inline]
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    /// The `idx`-th example as a `1 x input_dim` matrix and its target.
    ///
    /// Panics if `idx >= len`.
    pub fn example(&self, idx: usize) -> (Matrix, f32) {
        (self.features.row_matrix(idx), self.targets[idx])
    }

    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select_rows(indices),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}

/// Train and test sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
    /// Source row indices of `train` when the split was sampled.
    pub train_index: Vec<usize>,
    /// Source row indices of `test` when the split was sampled.
    pub test_index: Vec<usize>,
}

/// Sample `floor(len * training_size)` rows for training; the rest become the test set.
///
/// Both index lists are sorted; together they cover every row exactly once.
pub fn train_test_split<S: AsRef<str>>(
    frame: &Frame,
    x: &[S],
    y: &str,
    training_size: f32,
    seed: Option<u64>,
) -> Result<Split> {
    if !(training_size.is_finite() && training_size > 0.0 && training_size <= 1.0) {
        return Err(Error::InvalidConfig(format!(
            "training_size must be in (0, 1], got {training_size}"
        )));
    }
    let data = frame.dataset(x, y)?;
    let n = data.len();
    let n_train = ((n as f64) * f64::from(training_size)).floor() as usize;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut train_index = index::sample(&mut rng, n, n_train.min(n)).into_vec();
    train_index.sort_unstable();

    let mut in_train = vec![false; n];
    for &i in &train_index {
        in_train[i] = true;
    }
    let test_index: Vec<usize> = (0..n).filter(|&i| !in_train[i]).collect();

    Ok(Split {
        train: data.subset(&train_index),
        test: data.subset(&test_index),
        train_index,
        test_index,
    })
}

/// Use all of `train` for training and all of `test` for evaluation.
pub fn explicit_split<S: AsRef<str>>(
    train: &Frame,
    test: &Frame,
    x: &[S],
    y: &str,
) -> Result<Split> {
    let train_set = train.dataset(x, y)?;
    let test_set = test.dataset(x, y)?;
    Ok(Split {
        train_index: (0..train_set.len()).collect(),
        test_index: (0..test_set.len()).collect(),
        train: train_set,
        test: test_set,
    })
}

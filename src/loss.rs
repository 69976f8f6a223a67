//! Loss functions.
//!
//! Each loss reduces a prediction row against its target row to a scalar, and the
//! `*_backward` variants also write `dL/d(pred)` for backprop.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Probabilities are clamped into `[BCE_EPS, 1 - BCE_EPS]` before taking logs.
pub const BCE_EPS: f32 = 1e-7;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Supported loss functions.
pub enum Loss {
    /// Mean squared error.
    #[default]
    MeanSquaredError,
    /// Binary cross-entropy on probabilities.
    ///
    /// Predictions are expected in `(0, 1)`, typically from a sigmoid output layer.
    BinaryCrossEntropy,
}

impl Loss {
    /// Compute a loss value.
    ///
    /// Shape contract: `pred.len() == target.len()`.
    #[inline]
    pub fn forward(self, pred: &[f32], target: &[f32]) -> f32 {
        match self {
            Loss::MeanSquaredError => mse(pred, target),
            Loss::BinaryCrossEntropy => bce(pred, target),
        }
    }

    /// Compute loss + gradient w.r.t `pred`.
    ///
    /// Writes `d_pred = dL/d(pred)` into `d_pred` and returns the loss.
    #[inline]
    pub fn backward(self, pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
        match self {
            Loss::MeanSquaredError => mse_backward(pred, target, d_pred),
            Loss::BinaryCrossEntropy => bce_backward(pred, target, d_pred),
        }
    }
}

impl FromStr for Loss {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mse" | "mean_squared_error" | "mean-squared-error" => Ok(Loss::MeanSquaredError),
            "bce" | "binary_cross_entropy" | "binary-cross-entropy" => {
                Ok(Loss::BinaryCrossEntropy)
            }
            other => Err(Error::InvalidConfig(format!(
                "unknown loss {other:?}; expected mse or binary_cross_entropy"
            ))),
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loss::MeanSquaredError => f.write_str("mean_squared_error"),
            Loss::BinaryCrossEntropy => f.write_str("binary_cross_entropy"),
        }
    }
}

/// Mean squared error: `mean((pred - target)^2)`.
#[inline]
pub fn mse(pred: &[f32], target: &[f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    if pred.is_empty() {
        return 0.0;
    }

    let inv_n = 1.0 / pred.len() as f32;
    let mut sum_sq = 0.0_f32;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    sum_sq * inv_n
}

/// MSE loss + gradient w.r.t. `pred`: `d_pred[i] = 2 (pred[i] - target[i]) / N`.
#[inline]
pub fn mse_backward(pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );
    assert_eq!(
        pred.len(),
        d_pred.len(),
        "pred len {} does not match d_pred len {}",
        pred.len(),
        d_pred.len()
    );

    if pred.is_empty() {
        return 0.0;
    }

    let inv_n = 1.0 / pred.len() as f32;
    let mut sum_sq = 0.0_f32;
    for i in 0..pred.len() {
        let diff = pred[i] - target[i];
        sum_sq = diff.mul_add(diff, sum_sq);
        d_pred[i] = 2.0 * diff * inv_n;
    }
    sum_sq * inv_n
}

/// Binary cross-entropy: `-mean(t ln p + (1 - t) ln(1 - p))`.
#[inline]
pub fn bce(pred: &[f32], target: &[f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    if pred.is_empty() {
        return 0.0;
    }

    let inv_n = 1.0 / pred.len() as f32;
    let mut sum = 0.0_f32;
    for (&p, &t) in pred.iter().zip(target) {
        let p = p.clamp(BCE_EPS, 1.0 - BCE_EPS);
        sum -= t * p.ln() + (1.0 - t) * (1.0 - p).ln();
    }
    sum * inv_n
}

/// BCE loss + gradient w.r.t `pred`: `(p - t) / (p (1 - p) N)`, with `p` clamped.
#[inline]
pub fn bce_backward(pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );
    assert_eq!(
        pred.len(),
        d_pred.len(),
        "pred len {} does not match d_pred len {}",
        pred.len(),
        d_pred.len()
    );

    if pred.is_empty() {
        return 0.0;
    }

    let inv_n = 1.0 / pred.len() as f32;
    let mut sum = 0.0_f32;
    for i in 0..pred.len() {
        let p = pred[i].clamp(BCE_EPS, 1.0 - BCE_EPS);
        let t = target[i];
        sum -= t * p.ln() + (1.0 - t) * (1.0 - p).ln();
        d_pred[i] = (p - t) / (p * (1.0 - p)) * inv_n;
    }
    sum * inv_n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_is_zero_when_equal() {
        let pred = [1.0_f32, -2.0, 0.5];
        let target = pred;
        assert_eq!(mse(&pred, &target), 0.0);
    }

    #[test]
    fn mse_backward_matches_expected_gradient() {
        let pred = [1.0_f32, 3.0];
        let target = [2.0_f32, 1.0];
        let mut d_pred = [0.0_f32; 2];
        let loss = mse_backward(&pred, &target, &mut d_pred);

        // L = mean([(-1)^2, (2)^2]) = 2.5
        assert!((loss - 2.5).abs() < 1e-6);
        // dL/dpred = 2 (pred - target) / N
        assert!((d_pred[0] - (-1.0)).abs() < 1e-6);
        assert!((d_pred[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn bce_at_one_half_is_ln_2() {
        let mut d = [0.0_f32];
        let loss = bce_backward(&[0.5], &[1.0], &mut d);
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
        // (0.5 - 1) / 0.25 = -2
        assert!((d[0] - (-2.0)).abs() < 1e-5);
    }

    #[test]
    fn bce_is_finite_for_saturated_predictions() {
        let loss = bce(&[0.0, 1.0], &[1.0, 0.0]);
        assert!(loss.is_finite());
        assert!(loss > 10.0);
        assert!(bce(&[1.0, 0.0], &[1.0, 0.0]) < 1e-5);
    }

    #[test]
    fn tag_aliases_select_the_same_loss() {
        for tag in ["bce", "BCE", "binary_cross_entropy", "Binary-Cross-Entropy"] {
            assert_eq!(tag.parse::<Loss>().unwrap(), Loss::BinaryCrossEntropy);
        }
        for tag in ["mse", "MSE", "mean_squared_error", "mean-squared-error"] {
            assert_eq!(tag.parse::<Loss>().unwrap(), Loss::MeanSquaredError);
        }
        assert!(matches!("hinge".parse::<Loss>(), Err(Error::InvalidConfig(_))));
    }
}

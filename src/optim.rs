//! Optimizers.
//!
//! Only plain stochastic gradient descent is supported. The tag is still parsed through
//! [`Optimizer`] so that unknown optimizers are rejected when the network is configured,
//! before training touches any parameter.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Gradients, Mlp, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Optimizer choice for training.
pub enum Optimizer {
    /// Plain SGD: `param -= lr * grad`, one step per example.
    #[default]
    Sgd,
}

impl FromStr for Optimizer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" | "stochastic_gradient_descent" | "stochastic-gradient-descent" => {
                Ok(Optimizer::Sgd)
            }
            other => Err(Error::InvalidConfig(format!(
                "unsupported optimizer {other:?}; only stochastic gradient descent (\"sgd\") is available"
            ))),
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Optimizer::Sgd => f.write_str("stochastic_gradient_descent"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// Stochastic gradient descent with a fixed learning rate.
pub struct Sgd {
    lr: f32,
}

impl Sgd {
    #[inline]
    /// Construct an SGD optimizer.
    ///
    /// Returns an error if `lr` is not finite or `lr <= 0`.
    pub fn new(lr: f32) -> Result<Self> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {lr}"
            )));
        }
        Ok(Self { lr })
    }

    #[inline]
    /// Returns the learning rate.
    pub fn lr(&self) -> f32 {
        self.lr
    }

    #[inline]
    /// Apply one optimizer step: `param -= lr * d_param`.
    pub fn step(&self, model: &mut Mlp, grads: &Gradients) {
        model.sgd_step(grads, self.lr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Layer, Loss, Matrix};

    #[test]
    fn sgd_requires_positive_finite_lr() {
        assert!(Sgd::new(0.0).is_err());
        assert!(Sgd::new(-1.0).is_err());
        assert!(Sgd::new(f32::NAN).is_err());
        assert!(Sgd::new(0.1).is_ok());
    }

    #[test]
    fn parses_sgd_aliases_and_rejects_others() {
        for tag in ["sgd", "SGD", "stochastic_gradient_descent", "stochastic-gradient-descent"] {
            assert_eq!(tag.parse::<Optimizer>().unwrap(), Optimizer::Sgd);
        }
        for tag in ["adam", "rmsprop", ""] {
            assert!(matches!(
                tag.parse::<Optimizer>(),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn sgd_step_moves_against_the_gradient() {
        let mut mlp = Mlp::new(Loss::MeanSquaredError, Optimizer::Sgd);
        mlp.add(
            Layer::from_parts(
                1,
                1,
                Activation::Linear,
                Matrix::row_vector(vec![1.0]),
                Matrix::row_vector(vec![2.0]),
            )
            .unwrap(),
        )
        .unwrap();

        let mut grads = mlp.zero_gradients();
        grads.d_weights_mut(0).as_mut_slice()[0] = 3.0;
        grads.d_biases_mut(0).as_mut_slice()[0] = 4.0;

        Sgd::new(0.1).unwrap().step(&mut mlp, &grads);

        let layer = mlp.layer(0).unwrap();
        assert!((layer.weights().get(0, 0) - (1.0 - 0.1 * 3.0)).abs() < 1e-6);
        assert!((layer.bias().get(0, 0) - (2.0 - 0.1 * 4.0)).abs() < 1e-6);
    }
}

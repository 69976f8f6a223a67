//! Activation functions.
//!
//! A dense layer computes a pre-activation value `z = x W + b` and then applies an
//! activation function element-wise: `y = activation(z)`.
//!
//! Both forward modes go through [`ActivationFn`]: the numeric mode calls `apply`, the
//! differentiable mode calls `apply_differentiable`, which derives its value from `apply`
//! and pairs it with `dy/dz` for backprop. The two modes therefore cannot disagree.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Element-wise activation with a derivative usable by backprop.
pub trait ActivationFn {
    /// Plain numeric value `y = f(z)`.
    fn apply(&self, z: f32) -> f32;

    /// `dy/dz`, given both the input `z` and the output `y = f(z)`.
    fn derivative(&self, z: f32, y: f32) -> f32;

    /// Value and derivative in one pass.
    #[inline]
    fn apply_differentiable(&self, z: f32) -> (f32, f32) {
        let y = self.apply(z);
        (y, self.derivative(z, y))
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Element-wise activation function.
pub enum Activation {
    /// No activation (`y = z`).
    #[default]
    Linear,
    Tanh,
    Sigmoid,
    #[cfg_attr(feature = "serde", serde(rename = "relu"))]
    ReLU,
    Softplus,
}

impl ActivationFn for Activation {
    #[inline]
    fn apply(&self, z: f32) -> f32 {
        match self {
            Activation::Linear => z,
            Activation::Tanh => z.tanh(),
            Activation::Sigmoid => sigmoid(z),
            Activation::ReLU => z.max(0.0),
            Activation::Softplus => softplus(z),
        }
    }

    #[inline]
    fn derivative(&self, z: f32, y: f32) -> f32 {
        match self {
            Activation::Linear => 1.0,
            Activation::Tanh => 1.0 - y * y,
            Activation::Sigmoid => y * (1.0 - y),
            Activation::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Softplus => sigmoid(z),
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" | "linear" | "identity" => Ok(Activation::Linear),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "relu" => Ok(Activation::ReLU),
            "softplus" => Ok(Activation::Softplus),
            other => Err(Error::InvalidConfig(format!(
                "unknown activation {other:?}; expected one of linear, tanh, sigmoid, relu, softplus"
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Linear => "linear",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "relu",
            Activation::Softplus => "softplus",
        };
        f.write_str(name)
    }
}

#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[inline]
fn softplus(x: f32) -> f32 {
    // ln(1 + e^x) without overflow for large |x|.
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

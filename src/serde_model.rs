//! Model serialization/deserialization (feature: `serde`).
//!
//! This module defines a versioned on-disk JSON format for `Mlp`.
//!
//! - Internal `Mlp`/`Layer` structs are not serialized directly, so the file format can
//!   stay put while the in-memory representation changes.
//! - Deserialization validates the version, dimensions, layer chaining and that all
//!   parameters are finite.
//! - Training history is not stored; a loaded model keeps its feature and target columns
//!   so it can `predict` on a table right away.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Layer, Loss, Matrix, Mlp, Optimizer, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMlp {
    pub format_version: u32,
    pub loss: Loss,
    #[serde(default)]
    pub optimizer: Optimizer,
    #[serde(default)]
    pub feature_columns: Option<Vec<String>>,
    #[serde(default)]
    pub target_column: Option<String>,
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub n_in: usize,
    pub n_out: usize,
    pub activation: Activation,
    /// Row-major (n_in, n_out).
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl SerializedMlp {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.layers.is_empty() {
            return Err(Error::InvalidData(
                "serialized model must have at least one layer".to_owned(),
            ));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate()?;

            if i > 0 {
                let prev_out = self.layers[i - 1].n_out;
                if layer.n_in != prev_out {
                    return Err(Error::InvalidData(format!(
                        "layer {i} n_in {} does not match previous n_out {}",
                        layer.n_in, prev_out
                    )));
                }
            }
        }

        if let Some(cols) = &self.feature_columns {
            if cols.len() != self.layers[0].n_in {
                return Err(Error::InvalidData(format!(
                    "{} feature columns for an input width of {}",
                    cols.len(),
                    self.layers[0].n_in
                )));
            }
        }

        Ok(())
    }
}

impl SerializedLayer {
    fn validate(&self) -> Result<()> {
        if self.n_in == 0 || self.n_out == 0 {
            return Err(Error::InvalidData(format!(
                "layer dims must be > 0, got n_in={} n_out={}",
                self.n_in, self.n_out
            )));
        }

        let expected_w = self
            .n_in
            .checked_mul(self.n_out)
            .ok_or_else(|| Error::InvalidData("layer weight shape overflow".to_owned()))?;
        if self.weights.len() != expected_w {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match n_in * n_out ({} * {})",
                self.weights.len(),
                self.n_in,
                self.n_out
            )));
        }
        if self.bias.len() != self.n_out {
            return Err(Error::InvalidData(format!(
                "bias length {} does not match n_out {}",
                self.bias.len(),
                self.n_out
            )));
        }

        if self.weights.iter().chain(&self.bias).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "parameters must contain only finite values".to_owned(),
            ));
        }

        Ok(())
    }
}

impl From<&Mlp> for SerializedMlp {
    fn from(model: &Mlp) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            loss: model.loss(),
            optimizer: model.optimizer(),
            feature_columns: model.feature_columns().map(<[String]>::to_vec),
            target_column: model.target_column().map(str::to_owned),
            layers: model.layers().iter().map(SerializedLayer::from).collect(),
        }
    }
}

impl From<&Layer> for SerializedLayer {
    fn from(layer: &Layer) -> Self {
        Self {
            n_in: layer.n_in(),
            n_out: layer.n_out(),
            activation: layer.activation(),
            weights: layer.weights().as_slice().to_vec(),
            bias: layer.bias().as_slice().to_vec(),
        }
    }
}

impl TryFrom<SerializedMlp> for Mlp {
    type Error = Error;

    fn try_from(value: SerializedMlp) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        let mut layers = Vec::with_capacity(value.layers.len());
        for (i, layer) in value.layers.into_iter().enumerate() {
            let weights = Matrix::from_vec(layer.n_in, layer.n_out, layer.weights)?;
            let bias = Matrix::from_vec(1, layer.n_out, layer.bias)?;
            let l = Layer::from_parts(layer.n_in, layer.n_out, layer.activation, weights, bias)
                .map_err(|e| Error::InvalidData(format!("layer {i} invalid: {e}")))?;
            layers.push(l);
        }

        let mut mlp = Mlp::from_layers(layers, value.loss)?;
        mlp.optimizer = value.optimizer;
        mlp.x_cols = value.feature_columns;
        mlp.y_col = value.target_column;
        Ok(mlp)
    }
}

impl Mlp {
    /// Serialize the model to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let ser = SerializedMlp::from(self);
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Serialize the model to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let ser = SerializedMlp::from(self);
        serde_json::to_string(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedMlp = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the model to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        std::fs::write(path, s)?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }
}

//! Parameter store and weight introspection.
//!
//! The parameter list of an `Mlp` is always `W0, b0, W1, b1, …` in forward order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Matrix, Mlp, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Weights,
    Bias,
}

/// Position of one parameter in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId {
    pub layer: usize,
    pub kind: ParamKind,
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::Weights => write!(f, "weights {}", self.layer),
            ParamKind::Bias => write!(f, "bias {}", self.layer),
        }
    }
}

/// Which layers [`Mlp::get_weights`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerSelector {
    #[default]
    All,
    Index(usize),
}

impl From<usize> for LayerSelector {
    fn from(idx: usize) -> Self {
        LayerSelector::Index(idx)
    }
}

/// Which parameters [`Mlp::get_weights`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamSelector {
    Weights,
    Bias,
    #[default]
    All,
}

impl ParamSelector {
    fn includes(self, kind: ParamKind) -> bool {
        matches!(
            (self, kind),
            (ParamSelector::All, _)
                | (ParamSelector::Weights, ParamKind::Weights)
                | (ParamSelector::Bias, ParamKind::Bias)
        )
    }
}

impl FromStr for ParamSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "weights" | "weight" | "w" => Ok(ParamSelector::Weights),
            "bias" | "biases" | "b" => Ok(ParamSelector::Bias),
            "all" => Ok(ParamSelector::All),
            other => Err(Error::InvalidConfig(format!(
                "unknown param {other:?}; choose between \"weights\", \"bias\" or \"all\""
            ))),
        }
    }
}

/// Snapshot of parameter values keyed by name.
pub type Weights = BTreeMap<String, Matrix>;

impl Mlp {
    /// Every trainable parameter, in forward order.
    pub fn params(&self) -> Vec<(ParamId, &Matrix)> {
        let mut out = Vec::with_capacity(self.num_layers() * 2);
        for (layer, l) in self.layers().iter().enumerate() {
            out.push((
                ParamId {
                    layer,
                    kind: ParamKind::Weights,
                },
                l.weights(),
            ));
            out.push((
                ParamId {
                    layer,
                    kind: ParamKind::Bias,
                },
                l.bias(),
            ));
        }
        out
    }

    /// Copy out parameter values.
    ///
    /// Keys are `"weights {i}"` / `"bias {i}"` for [`LayerSelector::All`] and bare
    /// `"weights"` / `"bias"` for a single layer. `param` accepts `weights`, `bias` or `all`
    /// (case-insensitive).
    pub fn get_weights(&self, layer: LayerSelector, param: &str) -> Result<Weights> {
        let selector = ParamSelector::from_str(param)?;
        self.select_weights(layer, selector)
    }

    /// Typed form of [`Mlp::get_weights`].
    pub fn select_weights(&self, layer: LayerSelector, param: ParamSelector) -> Result<Weights> {
        if let LayerSelector::Index(index) = layer {
            if index >= self.num_layers() {
                return Err(Error::LayerIndex {
                    index,
                    len: self.num_layers(),
                });
            }
        }

        let weights = self
            .params()
            .into_iter()
            .filter(|(id, _)| param.includes(id.kind))
            .filter_map(|(id, value)| match layer {
                LayerSelector::All => Some((id.to_string(), value.clone())),
                LayerSelector::Index(index) if id.layer == index => {
                    let key = match id.kind {
                        ParamKind::Weights => "weights",
                        ParamKind::Bias => "bias",
                    };
                    Some((key.to_owned(), value.clone()))
                }
                LayerSelector::Index(_) => None,
            })
            .collect();

        Ok(weights)
    }

    /// Overwrite every parameter with a snapshot taken from the same network.
    pub(crate) fn restore_params(&mut self, snapshot: &[Matrix]) {
        debug_assert_eq!(snapshot.len(), self.num_layers() * 2);
        for (i, pair) in snapshot.chunks_exact(2).enumerate() {
            if let Some(layer) = self.layer_mut(i) {
                *layer.weights_mut() = pair[0].clone();
                *layer.bias_mut() = pair[1].clone();
            }
        }
    }

    pub(crate) fn snapshot_params(&self) -> Vec<Matrix> {
        self.params().into_iter().map(|(_, m)| m.clone()).collect()
    }
}

//! Model builder.
//!
//! `MlpBuilder` defines a network by its input width and a list of `(width, activation)`
//! layers. Each layer's input width is the previous layer's output width, so chaining can
//! not go wrong. Weights are drawn with Xavier initialization, biases start at zero.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Error, Init, Layer, Loss, Mlp, Result};

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    n_out: usize,
    activation: Activation,
}

/// Builder for an `Mlp`.
///
/// ```rust
/// use tabular_mlp::{Activation, Loss, MlpBuilder};
///
/// # fn main() -> tabular_mlp::Result<()> {
/// let mlp = MlpBuilder::new(2)?
///     .add_layer(4, Activation::Tanh)?
///     .add_layer(1, Activation::Sigmoid)?
///     .loss(Loss::BinaryCrossEntropy)
///     .build_with_seed(0)?;
/// assert_eq!(mlp.num_layers(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MlpBuilder {
    input_dim: usize,
    layers: Vec<LayerSpec>,
    loss: Loss,
}

impl MlpBuilder {
    /// Start building an MLP that accepts `input_dim` features.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
            loss: Loss::default(),
        })
    }

    /// Convenience constructor from a sizes list + activations.
    ///
    /// `sizes` includes input and output widths, so its length must be at least 2.
    /// `activations` must have length `sizes.len() - 1`.
    pub fn from_sizes(sizes: &[usize], activations: &[Activation]) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidConfig(
                "sizes must include input and output dims".to_owned(),
            ));
        }
        if activations.len() != sizes.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "activations length {} does not match sizes.len() - 1 ({})",
                activations.len(),
                sizes.len() - 1
            )));
        }

        let mut b = Self::new(sizes[0])?;
        for (&n_out, &act) in sizes[1..].iter().zip(activations) {
            b = b.add_layer(n_out, act)?;
        }
        Ok(b)
    }

    /// Add a dense layer with `n_out` outputs.
    pub fn add_layer(mut self, n_out: usize, activation: Activation) -> Result<Self> {
        if n_out == 0 {
            return Err(Error::InvalidConfig("layer n_out must be > 0".to_owned()));
        }
        self.layers.push(LayerSpec { n_out, activation });
        Ok(self)
    }

    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Mlp> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Mlp> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(
                "mlp must have at least one layer".to_owned(),
            ));
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        let mut n_in = self.input_dim;
        for spec in self.layers {
            layers.push(Layer::new_with_rng(
                n_in,
                spec.n_out,
                spec.activation,
                Init::Xavier,
                Init::Zeros,
                rng,
            )?);
            n_in = spec.n_out;
        }

        Mlp::from_layers(layers, self.loss)
    }
}

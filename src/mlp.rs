use std::str::FromStr;

use crate::layer::{LayerTrace, Mode};
use crate::{Error, Layer, Loss, Matrix, Optimizer, Regularization, Result};

/// A sequential stack of dense layers plus its loss and optimizer configuration.
///
/// The network is created empty, layers are appended with [`Mlp::add`], trained with
/// [`Mlp::train`] and then used for any number of [`Mlp::predict`] calls.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Layer>,
    loss: Loss,
    pub(crate) optimizer: Optimizer,
    pub(crate) train_losses: Vec<f32>,
    pub(crate) test_losses: Vec<f32>,
    pub(crate) best_loss: f32,
    pub(crate) best_epoch: usize,
    pub(crate) x_cols: Option<Vec<String>>,
    pub(crate) y_col: Option<String>,
}

/// Per-layer record of a differentiable forward pass.
///
/// The last entry's output is the network output; backprop walks the entries in reverse.
#[derive(Debug, Clone)]
pub struct Tape {
    traces: Vec<LayerTrace>,
}

/// Parameter gradients for an `Mlp`, in the same layer order as the parameters.
#[derive(Debug, Clone)]
pub struct Gradients {
    d_weights: Vec<Matrix>,
    d_biases: Vec<Matrix>,
}

impl Default for Mlp {
    fn default() -> Self {
        Self::new(Loss::default(), Optimizer::default())
    }
}

impl Mlp {
    pub fn new(loss: Loss, optimizer: Optimizer) -> Self {
        Self {
            layers: Vec::new(),
            loss,
            optimizer,
            train_losses: Vec::new(),
            test_losses: Vec::new(),
            best_loss: f32::INFINITY,
            best_epoch: 0,
            x_cols: None,
            y_col: None,
        }
    }

    /// Resolve loss and optimizer tags, e.g. `("bce", "sgd")`.
    pub fn from_tags(loss: &str, optimizer: &str) -> Result<Self> {
        Ok(Self::new(Loss::from_str(loss)?, Optimizer::from_str(optimizer)?))
    }

    pub(crate) fn from_layers(layers: Vec<Layer>, loss: Loss) -> Result<Self> {
        let mut mlp = Self::new(loss, Optimizer::Sgd);
        for layer in layers {
            mlp.add(layer)?;
        }
        Ok(mlp)
    }

    /// Append a layer. Its input width must match the previous layer's output width.
    pub fn add(&mut self, layer: Layer) -> Result<()> {
        if let Some(prev) = self.layers.last() {
            if layer.n_in() != prev.n_out() {
                return Err(Error::shape(
                    format!("layer {} input", self.layers.len()),
                    (prev.n_out(), layer.n_out()),
                    (layer.n_in(), layer.n_out()),
                ));
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    #[inline]
    pub fn loss(&self) -> Loss {
        self.loss
    }

    #[inline]
    pub fn optimizer(&self) -> Optimizer {
        self.optimizer
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.layers.first().map(Layer::n_in)
    }

    pub fn output_dim(&self) -> Option<usize> {
        self.layers.last().map(Layer::n_out)
    }

    /// Per-epoch mean training objective from the last `train` call.
    pub fn train_losses(&self) -> &[f32] {
        &self.train_losses
    }

    /// Per-epoch mean test objective from the last `train` call.
    pub fn test_losses(&self) -> &[f32] {
        &self.test_losses
    }

    /// Best test objective seen with early stopping enabled (`+inf` otherwise).
    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    /// Epoch (1-based) of `best_loss`, 0 if no improvement was recorded.
    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }

    /// Feature columns used during training.
    pub fn feature_columns(&self) -> Option<&[String]> {
        self.x_cols.as_deref()
    }

    pub fn target_column(&self) -> Option<&str> {
        self.y_col.as_deref()
    }

    /// Thread `x` through every layer in order.
    pub fn forward_prop(&self, x: &Matrix, mode: Mode) -> Result<Matrix> {
        let (first, rest) = self.layers.split_first().ok_or_else(no_layers)?;
        let mut output = first.feed_forward(x, mode)?;
        for layer in rest {
            output = layer.feed_forward(&output, mode)?;
        }
        Ok(output)
    }

    /// Differentiable forward pass that keeps every layer's trace for backprop.
    pub fn forward_tape(&self, x: &Matrix) -> Result<Tape> {
        if self.layers.is_empty() {
            return Err(no_layers());
        }
        let mut traces: Vec<LayerTrace> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let trace = match traces.last() {
                Some(prev) => layer.forward_traced(&prev.output)?,
                None => layer.forward_traced(x)?,
            };
            traces.push(trace);
        }
        Ok(Tape { traces })
    }

    /// Mean loss of `forward_prop(x)` against one target per row.
    ///
    /// Each row's target is compared against every output column.
    pub fn cost(&self, x: &Matrix, y: &[f32]) -> Result<f32> {
        let output = self.forward_prop(x, Mode::Numeric)?;
        self.loss_of(&output, y)
    }

    /// `cost + l1 * L1() + l2 * L2()`.
    pub fn objective(&self, x: &Matrix, y: &[f32], reg: Regularization) -> Result<f32> {
        Ok(self.cost(x, y)? + reg.penalty(self))
    }

    /// Backprop the regularized objective through `tape`.
    ///
    /// Returns the objective value and the gradient of every parameter.
    pub fn backward(&self, tape: &Tape, y: &[f32], reg: Regularization) -> Result<(f32, Gradients)> {
        if tape.traces.len() != self.layers.len() {
            return Err(Error::InvalidData(format!(
                "tape has {} layer traces, model has {} layers",
                tape.traces.len(),
                self.layers.len()
            )));
        }
        let output = tape.output();
        check_targets(output, y)?;

        let (rows, cols) = output.shape();
        let inv_rows = 1.0 / rows as f32;
        let mut d_output = Matrix::zeros(rows, cols);
        let mut target = vec![0.0_f32; cols];
        let mut loss = 0.0_f32;
        for (r, &t) in y.iter().enumerate() {
            target.fill(t);
            let start = r * cols;
            let d_row = &mut d_output.as_mut_slice()[start..start + cols];
            loss += self.loss.backward(output.row(r), &target, d_row);
        }
        for v in d_output.as_mut_slice() {
            *v *= inv_rows;
        }
        let loss = loss * inv_rows;

        let mut d_weights = vec![Matrix::zeros(0, 0); self.layers.len()];
        let mut d_biases = vec![Matrix::zeros(0, 0); self.layers.len()];
        let mut upstream = d_output;
        for (idx, (layer, trace)) in self.layers.iter().zip(&tape.traces).enumerate().rev() {
            let mut grads = layer.backward(trace, &upstream)?;
            reg.add_gradient(layer.weights(), &mut grads.d_weights);
            d_weights[idx] = grads.d_weights;
            d_biases[idx] = grads.d_bias;
            upstream = grads.d_input;
        }

        Ok((
            loss + reg.penalty(self),
            Gradients {
                d_weights,
                d_biases,
            },
        ))
    }

    /// Zero-valued gradients shaped like this network's parameters.
    pub fn zero_gradients(&self) -> Gradients {
        Gradients {
            d_weights: self
                .layers
                .iter()
                .map(|l| Matrix::zeros(l.n_in(), l.n_out()))
                .collect(),
            d_biases: self
                .layers
                .iter()
                .map(|l| Matrix::zeros(1, l.n_out()))
                .collect(),
        }
    }

    /// Applies an SGD update to all layers.
    #[inline]
    pub fn sgd_step(&mut self, grads: &Gradients, lr: f32) {
        assert!(
            lr.is_finite() && lr > 0.0,
            "learning rate must be finite and > 0"
        );
        assert_eq!(
            self.layers.len(),
            grads.d_weights.len(),
            "grads has {} d_weights entries, model has {} layers",
            grads.d_weights.len(),
            self.layers.len()
        );

        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.sgd_step(&grads.d_weights[i], &grads.d_biases[i], lr);
        }
    }

    pub(crate) fn loss_of(&self, output: &Matrix, y: &[f32]) -> Result<f32> {
        check_targets(output, y)?;
        if y.is_empty() {
            return Ok(0.0);
        }
        let mut target = vec![0.0_f32; output.cols()];
        let mut total = 0.0_f32;
        for (r, &t) in y.iter().enumerate() {
            target.fill(t);
            total += self.loss.forward(output.row(r), &target);
        }
        Ok(total / y.len() as f32)
    }
}

impl Tape {
    /// Output of the final layer.
    #[inline]
    pub fn output(&self) -> &Matrix {
        &self
            .traces
            .last()
            .expect("tape must have at least one layer trace")
            .output
    }
}

impl Gradients {
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.d_weights.len()
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &Matrix {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &Matrix {
        &self.d_biases[layer_idx]
    }

    #[inline]
    pub fn d_weights_mut(&mut self, layer_idx: usize) -> &mut Matrix {
        &mut self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases_mut(&mut self, layer_idx: usize) -> &mut Matrix {
        &mut self.d_biases[layer_idx]
    }
}

fn no_layers() -> Error {
    Error::InvalidConfig("mlp must have at least one layer".to_owned())
}

fn check_targets(output: &Matrix, y: &[f32]) -> Result<()> {
    if y.len() != output.rows() {
        return Err(Error::shape("targets", (output.rows(), 1), (y.len(), 1)));
    }
    Ok(())
}

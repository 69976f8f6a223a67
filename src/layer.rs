//! Dense layer.
//!
//! A layer holds `W` with shape `(n_in, n_out)` and `b` with shape `(1, n_out)` and maps a
//! `(rows, n_in)` input to a `(rows, n_out)` output: `y = activation(x W + b)`.
//!
//! A layer keeps no record of its last output. A differentiable pass returns a
//! [`LayerTrace`] instead, collected into the network's `Tape`, so inference only needs
//! `&Layer`.

use rand::Rng;

use crate::activation::ActivationFn;
use crate::init::{init_params, init_params_with_rng};
use crate::{Activation, Error, Init, Matrix, Result};

/// Forward pass mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Plain inference, nothing recorded.
    #[default]
    Numeric,
    /// Records the activation derivatives backprop needs.
    Differentiable,
}

/// Construction options for [`Layer::with_options`].
///
/// Parameters left as `None` are drawn from [`init_params`] using `seed` and the
/// corresponding init method.
#[derive(Debug, Clone)]
pub struct LayerOptions {
    pub weights: Option<Matrix>,
    pub bias: Option<Matrix>,
    pub seed: Option<u64>,
    pub init_weights: Init,
    pub init_bias: Init,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            weights: None,
            bias: None,
            seed: None,
            init_weights: Init::Xavier,
            init_bias: Init::Zeros,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    n_in: usize,
    n_out: usize,
    /// Row-major matrix with shape (n_in, n_out).
    weights: Matrix,
    /// Row vector with shape (1, n_out).
    bias: Matrix,
    activation: Activation,
}

/// What a differentiable forward pass through one layer recorded.
#[derive(Debug, Clone)]
pub(crate) struct LayerTrace {
    pub(crate) input: Matrix,
    pub(crate) output: Matrix,
    /// `dy/dz` for every output element.
    pub(crate) d_act: Matrix,
}

/// Parameter gradients of one layer plus the gradient w.r.t. its input.
#[derive(Debug, Clone)]
pub(crate) struct LayerGrads {
    pub(crate) d_weights: Matrix,
    pub(crate) d_bias: Matrix,
    pub(crate) d_input: Matrix,
}

impl Layer {
    /// Layer with xavier weights, zero bias and a fresh random seed.
    pub fn new(n_in: usize, n_out: usize, activation: Activation) -> Result<Self> {
        Self::with_options(n_in, n_out, activation, LayerOptions::default())
    }

    pub fn with_options(
        n_in: usize,
        n_out: usize,
        activation: Activation,
        opts: LayerOptions,
    ) -> Result<Self> {
        validate_dims(n_in, n_out)?;

        let weights = match opts.weights {
            Some(w) => w,
            None => init_params(n_in, n_out, opts.init_weights, opts.seed),
        };
        let bias = match opts.bias {
            Some(b) => b,
            None => init_params(1, n_out, opts.init_bias, opts.seed),
        };

        Self::from_parts(n_in, n_out, activation, weights, bias)
    }

    /// Build a layer from explicit parameters, validating their shapes.
    pub fn from_parts(
        n_in: usize,
        n_out: usize,
        activation: Activation,
        weights: Matrix,
        bias: Matrix,
    ) -> Result<Self> {
        validate_dims(n_in, n_out)?;
        if weights.shape() != (n_in, n_out) {
            return Err(Error::shape("weights", (n_in, n_out), weights.shape()));
        }
        if bias.shape() != (1, n_out) {
            return Err(Error::shape("bias", (1, n_out), bias.shape()));
        }
        if !weights.is_finite() || !bias.is_finite() {
            return Err(Error::InvalidData(
                "layer parameters must contain only finite values".to_owned(),
            ));
        }

        Ok(Self {
            n_in,
            n_out,
            weights,
            bias,
            activation,
        })
    }

    /// Build a layer drawing both parameters from `rng`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        n_in: usize,
        n_out: usize,
        activation: Activation,
        init_weights: Init,
        init_bias: Init,
        rng: &mut R,
    ) -> Result<Self> {
        validate_dims(n_in, n_out)?;
        let weights = init_params_with_rng(n_in, n_out, init_weights, rng);
        let bias = init_params_with_rng(1, n_out, init_bias, rng);
        Self::from_parts(n_in, n_out, activation, weights, bias)
    }

    #[inline]
    pub fn n_in(&self) -> usize {
        self.n_in
    }

    #[inline]
    pub fn n_out(&self) -> usize {
        self.n_out
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> &Matrix {
        &self.bias
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    #[inline]
    pub fn bias_mut(&mut self) -> &mut Matrix {
        &mut self.bias
    }

    /// Forward pass for a `(rows, n_in)` input.
    ///
    /// Both modes return the same values for the same parameters and input.
    pub fn feed_forward(&self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        match mode {
            Mode::Numeric => {
                let z = self.pre_activation(input)?;
                Ok(z.map(|v| self.activation.apply(v)))
            }
            Mode::Differentiable => Ok(self.forward_traced(input)?.output),
        }
    }

    pub(crate) fn forward_traced(&self, input: &Matrix) -> Result<LayerTrace> {
        let z = self.pre_activation(input)?;
        let (rows, cols) = z.shape();
        let mut output = Vec::with_capacity(rows * cols);
        let mut d_act = Vec::with_capacity(rows * cols);
        for &v in z.as_slice() {
            let (y, dy) = self.activation.apply_differentiable(v);
            output.push(y);
            d_act.push(dy);
        }

        Ok(LayerTrace {
            input: input.clone(),
            output: Matrix::from_vec(rows, cols, output)?,
            d_act: Matrix::from_vec(rows, cols, d_act)?,
        })
    }

    /// Backward pass given the trace of the matching forward pass and `dL/d(output)`.
    ///
    /// - `dZ = dY ⊙ a'(z)`
    /// - `dW = xᵀ dZ`
    /// - `db = Σ_rows dZ`
    /// - `dX = dZ Wᵀ`
    pub(crate) fn backward(&self, trace: &LayerTrace, d_output: &Matrix) -> Result<LayerGrads> {
        let d_z = d_output.hadamard(&trace.d_act)?;
        let d_weights = trace.input.transpose().matmul(&d_z)?;
        let d_bias = d_z.sum_rows();
        let d_input = d_z.matmul(&self.weights.transpose())?;
        Ok(LayerGrads {
            d_weights,
            d_bias,
            d_input,
        })
    }

    /// `W -= lr * dW`, `b -= lr * db`.
    #[inline]
    pub(crate) fn sgd_step(&mut self, d_weights: &Matrix, d_bias: &Matrix, lr: f32) {
        self.weights.sub_scaled(d_weights, lr);
        self.bias.sub_scaled(d_bias, lr);
    }

    fn pre_activation(&self, input: &Matrix) -> Result<Matrix> {
        if input.cols() != self.n_in {
            return Err(Error::shape(
                "layer input",
                (input.rows(), self.n_in),
                input.shape(),
            ));
        }
        let mut z = input.matmul(&self.weights)?;
        z.add_row(&self.bias)?;
        Ok(z)
    }
}

fn validate_dims(n_in: usize, n_out: usize) -> Result<()> {
    if n_in == 0 || n_out == 0 {
        return Err(Error::InvalidConfig(format!(
            "layer dims must be > 0, got n_in={n_in} n_out={n_out}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_layer(activation: Activation) -> Layer {
        Layer::from_parts(
            2,
            3,
            activation,
            Matrix::from_rows(&[vec![0.5, -1.0, 0.25], vec![1.5, 0.75, -0.5]]).unwrap(),
            Matrix::row_vector(vec![0.1, -0.2, 0.3]),
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_weight_shape() {
        let err = Layer::with_options(
            2,
            1,
            Activation::Linear,
            LayerOptions {
                weights: Some(Matrix::zeros(1, 2)),
                ..LayerOptions::default()
            },
        )
        .unwrap_err();
        match err {
            Error::Shape {
                context,
                expected,
                got,
            } => {
                assert_eq!(context, "weights");
                assert_eq!(expected, (2, 1));
                assert_eq!(got, (1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_mismatched_bias_shape() {
        let err = Layer::with_options(
            2,
            3,
            Activation::Tanh,
            LayerOptions {
                bias: Some(Matrix::zeros(3, 1)),
                seed: Some(0),
                ..LayerOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Shape {
                expected: (1, 3),
                got: (3, 1),
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_dims() {
        assert!(matches!(
            Layer::new(0, 3, Activation::Linear),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn seeded_layers_are_identical() {
        let opts = LayerOptions {
            seed: Some(42),
            ..LayerOptions::default()
        };
        let a = Layer::with_options(4, 3, Activation::ReLU, opts.clone()).unwrap();
        let b = Layer::with_options(4, 3, Activation::ReLU, opts).unwrap();
        assert_eq!(a, b);
        assert!(a.bias().as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn linear_forward_is_affine() {
        let layer = fixed_layer(Activation::Linear);
        let x = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let y = layer.feed_forward(&x, Mode::Numeric).unwrap();
        // [1*0.5 + 2*1.5 + 0.1, 1*-1 + 2*0.75 - 0.2, 1*0.25 + 2*-0.5 + 0.3]
        let expected = [3.6_f32, 0.3, -0.45];
        for (got, want) in y.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }

    #[test]
    fn both_modes_agree() {
        let x = Matrix::from_rows(&[vec![0.3, -0.7], vec![-1.2, 2.0], vec![0.0, 0.0]]).unwrap();
        for act in [
            Activation::Linear,
            Activation::Tanh,
            Activation::Sigmoid,
            Activation::ReLU,
            Activation::Softplus,
        ] {
            let layer = fixed_layer(act);
            let numeric = layer.feed_forward(&x, Mode::Numeric).unwrap();
            let diff = layer.feed_forward(&x, Mode::Differentiable).unwrap();
            assert_eq!(numeric.shape(), (3, 3));
            for (a, b) in numeric.as_slice().iter().zip(diff.as_slice()) {
                assert!((a - b).abs() < 1e-6, "{act}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn feed_forward_rejects_wrong_input_width() {
        let layer = fixed_layer(Activation::Linear);
        let x = Matrix::zeros(4, 3);
        let err = layer.feed_forward(&x, Mode::Numeric).unwrap_err();
        assert!(matches!(
            err,
            Error::Shape {
                expected: (4, 2),
                got: (4, 3),
                ..
            }
        ));
    }

    #[test]
    fn backward_shapes() {
        let layer = fixed_layer(Activation::Sigmoid);
        let x = Matrix::from_rows(&[vec![0.3, -0.7], vec![1.0, 0.5]]).unwrap();
        let trace = layer.forward_traced(&x).unwrap();
        let grads = layer.backward(&trace, &Matrix::filled(2, 3, 1.0)).unwrap();
        assert_eq!(grads.d_weights.shape(), (2, 3));
        assert_eq!(grads.d_bias.shape(), (1, 3));
        assert_eq!(grads.d_input.shape(), (2, 2));
    }
}

//! A small MLP (multi-layer perceptron) crate for tabular data.
//!
//! `tabular-mlp` trains a sequential stack of dense layers with plain per-example SGD,
//! optional L1/L2 weight penalties and patience-based early stopping on a held-out test
//! set, then predicts point values or binary labels for new rows.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - [`Matrix`] is row-major with an explicit `(rows, cols)` shape.
//! - Layer weights have shape `(n_in, n_out)` and biases `(1, n_out)`; a layer maps a
//!   `(rows, n_in)` input to a `(rows, n_out)` output.
//! - Tables are [`Frame`]s of named columns. Training picks feature columns `x` and a target
//!   column `y` (default `"Y"`).
//!
//! # Errors
//!
//! Every fallible operation returns [`Result`]. Configuration is validated before any
//! parameter is touched, so a rejected `train` call leaves the model unchanged.
//!
//! # Quick start
//!
//! ```rust
//! use tabular_mlp::{Activation, Frame, Layer, Mlp, TrainConfig};
//!
//! # fn main() -> tabular_mlp::Result<()> {
//! let data = Frame::new()
//!     .with_column("x1", vec![0.0, 0.0, 1.0, 1.0])?
//!     .with_column("x2", vec![0.0, 1.0, 0.0, 1.0])?
//!     .with_column("Y", vec![0.0, 0.0, 1.0, 1.0])?;
//!
//! let mut mlp = Mlp::from_tags("mse", "sgd")?;
//! mlp.add(Layer::new(2, 1, Activation::Sigmoid)?)?;
//!
//! let cfg = TrainConfig {
//!     epochs: 50,
//!     learning_rate: 0.1,
//!     early_stop: false,
//!     ..TrainConfig::new(["x1", "x2"])
//! };
//! let report = mlp.train(&data, Some(&data), &cfg)?;
//! assert_eq!(report.epochs_run, 50);
//!
//! let labels = mlp.predict(&data, true)?;
//! assert_eq!(labels.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! # Driving training yourself
//!
//! The epoch loop is built from public pieces: a differentiable forward pass that records a
//! [`Tape`], backprop into [`Gradients`] and an [`Sgd`] step.
//!
//! ```rust
//! use tabular_mlp::{Activation, Matrix, MlpBuilder, Regularization, Sgd};
//!
//! # fn main() -> tabular_mlp::Result<()> {
//! let mut mlp = MlpBuilder::new(3)?
//!     .add_layer(8, Activation::Tanh)?
//!     .add_layer(1, Activation::Linear)?
//!     .build_with_seed(0)?;
//!
//! let x = Matrix::row_vector(vec![0.1, -0.2, 0.3]);
//! let tape = mlp.forward_tape(&x)?;
//! let (_objective, grads) = mlp.backward(&tape, &[1.0], Regularization::none())?;
//! Sgd::new(1e-2)?.step(&mut mlp, &grads);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod data;
pub mod error;
pub mod init;
pub mod layer;
pub mod log;
pub mod loss;
pub mod matrix;
pub mod mlp;
pub mod optim;
pub mod params;
pub mod plot;
pub mod predict;
pub mod regularization;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::{Activation, ActivationFn};
pub use builder::MlpBuilder;
pub use data::{DEFAULT_TARGET, Dataset, Frame, Split, explicit_split, train_test_split};
pub use error::{Error, Result};
pub use init::{Init, init_params};
pub use layer::{Layer, LayerOptions, Mode};
pub use log::Verbosity;
pub use loss::Loss;
pub use matrix::Matrix;
pub use mlp::{Gradients, Mlp, Tape};
pub use optim::{Optimizer, Sgd};
pub use params::{LayerSelector, ParamId, ParamKind, ParamSelector, Weights};
pub use plot::{CsvPlotter, NoPlot, Plotter};
pub use regularization::Regularization;
pub use train::{EarlyStopping, TrainConfig, TrainReport, TrainState};

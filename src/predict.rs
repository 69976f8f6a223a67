//! Inference on a trained network.

use crate::layer::Mode;
use crate::{Error, Frame, Matrix, Mlp, Result};

/// Values strictly above this become `1.0` in binary mode.
pub const BINARY_THRESHOLD: f32 = 0.5;

impl Mlp {
    /// One prediction per row of `frame`, using the feature columns seen during training.
    ///
    /// With `binary`, each value is mapped to `1.0` if it is above 0.5 and `0.0` otherwise.
    pub fn predict(&self, frame: &Frame, binary: bool) -> Result<Vec<f32>> {
        let cols = self.feature_columns().ok_or_else(|| {
            Error::InvalidConfig("model has not been trained; feature columns unknown".to_owned())
        })?;
        let x = frame.select(cols)?;
        self.predict_matrix(&x, binary)
    }

    /// Same as [`Mlp::predict`] on a prepared `(rows, input_dim)` feature matrix.
    pub fn predict_matrix(&self, x: &Matrix, binary: bool) -> Result<Vec<f32>> {
        let output = self.forward_prop(x, Mode::Numeric)?;
        if output.cols() != 1 {
            return Err(Error::shape(
                "prediction output",
                (output.rows(), 1),
                output.shape(),
            ));
        }

        let mut values = output.into_vec();
        if binary {
            for v in &mut values {
                *v = if *v > BINARY_THRESHOLD { 1.0 } else { 0.0 };
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Layer};

    fn identity_net() -> Mlp {
        let mut mlp = Mlp::default();
        let layer = Layer::from_parts(
            1,
            1,
            Activation::Linear,
            Matrix::filled(1, 1, 1.0),
            Matrix::zeros(1, 1),
        )
        .unwrap();
        mlp.add(layer).unwrap();
        mlp
    }

    #[test]
    fn binary_threshold_is_strict() {
        let mlp = identity_net();
        let x = Matrix::from_vec(4, 1, vec![0.2, 0.5, 0.51, 3.0]).unwrap();
        assert_eq!(
            mlp.predict_matrix(&x, true).unwrap(),
            vec![0.0, 0.0, 1.0, 1.0]
        );
        assert_eq!(
            mlp.predict_matrix(&x, false).unwrap(),
            vec![0.2, 0.5, 0.51, 3.0]
        );
    }

    #[test]
    fn predict_before_training_is_invalid_config() {
        let mlp = identity_net();
        let frame = Frame::new().with_column("a", vec![1.0]).unwrap();
        assert!(matches!(
            mlp.predict(&frame, false),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn predict_uses_training_columns() {
        let mut mlp = identity_net();
        mlp.x_cols = Some(vec!["b".to_owned()]);
        let frame = Frame::new()
            .with_column("a", vec![9.0, 9.0])
            .unwrap()
            .with_column("b", vec![0.25, 0.75])
            .unwrap();
        assert_eq!(mlp.predict(&frame, false).unwrap(), vec![0.25, 0.75]);
        assert_eq!(mlp.predict(&frame, true).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn wide_output_is_a_shape_error() {
        let mut mlp = Mlp::default();
        mlp.add(Layer::new(1, 2, Activation::Tanh).unwrap()).unwrap();
        let x = Matrix::zeros(3, 1);
        assert!(matches!(
            mlp.predict_matrix(&x, false),
            Err(Error::Shape { .. })
        ));
    }

    #[test]
    fn column_count_mismatch_is_a_shape_error() {
        let mlp = identity_net();
        let x = Matrix::zeros(2, 3);
        assert!(matches!(
            mlp.predict_matrix(&x, false),
            Err(Error::Shape { .. })
        ));
    }
}

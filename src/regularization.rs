//! L1/L2 weight penalties.
//!
//! The sums are recomputed from the current weights on every call. Biases are never
//! penalized.

use crate::{Matrix, Mlp};

/// Regularization rates applied on top of the loss.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Regularization {
    pub l1: f32,
    pub l2: f32,
}

impl Regularization {
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.l1 == 0.0 && self.l2 == 0.0
    }

    /// `l1 * L1() + l2 * L2()`.
    pub fn penalty(&self, mlp: &Mlp) -> f32 {
        if self.is_none() {
            return 0.0;
        }
        self.l1 * mlp.l1() + self.l2 * mlp.l2()
    }

    /// Add `l1 * sign(W) + 2 * l2 * W` to `d_weights`.
    pub(crate) fn add_gradient(&self, weights: &Matrix, d_weights: &mut Matrix) {
        if self.is_none() {
            return;
        }
        debug_assert_eq!(weights.shape(), d_weights.shape());
        for (g, &w) in d_weights.as_mut_slice().iter_mut().zip(weights.as_slice()) {
            let sign = if w > 0.0 {
                1.0
            } else if w < 0.0 {
                -1.0
            } else {
                0.0
            };
            *g += self.l1 * sign + 2.0 * self.l2 * w;
        }
    }
}

impl Mlp {
    /// Sum of absolute values of every layer's weight matrix.
    pub fn l1(&self) -> f32 {
        self.layers().iter().map(|l| l.weights().abs_sum()).sum()
    }

    /// Sum of squares of every layer's weight matrix.
    pub fn l2(&self) -> f32 {
        self.layers().iter().map(|l| l.weights().sq_sum()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Layer};

    fn fixed_mlp() -> Mlp {
        let mut mlp = Mlp::default();
        mlp.add(
            Layer::from_parts(
                2,
                1,
                Activation::Linear,
                Matrix::from_rows(&[vec![1.0], vec![-2.0]]).unwrap(),
                Matrix::row_vector(vec![10.0]),
            )
            .unwrap(),
        )
        .unwrap();
        mlp.add(
            Layer::from_parts(
                1,
                1,
                Activation::Linear,
                Matrix::row_vector(vec![-3.0]),
                Matrix::row_vector(vec![-10.0]),
            )
            .unwrap(),
        )
        .unwrap();
        mlp
    }

    #[test]
    fn sums_cover_every_layer_but_not_biases() {
        let mlp = fixed_mlp();
        assert_eq!(mlp.l1(), 6.0);
        assert_eq!(mlp.l2(), 14.0);
    }

    #[test]
    fn repeated_calls_do_not_accumulate() {
        let mlp = fixed_mlp();
        let first = (mlp.l1(), mlp.l2());
        for _ in 0..5 {
            assert_eq!((mlp.l1(), mlp.l2()), first);
        }
    }

    #[test]
    fn penalty_combines_rates() {
        let mlp = fixed_mlp();
        let reg = Regularization { l1: 0.5, l2: 0.25 };
        assert!((reg.penalty(&mlp) - (0.5 * 6.0 + 0.25 * 14.0)).abs() < 1e-6);
        assert_eq!(Regularization::none().penalty(&mlp), 0.0);
    }

    #[test]
    fn gradient_uses_sign_and_twice_the_weight() {
        let w = Matrix::row_vector(vec![2.0, -1.0, 0.0]);
        let mut g = Matrix::zeros(1, 3);
        Regularization { l1: 0.1, l2: 0.5 }.add_gradient(&w, &mut g);
        let expected = [0.1 + 2.0, -0.1 - 1.0, 0.0];
        for (got, want) in g.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6);
        }
    }
}

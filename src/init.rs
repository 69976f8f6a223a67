//! Parameter initialization.
//!
//! [`init_params`] is deterministic for a given seed; `None` draws the seed from OS
//! entropy.

use std::fmt;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::{Error, Matrix, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Initialization method for a weight or bias matrix.
pub enum Init {
    /// Xavier/Glorot uniform: `U(-a, a)` with `a = sqrt(6 / (rows + cols))`.
    #[default]
    Xavier,
    /// He/Kaiming uniform: `U(-a, a)` with `a = sqrt(6 / rows)`.
    He,
    Zeros,
    Ones,
    /// `U(-1, 1)`.
    Uniform,
    /// `N(0, 1)`.
    Normal,
}

impl FromStr for Init {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xavier" | "glorot" => Ok(Init::Xavier),
            "he" | "kaiming" => Ok(Init::He),
            "zeros" | "zero" => Ok(Init::Zeros),
            "ones" | "one" => Ok(Init::Ones),
            "uniform" => Ok(Init::Uniform),
            "normal" | "gaussian" => Ok(Init::Normal),
            other => Err(Error::InvalidConfig(format!(
                "unknown init method {other:?}; expected one of xavier, he, zeros, ones, uniform, normal"
            ))),
        }
    }
}

impl fmt::Display for Init {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Init::Xavier => "xavier",
            Init::He => "he",
            Init::Zeros => "zeros",
            Init::Ones => "ones",
            Init::Uniform => "uniform",
            Init::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// Build a `rows x cols` matrix using `method`.
pub fn init_params(rows: usize, cols: usize, method: Init, seed: Option<u64>) -> Matrix {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    init_params_with_rng(rows, cols, method, &mut rng)
}

/// Same as [`init_params`], drawing from the provided RNG.
pub fn init_params_with_rng<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    method: Init,
    rng: &mut R,
) -> Matrix {
    let len = rows * cols;
    let data: Vec<f32> = match method {
        Init::Zeros => vec![0.0; len],
        Init::Ones => vec![1.0; len],
        Init::Xavier => {
            let limit = (6.0 / (rows + cols).max(1) as f32).sqrt();
            sample_uniform(len, limit, rng)
        }
        Init::He => {
            let limit = (6.0 / rows.max(1) as f32).sqrt();
            sample_uniform(len, limit, rng)
        }
        Init::Uniform => sample_uniform(len, 1.0, rng),
        Init::Normal => (0..len)
            .map(|_| {
                let v: f32 = StandardNormal.sample(rng);
                v
            })
            .collect(),
    };

    Matrix::from_vec(rows, cols, data).expect("init buffer is rows * cols long")
}

fn sample_uniform<R: Rng + ?Sized>(len: usize, limit: f32, rng: &mut R) -> Vec<f32> {
    let dist = Uniform::new_inclusive(-limit, limit);
    (0..len).map(|_| dist.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_init_is_deterministic() {
        let a = init_params(3, 4, Init::Xavier, Some(7));
        let b = init_params(3, 4, Init::Xavier, Some(7));
        assert_eq!(a, b);

        let c = init_params(3, 4, Init::Normal, Some(7));
        let d = init_params(3, 4, Init::Normal, Some(7));
        assert_eq!(c, d);
    }

    #[test]
    fn xavier_stays_within_bounds() {
        let m = init_params(10, 5, Init::Xavier, Some(0));
        let limit = (6.0_f32 / 15.0).sqrt();
        assert_eq!(m.shape(), (10, 5));
        assert!(m.as_slice().iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn constant_methods() {
        assert!(init_params(1, 3, Init::Zeros, None).as_slice().iter().all(|&v| v == 0.0));
        assert!(init_params(2, 2, Init::Ones, None).as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn parses_method_names() {
        assert_eq!("Xavier".parse::<Init>().unwrap(), Init::Xavier);
        assert_eq!("zeros".parse::<Init>().unwrap(), Init::Zeros);
        assert!(matches!(
            "orthogonal".parse::<Init>(),
            Err(Error::InvalidConfig(_))
        ));
    }
}

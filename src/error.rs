use thiserror::Error;

/// Shape of a matrix as `(rows, cols)`.
pub type Shape = (usize, usize);

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid shape for {context}: expected {expected:?}, got {got:?}")]
    Shape {
        context: String,
        expected: Shape,
        got: Shape,
    },

    #[error("layer index {index} is out of range: valid layers are 0..={}", .len.saturating_sub(1))]
    LayerIndex { index: usize, len: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(context: impl Into<String>, expected: Shape, got: Shape) -> Self {
        Error::Shape {
            context: context.into(),
            expected,
            got,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_error_names_both_shapes() {
        let err = Error::shape("weights", (2, 1), (1, 2));
        let msg = err.to_string();
        assert!(msg.contains("(2, 1)"), "{msg}");
        assert!(msg.contains("(1, 2)"), "{msg}");
    }

    #[test]
    fn layer_index_error_names_valid_range() {
        let err = Error::LayerIndex { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "layer index 3 is out of range: valid layers are 0..=1"
        );
    }
}

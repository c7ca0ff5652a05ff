use thiserror::Error;

/// Error type for invalid P-model computations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PModelError {
    #[error("Shape mismatch in {context}: shapes {} cannot be broadcast together", format_shapes(.shapes))]
    ShapeMismatch {
        context: &'static str,
        shapes: Vec<Vec<usize>>,
    },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Closure method `{method}` cannot be used with the {pathway} pathway")]
    IncompatibleMethod { method: String, pathway: String },
}

fn format_shapes(shapes: &[Vec<usize>]) -> String {
    shapes
        .iter()
        .map(|s| format!("{:?}", s))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type for `Result<T, PModelError>`.
pub type PModelResult<T> = Result<T, PModelError>;

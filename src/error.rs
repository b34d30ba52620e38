/// Error constructing or reading a column table
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("column {name:?} is missing from the table")]
    MissingColumn { name: String },

    #[error("column {name:?} has {actual} rows while the table has {expected}")]
    ColumnLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("flux matrix has {columns} columns for {filters} filters")]
    ColumnCountMismatch { filters: usize, columns: usize },
}

/// Error returned from [crate::AstNoiseModel] construction and evaluation
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoiseModelError {
    #[error("model group has {usable} usable AST instances, {required} required")]
    InsufficientData { usable: usize, required: usize },

    #[error("model grid has {grid} filters while the noise model was built with {model}")]
    DimensionMismatch { grid: usize, model: usize },

    #[error("interpolated covariance matrix is singular or non-positive-definite for model {model}")]
    SingularCovariance { model: usize },

    #[error("no model group has enough usable AST instances")]
    EmptyModelSet,

    #[error("no reference flux is known for filter {filter:?}")]
    UnknownFilter { filter: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

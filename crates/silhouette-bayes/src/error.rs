/// An error type for the bayes module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BayesError {
    /// A feature vector does not have the dimension of the model.
    #[error("Feature vector has dimension {actual}, expected {expected}")]
    InvalidDimension {
        /// The dimension of the model.
        expected: usize,
        /// The dimension of the offending vector.
        actual: usize,
    },

    /// The covariance matrix is singular or not positive definite.
    #[error("Covariance matrix is not invertible (determinant {0:e})")]
    DegenerateModel(f64),

    /// The covariance matrix is not symmetric.
    #[error("Covariance matrix is not symmetric at ({row}, {col})")]
    AsymmetricCovariance {
        /// The row of the first asymmetric entry.
        row: usize,
        /// The column of the first asymmetric entry.
        col: usize,
    },

    /// Not enough samples to estimate the class parameters.
    #[error("At least 2 samples are needed to estimate a covariance, got {0}")]
    InsufficientSamples(usize),

    /// The prior probability is outside of (0, 1].
    #[error("Prior probability must lie in (0, 1], got {0}")]
    InvalidPrior(f64),

    /// The rejection threshold is outside of [0, 1].
    #[error("Rejection threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// A feature vector or model parameter is NaN or infinite.
    #[error("Feature vectors and model parameters must be finite")]
    NonFinite,

    /// No class models were given.
    #[error("No class models were given")]
    EmptyModelSet,

    /// The estimation of one class failed.
    #[error("Failed to estimate class {label}: {source}")]
    ClassEstimation {
        /// The label of the failing class.
        label: String,
        /// The reason of the failure.
        #[source]
        source: Box<BayesError>,
    },
}

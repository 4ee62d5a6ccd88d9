#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Classification decision over a set of class models.
pub mod classifier;

/// Discriminant functions.
pub mod discriminant;

/// Error types for the bayes module.
pub mod error;

/// Class labels of the traffic-sign shapes.
pub mod label;

/// Gaussian class models and their estimation from training samples.
pub mod model;

pub use crate::classifier::{classify, ClassifierConfig, Decision, GaussianClassifier};
pub use crate::discriminant::{
    discriminant, discriminant_isotropic, mahalanobis_squared, DiscriminantKind,
};
pub use crate::error::BayesError;
pub use crate::label::ShapeClass;
pub use crate::model::{estimate, ClassModel, FeatureVector, Priors, TrainingSet};

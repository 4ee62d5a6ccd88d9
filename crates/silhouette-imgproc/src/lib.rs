#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// utilities to draw filled shapes on images.
pub mod draw;

/// shape descriptors extracted from binary silhouettes.
pub mod features;

/// image moments and Hu invariants.
pub mod moments;

/// module containing parallization utilities.
pub mod parallel;

/// operations to threshold images.
pub mod threshold;

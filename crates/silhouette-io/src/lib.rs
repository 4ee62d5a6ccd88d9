#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Reading and writing 2-D numeric arrays.
///
/// One array holds the feature vectors of one class, a row per sample.
/// See [`array::read_array2`] for the supported formats.
pub mod array;

/// Error types for I/O operations.
pub mod error;

/// High-level image reading and writing functions.
pub mod functional;

pub use crate::error::IoError;

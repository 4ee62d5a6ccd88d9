/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Invalid file extension.
    #[error("File does not have a supported extension: {0}")]
    InvalidFileExtension(std::path::PathBuf),

    /// Error to open, read or write the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] silhouette_image::ImageError),

    /// Error to decode or encode the image.
    #[error("Failed to decode the image. {0}")]
    ImageDecodeError(#[from] image::ImageError),

    /// Error to parse a value of a text array.
    #[error("Failed to parse line {line}: {message}")]
    ArrayParse {
        /// The line number, starting at 1.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The header of a npy file is malformed.
    #[error("Invalid npy header. {0}")]
    InvalidNpyHeader(String),

    /// The npy element type is not supported.
    #[error("Unsupported npy dtype: {0}")]
    UnsupportedDtype(String),

    /// The npy data is shorter than its shape requires.
    #[error("Truncated npy data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        /// The number of bytes the shape requires.
        expected: usize,
        /// The number of bytes found.
        actual: usize,
    },

    /// The rows of the array do not share one length.
    #[error("Row {row} has {actual} values, expected {expected}")]
    RaggedArray {
        /// The index of the offending row, starting at 0.
        row: usize,
        /// The length of the first row.
        expected: usize,
        /// The length of the offending row.
        actual: usize,
    },

    /// Error to parse a JSON array.
    #[error("Failed to parse the json array. {0}")]
    JsonError(#[from] serde_json::Error),
}

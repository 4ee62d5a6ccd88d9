use silhouette_image::{Image, ImageError};

use crate::{color, moments, threshold};

/// Indices of the Hu moments used to describe a traffic-sign silhouette: h1 and h2.
pub const SHAPE_HU_INDICES: [usize; 2] = [0, 1];

/// An error type for the shape features module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FeatureError {
    /// The binary silhouette has no foreground pixels.
    #[error("The silhouette has no foreground pixels")]
    EmptyForeground,

    /// A requested Hu moment does not exist.
    #[error("Hu moment index {0} is out of range, expected 0..7")]
    InvalidHuIndex(usize),

    /// Error from the underlying image operation.
    #[error(transparent)]
    ImageError(#[from] ImageError),
}

/// How the foreground is separated from the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SilhouetteThreshold {
    /// Use a fixed gray level.
    Fixed(u8),
    /// Pick the gray level with Otsu's method.
    #[default]
    Otsu,
}

/// Segment an RGB image into a binary silhouette.
///
/// The image is converted to grayscale and thresholded. Foreground pixels are 255 and
/// background pixels are 0.
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `threshold` - The thresholding strategy.
/// * `invert` - If true, dark pixels are the foreground (dark shape on a light background).
///
/// # Returns
///
/// The binary silhouette.
pub fn silhouette_from_rgb(
    src: &Image<u8, 3>,
    threshold: SilhouetteThreshold,
    invert: bool,
) -> Result<Image<u8, 1>, FeatureError> {
    let mut gray = Image::<u8, 1>::from_size_val(src.size(), 0)?;
    color::gray_from_rgb_u8(src, &mut gray)?;

    let level = match threshold {
        SilhouetteThreshold::Fixed(level) => level,
        SilhouetteThreshold::Otsu => threshold::otsu_threshold(&gray),
    };

    let mut binary = Image::<u8, 1>::from_size_val(src.size(), 0)?;
    if invert {
        threshold::threshold_binary_inverse(&gray, &mut binary, level, 255)?;
    } else {
        threshold::threshold_binary(&gray, &mut binary, level, 255)?;
    }

    Ok(binary)
}

/// Describe a binary silhouette with a selection of its Hu moments.
///
/// # Arguments
///
/// * `src` - The binary silhouette, non-zero pixels are the foreground.
/// * `indices` - The zero based indices of the Hu moments to keep, in output order.
///
/// # Returns
///
/// The selected Hu moments.
///
/// # Errors
///
/// Fails when an index is not in `0..7` or when the silhouette is empty.
pub fn hu_features<const N: usize>(
    src: &Image<u8, 1>,
    indices: [usize; N],
) -> Result<[f64; N], FeatureError> {
    if let Some(&index) = indices.iter().find(|&&i| i >= 7) {
        return Err(FeatureError::InvalidHuIndex(index));
    }

    let m = moments::moments(src, true);
    if m.m00 == 0.0 {
        return Err(FeatureError::EmptyForeground);
    }

    let hu = moments::hu_moments(&m);

    Ok(indices.map(|i| hu[i]))
}

/// Describe a binary silhouette with its first two Hu moments.
///
/// This is the two dimensional feature vector used to tell triangles, circles and
/// squares apart.
pub fn shape_features(src: &Image<u8, 1>) -> Result<[f64; 2], FeatureError> {
    hu_features(src, SHAPE_HU_INDICES)
}

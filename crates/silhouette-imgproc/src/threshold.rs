use num_traits::Zero;

use silhouette_image::{Image, ImageError};

use crate::parallel;

/// Apply a binary threshold to an image.
///
/// # Arguments
///
/// * `src` - The input image of an arbitrary number of channels and type.
/// * `dst` - The output image of an arbitrary number of channels and type.
/// * `threshold` - The threshold value. Must be the same type as the image.
/// * `max_value` - The maximum value to use when the input value is greater than the threshold.
///
/// # Examples
///
/// ```
/// use silhouette_image::{Image, ImageSize};
/// use silhouette_imgproc::threshold::threshold_binary;
///
/// let data = vec![100u8, 200, 50, 150, 200, 250];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// let mut thresholded = Image::<_, 1>::from_size_val(image.size(), 0).unwrap();
///
/// threshold_binary(&image, &mut thresholded, 100, 255).unwrap();
/// assert_eq!(thresholded.as_slice(), &[0, 255, 0, 255, 255, 255]);
/// ```
pub fn threshold_binary<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    parallel::ensure_same_size(src, dst)?;

    parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
        *dst_pixel = if *src_pixel > threshold {
            max_value
        } else {
            T::zero()
        };
    });

    Ok(())
}

/// Apply an inverse binary threshold to an image.
///
/// Pixels above the threshold become zero, the rest become `max_value`. Useful for dark
/// shapes drawn on a light background.
///
/// # Arguments
///
/// * `src` - The input image of an arbitrary number of channels and type.
/// * `dst` - The output image of an arbitrary number of channels and type.
/// * `threshold` - The threshold value. Must be the same type as the image.
/// * `max_value` - The value to use when the input value is less than or equal to the threshold.
pub fn threshold_binary_inverse<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    parallel::ensure_same_size(src, dst)?;

    parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
        *dst_pixel = if *src_pixel > threshold {
            T::zero()
        } else {
            max_value
        };
    });

    Ok(())
}

/// Compute the Otsu threshold of an 8-bit single channel image.
///
/// The returned value maximizes the between-class variance of the two pixel populations
/// split at it. Pass it to [`threshold_binary`] or [`threshold_binary_inverse`].
///
/// # Arguments
///
/// * `src` - The input grayscale image.
///
/// # Returns
///
/// The threshold value. Uniform images return 0.
///
/// # Examples
///
/// ```
/// use silhouette_image::{Image, ImageSize};
/// use silhouette_imgproc::threshold::otsu_threshold;
///
/// let data = vec![100u8, 200, 50, 150, 200, 250];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// assert_eq!(otsu_threshold(&image), 100);
/// ```
pub fn otsu_threshold(src: &Image<u8, 1>) -> u8 {
    const BINS: usize = 256;
    let mut histogram = [0u32; BINS];

    for &pixel in src.as_slice() {
        histogram[pixel as usize] += 1;
    }

    let total_pixels = src.as_slice().len() as f64;

    let sum_total = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum::<f64>();

    let mut best_variance = 0.0;
    let mut best_threshold = 0;

    let mut weight_back = 0.0;
    let mut sum_back = 0.0;

    for (current_threshold, &hist_count) in histogram.iter().enumerate() {
        weight_back += hist_count as f64;
        sum_back += current_threshold as f64 * hist_count as f64;

        // skip empty classes
        if weight_back == 0.0 || weight_back == total_pixels {
            continue;
        }

        let weight_fore = total_pixels - weight_back;
        let mean_back = sum_back / weight_back;
        let mean_fore = (sum_total - sum_back) / weight_fore;

        let variance = weight_back * weight_fore * (mean_back - mean_fore).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = current_threshold as u8;
        }
    }

    log::debug!("otsu threshold: {best_threshold}");

    best_threshold
}

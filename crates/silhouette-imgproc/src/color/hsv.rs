use crate::parallel;
use silhouette_image::{Image, ImageError};

/// Convert an RGB image to an HSV image.
///
/// The input image is assumed to have 3 channels in the order R, G, B with values in [0, 255].
///
/// # Arguments
///
/// * `src` - The input RGB image assumed to have 3 channels.
/// * `dst` - The output HSV image.
///
/// # Returns
///
/// The HSV image with the following channels:
///
/// * H: The hue channel in the range [0, 255] (0-360 degrees).
/// * S: The saturation channel in the range [0, 255].
/// * V: The value channel in the range [0, 255].
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use silhouette_image::{Image, ImageSize};
/// use silhouette_imgproc::color::hsv_from_rgb;
///
/// let image = Image::<f32, 3>::new(
///     ImageSize {
///        width: 4,
///        height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let mut hsv = Image::<f32, 3>::from_size_val(image.size(), 0.0).unwrap();
///
/// hsv_from_rgb(&image, &mut hsv).unwrap();
///
/// assert_eq!(hsv.num_channels(), 3);
/// assert_eq!(hsv.size().width, 4);
/// assert_eq!(hsv.size().height, 5);
/// ```
pub fn hsv_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    parallel::ensure_same_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        // normalize the input to the range [0, 1]
        let r = src_pixel[0] / 255.;
        let g = src_pixel[1] / 255.;
        let b = src_pixel[2] / 255.;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta) % 6.0)
        } else if max == g {
            60.0 * (((b - r) / delta) + 2.0)
        } else {
            60.0 * (((r - g) / delta) + 4.0)
        };

        // ensure h is in the range [0, 360)
        let h = if h < 0.0 { h + 360.0 } else { h };

        let s = if max == 0.0 {
            0.0
        } else {
            (delta / max) * 255.0
        };

        dst_pixel[0] = (h / 360.0) * 255.0;
        dst_pixel[1] = s;
        dst_pixel[2] = max * 255.0;
    });

    Ok(())
}

/// Convert an HSV image back to an RGB image.
///
/// The channels of the input follow the convention of [`hsv_from_rgb`]: all of them are
/// in the range [0, 255], the hue channel mapping linearly to 0-360 degrees.
///
/// # Arguments
///
/// * `src` - The input HSV image.
/// * `dst` - The output RGB image with values in [0, 255].
///
/// Precondition: the input and output images must have the same size.
pub fn rgb_from_hsv(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    parallel::ensure_same_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let h = (src_pixel[0] / 255.0) * 360.0;
        let s = src_pixel[1] / 255.0;
        let v = src_pixel[2] / 255.0;

        let chroma = v * s;
        let h_prime = (h / 60.0) % 6.0;
        let x = chroma * (1.0 - ((h_prime % 2.0) - 1.0).abs());

        let (r, g, b) = match h_prime as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let m = v - chroma;
        dst_pixel[0] = (r + m) * 255.0;
        dst_pixel[1] = (g + m) * 255.0;
        dst_pixel[2] = (b + m) * 255.0;
    });

    Ok(())
}

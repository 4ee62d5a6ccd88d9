use crate::parallel;
use silhouette_image::{Image, ImageError};

/// Define the RGB weights for the grayscale conversion.
const RW: f64 = 0.299;
const GW: f64 = 0.587;
const BW: f64 = 0.114;

/// Convert an RGB image to grayscale using the formula:
///
/// Y = 0.299 * R + 0.587 * G + 0.114 * B
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output grayscale image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use silhouette_image::{Image, ImageSize};
/// use silhouette_imgproc::color::gray_from_rgb;
///
/// let image = Image::<f32, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let mut gray = Image::<f32, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// gray_from_rgb(&image, &mut gray).unwrap();
/// assert_eq!(gray.num_channels(), 1);
/// assert_eq!(gray.size().width, 4);
/// assert_eq!(gray.size().height, 5);
/// ```
pub fn gray_from_rgb<T>(src: &Image<T, 3>, dst: &mut Image<T, 1>) -> Result<(), ImageError>
where
    T: Send + Sync + num_traits::Float,
{
    parallel::ensure_same_size(src, dst)?;

    let rw = T::from(RW).ok_or(ImageError::CastError)?;
    let gw = T::from(GW).ok_or(ImageError::CastError)?;
    let bw = T::from(BW).ok_or(ImageError::CastError)?;

    // parallelize the grayscale conversion by rows
    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let r = src_pixel[0];
        let g = src_pixel[1];
        let b = src_pixel[2];
        dst_pixel[0] = rw * r + gw * g + bw * b;
    });

    Ok(())
}

/// Convert an RGB8 image to grayscale using the fixed point formula:
///
/// Y = (77 * R + 150 * G + 29 * B) >> 8
///
/// # Arguments
///
/// * `src` - The input RGB8 image.
/// * `dst` - The output grayscale image.
///
/// Precondition: the input and output images must have the same size.
pub fn gray_from_rgb_u8(src: &Image<u8, 3>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    parallel::ensure_same_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let r = src_pixel[0] as u16;
        let g = src_pixel[1] as u16;
        let b = src_pixel[2] as u16;
        dst_pixel[0] = ((r * 77 + g * 150 + b * 29) >> 8) as u8;
    });

    Ok(())
}

/// Convert an RGB image to BGR by swapping the red and blue channels.
///
/// The same function converts BGR back to RGB.
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output BGR image.
///
/// Precondition: the input and output images must have the same size.
pub fn bgr_from_rgb<T>(src: &Image<T, 3>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    parallel::ensure_same_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = src_pixel[2];
        dst_pixel[1] = src_pixel[1];
        dst_pixel[2] = src_pixel[0];
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use silhouette_image::{Image, ImageError, ImageSize};

    #[test]
    fn gray_from_rgb() -> Result<(), ImageError> {
        let image = Image::<f64, 3>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![1.0, 0.0, 0.0, 0.5, 0.5, 0.5],
        )?;

        let mut gray = Image::<f64, 1>::from_size_val(image.size(), 0.0)?;
        super::gray_from_rgb(&image, &mut gray)?;

        approx::assert_abs_diff_eq!(gray.as_slice()[0], 0.299, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(gray.as_slice()[1], 0.5, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn gray_from_rgb_u8() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 3,
                height: 1,
            },
            vec![0, 0, 0, 255, 255, 255, 255, 0, 0],
        )?;

        let mut gray = Image::<u8, 1>::from_size_val(image.size(), 0)?;
        super::gray_from_rgb_u8(&image, &mut gray)?;

        assert_eq!(gray.as_slice(), &[0, 255, 76]);

        Ok(())
    }

    #[test]
    fn gray_size_mismatch() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_size_val([4, 4].into(), 0)?;
        let mut gray = Image::<u8, 1>::from_size_val([4, 3].into(), 0)?;

        assert_eq!(
            super::gray_from_rgb_u8(&image, &mut gray),
            Err(ImageError::InvalidImageSize(4, 4, 4, 3))
        );

        Ok(())
    }

    #[test]
    fn bgr_from_rgb() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 1,
                height: 2,
            },
            vec![1, 2, 3, 4, 5, 6],
        )?;

        let mut bgr = Image::<u8, 3>::from_size_val(image.size(), 0)?;
        super::bgr_from_rgb(&image, &mut bgr)?;

        assert_eq!(bgr.as_slice(), &[3, 2, 1, 6, 5, 4]);

        Ok(())
    }
}

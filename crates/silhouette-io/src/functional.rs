use std::path::Path;

use silhouette_image::{Image, ImageSize};

use crate::error::IoError;

/// Reads an image from the given file path and converts it to 8-bit RGB.
///
/// The method tries to read from any image format supported by the image crate.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB image containing the image data.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let img = image::ImageReader::open(&file_path)?
        .with_guessed_format()?
        .decode()?
        .into_rgb8();

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    log::debug!("decoded {} image from {}", size, file_path.display());

    Ok(Image::new(size, img.into_raw())?)
}

/// Writes a grayscale image to the given file path.
///
/// The format is chosen from the file extension by the image crate.
///
/// # Arguments
///
/// * `file_path` - The path to the image file.
/// * `image` - The grayscale image to write.
pub fn write_image_gray8(file_path: impl AsRef<Path>, image: &Image<u8, 1>) -> Result<(), IoError> {
    let [width, height]: [u32; 2] = image.size().into();
    image::save_buffer(
        file_path,
        image.as_slice(),
        width,
        height,
        image::ExtendedColorType::L8,
    )?;

    Ok(())
}

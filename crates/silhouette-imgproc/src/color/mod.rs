mod gray;
mod hsv;

pub use gray::{bgr_from_rgb, gray_from_rgb, gray_from_rgb_u8};
pub use hsv::{hsv_from_rgb, rgb_from_hsv};

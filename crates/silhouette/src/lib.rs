#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use silhouette_bayes as bayes;

#[doc(inline)]
pub use silhouette_image as image;

#[doc(inline)]
pub use silhouette_imgproc as imgproc;

#[doc(inline)]
pub use silhouette_io as io;

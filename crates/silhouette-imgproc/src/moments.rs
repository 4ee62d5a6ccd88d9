use silhouette_image::Image;

/// Image moments up to the third order.
///
/// Coordinates follow the image convention: `x` is the column index and `y` the row index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    /// Spatial moment m00, the area of a binary region.
    pub m00: f64,
    /// Spatial moment m10.
    pub m10: f64,
    /// Spatial moment m01.
    pub m01: f64,
    /// Spatial moment m20.
    pub m20: f64,
    /// Spatial moment m11.
    pub m11: f64,
    /// Spatial moment m02.
    pub m02: f64,
    /// Spatial moment m30.
    pub m30: f64,
    /// Spatial moment m21.
    pub m21: f64,
    /// Spatial moment m12.
    pub m12: f64,
    /// Spatial moment m03.
    pub m03: f64,
    /// Central moment mu20.
    pub mu20: f64,
    /// Central moment mu11.
    pub mu11: f64,
    /// Central moment mu02.
    pub mu02: f64,
    /// Central moment mu30.
    pub mu30: f64,
    /// Central moment mu21.
    pub mu21: f64,
    /// Central moment mu12.
    pub mu12: f64,
    /// Central moment mu03.
    pub mu03: f64,
    /// Normalized central moment nu20.
    pub nu20: f64,
    /// Normalized central moment nu11.
    pub nu11: f64,
    /// Normalized central moment nu02.
    pub nu02: f64,
    /// Normalized central moment nu30.
    pub nu30: f64,
    /// Normalized central moment nu21.
    pub nu21: f64,
    /// Normalized central moment nu12.
    pub nu12: f64,
    /// Normalized central moment nu03.
    pub nu03: f64,
}

impl Moments {
    /// The centroid (x, y) of the region, or `None` when the region is empty.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Compute the spatial, central and normalized central moments of a single channel image.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `binary` - If true, every non-zero pixel counts as 1 so the moments describe the shape
///   of the foreground region only.
///
/// # Returns
///
/// The moments of the image. Central and normalized moments are zero when `m00` is zero.
///
/// # Examples
///
/// ```
/// use silhouette_image::{Image, ImageSize};
/// use silhouette_imgproc::moments::moments;
///
/// let image = Image::<u8, 1>::new(
///     ImageSize { width: 3, height: 2 },
///     vec![0, 255, 0, 0, 255, 0],
/// ).unwrap();
///
/// let m = moments(&image, true);
/// assert_eq!(m.m00, 2.0);
/// assert_eq!(m.centroid(), Some((1.0, 0.5)));
/// ```
pub fn moments<T>(src: &Image<T, 1>, binary: bool) -> Moments
where
    T: Copy + Into<f64>,
{
    let mut m = Moments::default();

    let cols = src.cols();
    if cols == 0 {
        return m;
    }

    // accumulate per row sums first, then fold them with the row coordinate
    for (y, row) in src.as_slice().chunks_exact(cols).enumerate() {
        let (mut x0, mut x1, mut x2, mut x3) = (0.0, 0.0, 0.0, 0.0);
        for (x, &pixel) in row.iter().enumerate() {
            let value: f64 = pixel.into();
            let p = if binary {
                if value != 0.0 {
                    1.0
                } else {
                    continue;
                }
            } else {
                value
            };

            let xf = x as f64;
            let xp = xf * p;
            let xxp = xf * xp;
            x0 += p;
            x1 += xp;
            x2 += xxp;
            x3 += xf * xxp;
        }

        let py = y as f64;
        let sq_y = py * py;

        m.m00 += x0;
        m.m10 += x1;
        m.m01 += x0 * py;
        m.m20 += x2;
        m.m11 += x1 * py;
        m.m02 += x0 * sq_y;
        m.m30 += x3;
        m.m21 += x2 * py;
        m.m12 += x1 * sq_y;
        m.m03 += x0 * sq_y * py;
    }

    let Some((cx, cy)) = m.centroid() else {
        return m;
    };

    m.mu20 = m.m20 - m.m10 * cx;
    m.mu11 = m.m11 - m.m10 * cy;
    m.mu02 = m.m02 - m.m01 * cy;
    m.mu30 = m.m30 - cx * (3.0 * m.mu20 + cx * m.m10);
    m.mu21 = m.m21 - cx * (2.0 * m.mu11 + cx * m.m01) - cy * m.mu20;
    m.mu12 = m.m12 - cy * (2.0 * m.mu11 + cy * m.m10) - cx * m.mu02;
    m.mu03 = m.m03 - cy * (3.0 * m.mu02 + cy * m.m01);

    // nu_pq = mu_pq / m00^((p + q) / 2 + 1)
    let inv_m00 = 1.0 / m.m00;
    let s2 = inv_m00 * inv_m00;
    let s3 = s2 * inv_m00.sqrt();

    m.nu20 = m.mu20 * s2;
    m.nu11 = m.mu11 * s2;
    m.nu02 = m.mu02 * s2;
    m.nu30 = m.mu30 * s3;
    m.nu21 = m.mu21 * s3;
    m.nu12 = m.mu12 * s3;
    m.nu03 = m.mu03 * s3;

    m
}

/// Compute the seven Hu invariants from the normalized central moments.
///
/// The invariants are unchanged by translation, scale and rotation of the shape. The
/// seventh one changes sign under reflection.
///
/// # Arguments
///
/// * `m` - The moments of the shape, see [`moments`].
///
/// # Returns
///
/// The Hu moments `[h1, h2, ..., h7]`.
pub fn hu_moments(m: &Moments) -> [f64; 7] {
    let t0 = m.nu30 + m.nu12;
    let t1 = m.nu21 + m.nu03;

    let q0 = t0 * t0;
    let q1 = t1 * t1;

    let n4 = 4.0 * m.nu11;
    let s = m.nu20 + m.nu02;
    let d = m.nu20 - m.nu02;

    let h1 = s;
    let h2 = d * d + n4 * m.nu11;
    let h4 = q0 + q1;
    let h6 = d * (q0 - q1) + n4 * t0 * t1;

    let t0 = t0 * (q0 - 3.0 * q1);
    let t1 = t1 * (3.0 * q0 - q1);

    let q0 = m.nu30 - 3.0 * m.nu12;
    let q1 = 3.0 * m.nu21 - m.nu03;

    let h3 = q0 * q0 + q1 * q1;
    let h5 = q0 * t0 + q1 * t1;
    let h7 = q1 * t0 - q0 * t1;

    [h1, h2, h3, h4, h5, h6, h7]
}

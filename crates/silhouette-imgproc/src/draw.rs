use silhouette_image::Image;

/// Helper function to set a pixel's color, handling bounds checking.
#[inline]
fn set_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x >= 0 && x < img.cols() as i64 && y >= 0 && y < img.rows() as i64 {
        let start = (y as usize * img.cols() + x as usize) * C;
        img.as_slice_mut()[start..start + C].copy_from_slice(&color);
    }
}

/// Clamp the floating point bounds `[lo, hi]` to valid pixel indices in `[0, len)`.
fn pixel_range(lo: f64, hi: f64, len: usize) -> std::ops::Range<i64> {
    let start = lo.floor().max(0.0) as i64;
    let end = (hi.ceil() + 1.0).min(len as f64) as i64;
    start..end.max(start)
}

/// Draws a filled polygon on an image inplace.
///
/// A pixel `(x, y)` is filled when its integer coordinate lies inside the polygon according
/// to the even-odd rule. Vertices may be given in either winding order.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `vertices` - The polygon vertices as (x, y) coordinates.
/// * `color` - The fill color.
///
/// # Examples
///
/// ```
/// use silhouette_image::Image;
/// use silhouette_imgproc::draw::fill_polygon;
///
/// let mut img = Image::<u8, 1>::from_size_val([5, 5].into(), 0).unwrap();
/// fill_polygon(&mut img, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)], [255]);
///
/// assert_eq!(img.get(2, 2, 0), Some(&255));
/// assert_eq!(img.get(4, 4, 0), Some(&0));
/// ```
pub fn fill_polygon<const C: usize>(
    img: &mut Image<u8, C>,
    vertices: &[(f64, f64)],
    color: [u8; C],
) {
    if vertices.len() < 3 {
        return;
    }

    let (min_x, max_x, min_y, max_y) = vertices.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(min_x, max_x, min_y, max_y), &(x, y)| {
            (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
        },
    );

    for y in pixel_range(min_y, max_y, img.rows()) {
        let py = y as f64;
        for x in pixel_range(min_x, max_x, img.cols()) {
            let px = x as f64;

            // even-odd crossing test, with the half-open rule on the y-span of each edge
            let mut inside = false;
            let mut j = vertices.len() - 1;
            for (i, &(xi, yi)) in vertices.iter().enumerate() {
                let (xj, yj) = vertices[j];
                if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }

            if inside {
                set_pixel(img, x, y, color);
            }
        }
    }
}

/// Draws a filled circle on an image inplace.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `center` - The circle center as (x, y) coordinates. Sub-pixel centers are allowed.
/// * `radius` - The circle radius in pixels.
/// * `color` - The fill color.
pub fn fill_circle<const C: usize>(
    img: &mut Image<u8, C>,
    center: (f64, f64),
    radius: f64,
    color: [u8; C],
) {
    let (cx, cy) = center;
    let radius_sq = radius * radius;

    for y in pixel_range(cy - radius, cy + radius, img.rows()) {
        let dy = y as f64 - cy;
        for x in pixel_range(cx - radius, cx + radius, img.cols()) {
            let dx = x as f64 - cx;
            if dx * dx + dy * dy <= radius_sq {
                set_pixel(img, x, y, color);
            }
        }
    }
}

/// Compute the vertices of a regular polygon.
///
/// # Arguments
///
/// * `center` - The polygon center as (x, y) coordinates.
/// * `circumradius` - The distance from the center to every vertex.
/// * `num_sides` - The number of sides, e.g. 3 for a triangle and 4 for a square.
/// * `rotation` - The rotation of the first vertex in radians, measured from the x axis.
pub fn regular_polygon(
    center: (f64, f64),
    circumradius: f64,
    num_sides: usize,
    rotation: f64,
) -> Vec<(f64, f64)> {
    (0..num_sides)
        .map(|k| {
            let angle = rotation + 2.0 * std::f64::consts::PI * k as f64 / num_sides as f64;
            (
                center.0 + circumradius * angle.cos(),
                center.1 + circumradius * angle.sin(),
            )
        })
        .collect()
}

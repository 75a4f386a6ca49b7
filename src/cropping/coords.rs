use crate::error::{Result, UvCropperError};
use crate::types::{PixelBox, UvRect};

/// Pixel values this close to an integer are treated as that integer, so f32
/// UV noise does not widen a box by a whole pixel.
const SNAP_EPSILON: f64 = 1e-3;

fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < SNAP_EPSILON {
        rounded
    } else {
        value
    }
}

/// Convert normalized UV points into a raster-space bounding box.
///
/// UV space has its origin bottom-left with `v` ascending; the returned box
/// has its origin top-left with `y` descending:
/// `ymin = height - max(v·h)`, `ymax = height - min(v·h)`.
/// Minima are floored and maxima ceiled, so the box always encloses the
/// points. UVs outside [0,1] are not clamped here.
pub fn to_pixel_bounds(uv_points: &[[f32; 2]], width: u32, height: u32) -> Result<PixelBox> {
    let rect = UvRect::enclosing(uv_points).ok_or(UvCropperError::EmptyGeometry)?;
    let (w, h) = (width as f64, height as f64);

    let xmin = snap(rect.min[0] * w).floor() as i32;
    let xmax = snap(rect.max[0] * w).ceil() as i32;
    let ymin_up = snap(rect.min[1] * h).floor() as i32;
    let ymax_up = snap(rect.max[1] * h).ceil() as i32;

    let height = height.min(i32::MAX as u32) as i32;
    Ok(PixelBox::new(
        xmin,
        height.saturating_sub(ymax_up),
        xmax,
        height.saturating_sub(ymin_up),
    ))
}

/// Inverse of [`to_pixel_bounds`]: the normalized UV rectangle covered by a
/// raster-space box on a `width x height` image.
pub fn to_uv_extent(bounds: &PixelBox, width: u32, height: u32) -> UvRect {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    UvRect {
        min: [bounds.xmin as f64 / w, (h - bounds.ymax as f64) / h],
        max: [bounds.xmax as f64 / w, (h - bounds.ymin as f64) / h],
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn far_out_of_range_uvs_saturate() {
        let uvs = [[1e10, -1e10], [2e10, 1e10]];
        let b = to_pixel_bounds(&uvs, 1024, 128).unwrap();
        assert_eq!(b.xmin, i32::MAX);
        assert_eq!(b.xmax, i32::MAX);
        assert_eq!(b.ymin, 128 - i32::MAX);
        assert_eq!(b.ymax, i32::MAX);
    }

    #[test]
    fn quad_on_wide_image() {
        let uvs = [[0.0, 0.0], [0.5, 0.0], [0.5, 0.25], [0.0, 0.25]];
        let b = to_pixel_bounds(&uvs, 1024, 128).unwrap();
        assert_eq!(b, PixelBox::new(0, 96, 512, 128));
    }

    #[test]
    fn single_point_brackets_the_pixel() {
        let (u, v, w, h) = (0.3f32, 0.7f32, 10u32, 10u32);
        let b = to_pixel_bounds(&[[u, v]], w, h).unwrap();

        let px = u as f64 * w as f64;
        let py = v as f64 * h as f64;
        assert_eq!(b.xmin, snap(px).floor() as i32);
        assert_eq!(b.xmax, snap(px).ceil() as i32);
        assert_eq!(b.ymin, h as i32 - snap(py).ceil() as i32);
        assert_eq!(b.ymax, h as i32 - snap(py).floor() as i32);
    }

    #[test]
    fn single_point_off_grid() {
        // 0.375 * 16 = 6, 0.40625 * 16 = 6.5
        let b = to_pixel_bounds(&[[0.375, 0.40625]], 16, 16).unwrap();
        assert_eq!(b, PixelBox::new(6, 9, 6, 10));
    }

    #[test]
    fn vertical_flip() {
        // Top strip of UV space maps to the first raster rows.
        let uvs = [[0.0, 0.75], [1.0, 1.0]];
        let b = to_pixel_bounds(&uvs, 8, 8).unwrap();
        assert_eq!(b, PixelBox::new(0, 0, 8, 2));
    }

    #[test]
    fn out_of_range_uvs_are_not_clamped() {
        let uvs = [[-0.5, -0.5], [1.5, 1.25]];
        let b = to_pixel_bounds(&uvs, 8, 8).unwrap();
        assert_eq!(b, PixelBox::new(-4, -2, 12, 12));
    }

    #[test]
    fn float_noise_is_snapped() {
        // 0.1 is not exactly representable; 0.1 * 10 must still be pixel 1.
        let b = to_pixel_bounds(&[[0.1, 0.1], [0.2, 0.2]], 10, 10).unwrap();
        assert_eq!(b, PixelBox::new(1, 8, 2, 9));
    }

    #[test]
    fn empty_points_fail() {
        let err = to_pixel_bounds(&[], 64, 64).unwrap_err();
        assert!(matches!(err, UvCropperError::EmptyGeometry));
    }

    #[test]
    fn roundtrip_through_inverse() {
        let uvs = [[0.125, 0.25], [0.6, 0.9]];
        let (w, h) = (200, 100);
        let b = to_pixel_bounds(&uvs, w, h).unwrap();
        let rect = to_uv_extent(&b, w, h);

        let tol_u = 1.0 / w as f64;
        let tol_v = 1.0 / h as f64;
        assert_abs_diff_eq!(rect.min[0], 0.125, epsilon = tol_u);
        assert_abs_diff_eq!(rect.max[0], 0.6, epsilon = tol_u);
        assert_abs_diff_eq!(rect.min[1], 0.25, epsilon = tol_v);
        assert_abs_diff_eq!(rect.max[1], 0.9, epsilon = tol_v);
    }

    #[test]
    fn inverse_of_exact_box_is_exact() {
        let rect = to_uv_extent(&PixelBox::new(0, 96, 512, 128), 1024, 128);
        assert_eq!(rect.min, [0.0, 0.0]);
        assert_eq!(rect.max, [0.5, 0.25]);
    }
}

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Canvas size that contains `(width, height)` rotated by `angle_degrees`.
///
/// Never smaller than the input in either axis, so a rotated mask can only
/// grow relative to its source.
pub fn expanded_size(width: u32, height: u32, angle_degrees: f32) -> (u32, u32) {
    let (sin, cos) = (angle_degrees as f64).to_radians().sin_cos();
    let (w, h) = (f64::from(width), f64::from(height));
    // Trims float noise so a zero angle keeps the exact size.
    let fit = |extent: f64| (extent - 1e-9).ceil().max(0.0) as u32;

    let new_width = fit(w * cos.abs() + h * sin.abs()).max(width);
    let new_height = fit(w * sin.abs() + h * cos.abs()).max(height);
    (new_width, new_height)
}

/// Rotate counter-clockwise by `angle_degrees` about the centre, expanding
/// the canvas to hold the whole rotated image. Newly exposed area is
/// zero-filled and sampling is nearest-neighbour so binary masks stay binary.
pub fn rotate_expand(image: &GrayImage, angle_degrees: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = expanded_size(width, height, angle_degrees);
    let mut out = GrayImage::new(new_width, new_height);
    if width == 0 || height == 0 {
        return out;
    }

    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (ncx, ncy) = (new_width as f32 / 2.0, new_height as f32 / 2.0);
    // `Projection::rotate` turns clockwise in image coordinates
    let projection = Projection::translate(ncx, ncy)
        * Projection::rotate(-angle_degrees.to_radians())
        * Projection::translate(-cx, -cy);

    warp_into(image, &projection, Interpolation::Nearest, Luma([0u8]), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] == 255).count()
    }

    fn centered_block() -> GrayImage {
        let mut img = GrayImage::new(40, 30);
        for y in 10..20 {
            for x in 15..25 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    #[test]
    fn test_zero_angle_is_identity() {
        let img = centered_block();
        let rotated = rotate_expand(&img, 0.0);
        assert_eq!(rotated, img);
    }

    #[test]
    fn test_canvas_grows_with_angle() {
        assert_eq!(expanded_size(100, 50, 0.0), (100, 50));
        let (w, h) = expanded_size(100, 50, 5.0);
        assert!(w >= 100 && h >= 50);
        assert!(h > 50);
        assert_eq!(expanded_size(100, 50, -5.0), expanded_size(100, 50, 5.0));
        assert_eq!(expanded_size(10, 10, 90.0), (10, 10));
    }

    #[test]
    fn test_extreme_aspect_ratio_never_shrinks() {
        let (w, h) = expanded_size(1000, 1, 5.0);
        assert!(w >= 1000);
        assert!(h >= 1);
    }

    #[test]
    fn test_rotation_keeps_mask_binary_and_roughly_preserves_area() {
        let img = centered_block();
        let rotated = rotate_expand(&img, 4.0);
        let (w, h) = rotated.dimensions();
        assert!(w >= 40 && h >= 30);
        assert!(rotated.pixels().all(|p| p[0] == 0 || p[0] == 255));

        let area = lit(&rotated) as i64;
        assert!((area - 100).abs() <= 20, "area drifted to {area}");
    }

    #[test]
    fn test_rotation_direction_is_counter_clockwise() {
        // A pixel right of centre moves up for a counter-clockwise turn
        let mut img = GrayImage::new(41, 41);
        img.put_pixel(35, 20, Luma([255u8]));
        let rotated = rotate_expand(&img, 90.0);
        let (w, h) = rotated.dimensions();
        let hit = rotated
            .enumerate_pixels()
            .find(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x as i64 - w as i64 / 2, y as i64 - h as i64 / 2));
        let (dx, dy) = hit.expect("rotated pixel should stay on canvas");
        assert!(dx.abs() <= 1, "dx = {dx}");
        assert!(dy < -10, "dy = {dy}");
    }

    #[test]
    fn test_empty_image() {
        let rotated = rotate_expand(&GrayImage::new(0, 0), 3.0);
        assert_eq!(rotated.dimensions(), (0, 0));
    }
}

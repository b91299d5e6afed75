use super::{require_positive, BoxConvention, GeometryError, Point, Rect, Size};

/// Scale and padding that fit an image into a square model tile without distortion.
///
/// The scaled image is centered in the tile; the border left over on the
/// shorter axis is padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LetterboxGeometry {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub original: Size,
    pub target_size: f64,
}

/// Compute the letterbox that fits `original` into a `target_size` square.
///
/// `scale = min(target / width, target / height)`, offsets center the scaled
/// image. Both offsets are zero when the image is already a `target_size` square.
pub fn compute_letterbox(original: Size, target_size: f64) -> Result<LetterboxGeometry, GeometryError> {
    let width = require_positive("original width", original.width)?;
    let height = require_positive("original height", original.height)?;
    let target = require_positive("target size", target_size)?;

    let fit_width = target / width;
    let fit_height = target / height;
    let scale = fit_width.min(fit_height);

    // The limiting axis fills the tile exactly; rounding must not push it negative.
    let (offset_x, offset_y) = if fit_width <= fit_height {
        (0.0, ((target - height * scale) / 2.0).max(0.0))
    } else {
        (((target - width * scale) / 2.0).max(0.0), 0.0)
    };

    Ok(LetterboxGeometry {
        scale,
        offset_x,
        offset_y,
        original,
        target_size: target,
    })
}

impl LetterboxGeometry {
    /// Size of the image once scaled into the tile.
    pub fn scaled_size(&self) -> Size {
        Size::new(self.original.width * self.scale, self.original.height * self.scale)
    }

    /// Padding in tile pixels.
    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    /// Padding expressed in the space of [`map_to_image_coordinates`](super::map_to_image_coordinates).
    ///
    /// The mapper multiplies normalized coordinates by `image_size`, so the
    /// padding fraction of the tile is scaled the same way.
    pub fn offset_for(&self, image_size: Size) -> Result<Point, GeometryError> {
        let width = require_positive("image width", image_size.width)?;
        let height = require_positive("image height", image_size.height)?;
        Ok(Point::new(
            self.offset_x / self.target_size * width,
            self.offset_y / self.target_size * height,
        ))
    }

    /// Exact inverse letterbox: normalized tile box to original-image pixels.
    ///
    /// Output is top-left based and not clamped to the image.
    pub fn unletterbox(&self, tile_box: Rect, convention: BoxConvention) -> Result<Rect, GeometryError> {
        validate_box(&tile_box)?;
        let b = tile_box.to_origin(convention);
        let t = self.target_size;
        Ok(Rect::new(
            (b.x * t - self.offset_x) / self.scale,
            (b.y * t - self.offset_y) / self.scale,
            b.width * t / self.scale,
            b.height * t / self.scale,
        ))
    }

    /// Forward letterbox: original-image pixel rect to a normalized, top-left tile box.
    pub fn letterbox_rect(&self, image_rect: Rect) -> Result<Rect, GeometryError> {
        validate_box(&image_rect)?;
        let t = self.target_size;
        Ok(Rect::new(
            (image_rect.x * self.scale + self.offset_x) / t,
            (image_rect.y * self.scale + self.offset_y) / t,
            image_rect.width * self.scale / t,
            image_rect.height * self.scale / t,
        ))
    }
}

pub(super) fn validate_box(rect: &Rect) -> Result<(), GeometryError> {
    super::require_finite("box x", rect.x)?;
    super::require_finite("box y", rect.y)?;
    super::require_non_negative("box width", rect.width)?;
    super::require_non_negative("box height", rect.height)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    const EPS: f64 = 1e-9;

    #[test]
    fn landscape_full_hd_into_640() {
        let g = compute_letterbox(Size::new(1920.0, 1080.0), 640.0).unwrap();
        assert!((g.scale - 1.0 / 3.0).abs() < EPS);
        let scaled = g.scaled_size();
        assert!((scaled.width - 640.0).abs() < EPS);
        assert!((scaled.height - 360.0).abs() < EPS);
        assert!(g.offset_x.abs() < EPS);
        assert!((g.offset_y - 140.0).abs() < EPS);
    }

    #[test]
    fn portrait_pads_horizontally() {
        let g = compute_letterbox(Size::new(480.0, 640.0), 640.0).unwrap();
        assert!((g.scale - 1.0).abs() < EPS);
        assert!((g.offset_x - 80.0).abs() < EPS);
        assert!(g.offset_y.abs() < EPS);
    }

    #[test]
    fn exact_square_has_no_padding() {
        let g = compute_letterbox(Size::square(640.0), 640.0).unwrap();
        assert_eq!(g.scale, 1.0);
        assert_eq!(g.offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn small_images_are_scaled_up_to_fill() {
        let g = compute_letterbox(Size::new(320.0, 160.0), 640.0).unwrap();
        assert!((g.scale - 2.0).abs() < EPS);
        assert!((g.offset_y - 160.0).abs() < EPS);
    }

    #[test]
    fn letterbox_properties_hold_for_random_sizes() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let w: f64 = rng.gen_range(1.0..8000.0);
            let h: f64 = rng.gen_range(1.0..8000.0);
            let t: f64 = rng.gen_range(16.0..2048.0);
            let g = compute_letterbox(Size::new(w, h), t).unwrap();

            assert!(g.scale > 0.0);
            assert!(g.scale * w.max(h) <= t * (1.0 + 1e-12));
            let tol = t * 1e-9;
            assert!(g.offset_x.abs() < tol || g.offset_y.abs() < tol);
            assert!(g.offset_x >= 0.0 && g.offset_x <= t);
            assert!(g.offset_y >= 0.0 && g.offset_y <= t);
            assert!(g.offset_x == 0.0 || g.offset_y == 0.0);

            let scaled = g.scaled_size();
            if g.offset_y > tol {
                assert!((scaled.height + 2.0 * g.offset_y - t).abs() < tol);
            } else {
                assert!((scaled.width + 2.0 * g.offset_x - t).abs() < tol);
            }
        }
    }

    #[test]
    fn offsets_are_never_negative() {
        for (h, t) in [(997.0, 640.0), (1080.0, 416.0), (333.0, 97.0)] {
            for w in 1..3000 {
                let g = compute_letterbox(Size::new(w as f64, h), t).unwrap();
                assert!(g.offset_x >= 0.0, "w={} h={} t={} offset_x={}", w, h, t, g.offset_x);
                assert!(g.offset_y >= 0.0, "w={} h={} t={} offset_y={}", w, h, t, g.offset_y);
            }
        }
        let g = compute_letterbox(Size::new(1050.0, 997.0), 640.0).unwrap();
        assert_eq!(g.offset_x, 0.0);
        assert!(g.offset_y > 16.0 && g.offset_y < 16.2);
    }

    #[test]
    fn identical_inputs_give_identical_geometry() {
        let a = compute_letterbox(Size::new(1234.5, 777.0), 416.0).unwrap();
        let b = compute_letterbox(Size::new(1234.5, 777.0), 416.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(compute_letterbox(Size::new(0.0, 10.0), 640.0).is_err());
        assert!(compute_letterbox(Size::new(10.0, -1.0), 640.0).is_err());
        assert!(compute_letterbox(Size::new(10.0, 10.0), 0.0).is_err());
        assert!(compute_letterbox(Size::new(f64::NAN, 10.0), 640.0).is_err());
        let err = compute_letterbox(Size::new(10.0, f64::INFINITY), 640.0).unwrap_err();
        assert!(err.to_string().contains("original height"));
    }

    #[test]
    fn unletterbox_recovers_image_box() {
        let g = compute_letterbox(Size::new(1920.0, 1080.0), 640.0).unwrap();
        // Center of the tile is the center of the image.
        let r = g
            .unletterbox(Rect::new(0.5, 0.5, 0.1, 0.1), BoxConvention::Center)
            .unwrap();
        assert!((r.x + r.width / 2.0 - 960.0).abs() < 1e-6);
        assert!((r.y + r.height / 2.0 - 540.0).abs() < 1e-6);
        assert!((r.width - 192.0).abs() < 1e-6);
        assert!((r.height - 192.0).abs() < 1e-6);

        let back = g.letterbox_rect(r).unwrap();
        assert!((back.x - 0.45).abs() < 1e-9);
        assert!((back.y - 0.45).abs() < 1e-9);
        assert!((back.width - 0.1).abs() < 1e-9);
    }

    #[test]
    fn offset_for_scales_padding_fraction() {
        let g = compute_letterbox(Size::new(1920.0, 1080.0), 640.0).unwrap();
        let off = g.offset_for(Size::new(1920.0, 1080.0)).unwrap();
        assert!(off.x.abs() < EPS);
        assert!((off.y - 140.0 / 640.0 * 1080.0).abs() < EPS);
        assert!(g.offset_for(Size::new(0.0, 1080.0)).is_err());
    }
}

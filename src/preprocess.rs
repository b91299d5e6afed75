//! Letterbox preprocessing for model input.
//!
//! The image is resized with its aspect ratio preserved and centered on a
//! black square canvas of the model's input size.

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::detect::Tile;
use crate::geometry::{compute_letterbox, LetterboxGeometry, Size};

/// Build the model tile for `image` and the geometry needed to map boxes back.
pub fn letterbox_tile(image: &RgbImage, target_size: u32) -> Result<(Tile, LetterboxGeometry)> {
    let (width, height) = image.dimensions();
    let geometry = compute_letterbox(Size::new(width as f64, height as f64), target_size as f64)
        .context("cannot letterbox image")?;

    let scaled = geometry.scaled_size();
    let new_w = (scaled.width.round() as u32).clamp(1, target_size);
    let new_h = (scaled.height.round() as u32).clamp(1, target_size);

    let resized = if (new_w, new_h) == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, new_w, new_h, FilterType::Triangle)
    };

    let mut canvas = RgbImage::new(target_size, target_size);
    let left = (target_size - new_w) / 2;
    let top = (target_size - new_h) / 2;
    imageops::replace(&mut canvas, &resized, left as i64, top as i64);

    log::debug!(
        "letterboxed {}x{} -> {}x{} at ({}, {}) in {}px tile",
        width,
        height,
        new_w,
        new_h,
        left,
        top,
        target_size
    );

    let tile = Tile::new(target_size, canvas.into_raw())?;
    Ok((tile, geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn pixel(tile: &Tile, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * tile.size() + x) * 3) as usize;
        let p = tile.pixels();
        [p[idx], p[idx + 1], p[idx + 2]]
    }

    #[test]
    fn wide_image_gets_black_bands_top_and_bottom() {
        let image = RgbImage::from_pixel(64, 32, Rgb([200, 100, 50]));
        let (tile, geometry) = letterbox_tile(&image, 32).unwrap();

        assert_eq!(tile.size(), 32);
        assert!((geometry.scale - 0.5).abs() < 1e-12);
        assert!((geometry.offset_y - 8.0).abs() < 1e-12);

        assert_eq!(pixel(&tile, 16, 2), [0, 0, 0]);
        assert_eq!(pixel(&tile, 16, 29), [0, 0, 0]);
        assert_eq!(pixel(&tile, 16, 16), [200, 100, 50]);
    }

    #[test]
    fn square_image_at_target_size_is_copied() {
        let image = RgbImage::from_pixel(16, 16, Rgb([9, 9, 9]));
        let (tile, geometry) = letterbox_tile(&image, 16).unwrap();
        assert_eq!(geometry.offset_x, 0.0);
        assert_eq!(tile.pixels(), image.as_raw().as_slice());
    }

    #[test]
    fn empty_image_is_an_error() {
        let image = RgbImage::new(0, 10);
        assert!(letterbox_tile(&image, 32).is_err());
    }
}

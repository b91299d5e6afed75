//! Detection overlays.
//!
//! Boxes are stroked in their class color. Text labels are not drawn; the
//! text report carries class and confidence.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;

use crate::detect::Detection;
use crate::geometry::Size;

/// Stroke width in pixels, drawn inward from the box edge.
pub const STROKE_WIDTH: u32 = 3;

/// Stroke image-space `detections` onto `image`.
///
/// Boxes are clipped to the image first; boxes that clip to nothing are
/// skipped. Returns the number of boxes drawn.
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection]) -> usize {
    let (width, height) = image.dimensions();
    let bounds = Size::new(width as f64, height as f64);
    let mut drawn = 0;

    for detection in detections {
        let clipped = detection.bounding_box.clamp_to(bounds);
        if !clipped.is_finite() {
            log::debug!("skipping non-finite {} box", detection.class_name);
            continue;
        }
        let x0 = clipped.x.floor() as u32;
        let y0 = clipped.y.floor() as u32;
        let x1 = (clipped.max_x().ceil() as u32).min(width);
        let y1 = (clipped.max_y().ceil() as u32).min(height);
        if x1 <= x0 || y1 <= y0 {
            log::debug!("skipping {} box outside the image", detection.class_name);
            continue;
        }

        let color = Rgb(detection.color());
        for inset in 0..STROKE_WIDTH {
            let w = (x1 - x0).saturating_sub(2 * inset);
            let h = (y1 - y0).saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = PixelRect::at((x0 + inset) as i32, (y0 + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(image, rect, color);
        }
        drawn += 1;
    }
    drawn
}

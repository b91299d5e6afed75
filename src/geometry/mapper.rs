use super::letterbox::validate_box;
use super::{require_finite, require_positive, BoxConvention, GeometryError, Point, Rect, Size};

/// Convert a normalized box into image-pixel coordinates.
///
/// 1. scale the box by `image_size`,
/// 2. subtract the letterbox `offset`,
/// 3. for [`BoxConvention::Center`] boxes, shift by half the size so the
///    result is anchored at its top-left corner.
///
/// The result is never clamped to the image; see [`Rect::clamp_to`].
///
/// To place boxes from a letterboxed model tile onto the original frame,
/// use [`LetterboxGeometry::unletterbox`](super::LetterboxGeometry::unletterbox),
/// which also undoes the letterbox scale. `DetectionReport::image_space`
/// and the renderer go through that path.
pub fn map_to_image_coordinates(
    normalized_box: Rect,
    image_size: Size,
    offset: Point,
    convention: BoxConvention,
) -> Result<Rect, GeometryError> {
    let (width, height, offset) = validate_space(image_size, offset)?;
    validate_box(&normalized_box)?;

    let scaled = Rect::new(
        normalized_box.x * width - offset.x,
        normalized_box.y * height - offset.y,
        normalized_box.width * width,
        normalized_box.height * height,
    );
    Ok(scaled.to_origin(convention))
}

/// Inverse of [`map_to_image_coordinates`] for the same `image_size`, `offset`
/// and `convention`.
pub fn map_to_normalized(
    image_rect: Rect,
    image_size: Size,
    offset: Point,
    convention: BoxConvention,
) -> Result<Rect, GeometryError> {
    let (width, height, offset) = validate_space(image_size, offset)?;
    validate_box(&image_rect)?;

    let anchored = match convention {
        BoxConvention::Origin => image_rect,
        BoxConvention::Center => Rect::new(
            image_rect.x + image_rect.width / 2.0,
            image_rect.y + image_rect.height / 2.0,
            image_rect.width,
            image_rect.height,
        ),
    };
    Ok(Rect::new(
        (anchored.x + offset.x) / width,
        (anchored.y + offset.y) / height,
        anchored.width / width,
        anchored.height / height,
    ))
}

fn validate_space(image_size: Size, offset: Point) -> Result<(f64, f64, Point), GeometryError> {
    let width = require_positive("image width", image_size.width)?;
    let height = require_positive("image height", image_size.height)?;
    let offset = Point::new(
        require_finite("offset x", offset.x)?,
        require_finite("offset y", offset.y)?,
    );
    Ok((width, height, offset))
}

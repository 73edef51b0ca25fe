use image::DynamicImage;

/// Luminance above which a grayscale pixel counts as white.
pub const WHITE_LUMINANCE_CUT: u8 = 240;

/// Fraction of pixels in `image` brighter than [`WHITE_LUMINANCE_CUT`].
///
/// Returns `None` for an image without pixels.
pub fn white_ratio(image: &DynamicImage) -> Option<f64> {
    let gray = image.to_luma8();
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return None;
    }

    let white = gray
        .pixels()
        .filter(|p| p.0[0] > WHITE_LUMINANCE_CUT)
        .count() as u64;

    Some(white as f64 / total as f64)
}

/// A page is blank when its white-pixel ratio meets `threshold`.
pub fn classify_blank(image: &DynamicImage, threshold: f64) -> bool {
    match white_ratio(image) {
        Some(ratio) => {
            let blank = ratio >= threshold;
            tracing::trace!(ratio, blank, "Blank page check");
            blank
        }
        None => false,
    }
}

//! Rasterized overlay: the shelf image at display size with box outlines drawn on top.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageReader, Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use thiserror::Error;

use super::{DisplaySize, OverlayBox};
use crate::constants::OVERLAY_LINE_WIDTH;

/// Errors that can occur while decoding or rendering images.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Payload is not valid base64
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Image decode or encode failure
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error when writing output files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to render yet
    #[error("No image loaded")]
    NoImage,
}

/// Decode a base64 image payload, accepting an optional `data:` URL prefix.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, RenderError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Ok(STANDARD.decode(payload.trim())?)
}

/// Decode a base64 image into RGBA pixels.
pub fn decode_image(data: &str) -> Result<RgbaImage, RenderError> {
    let bytes = decode_base64(data)?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

/// Natural pixel size of a base64 image, read from its header.
pub fn natural_size(data: &str) -> Result<(u32, u32), RenderError> {
    let bytes = decode_base64(data)?;
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

/// Draw an unfilled rectangle, clipped to the image.
pub fn draw_outline(img: &mut RgbaImage, overlay_box: &OverlayBox, thickness: u32) {
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 || overlay_box.width <= 0.0 || overlay_box.height <= 0.0 {
        return;
    }
    let [r, g, b] = overlay_box.color;
    let color = Rgba([r, g, b, 255]);

    let max_x = (img_w - 1) as f32;
    let max_y = (img_h - 1) as f32;
    let x0 = overlay_box.left.round().clamp(0.0, max_x) as u32;
    let y0 = overlay_box.top.round().clamp(0.0, max_y) as u32;
    let x1 = (overlay_box.left + overlay_box.width).round().clamp(0.0, max_x) as u32;
    let y1 = (overlay_box.top + overlay_box.height).round().clamp(0.0, max_y) as u32;

    // Lines grow inward so boxes on the border stay visible
    for t in 0..thickness.max(1) {
        let (tx0, ty0) = (x0 + t, y0 + t);
        let (tx1, ty1) = (x1.saturating_sub(t), y1.saturating_sub(t));
        if tx0 > tx1 || ty0 > ty1 {
            break;
        }
        let ring = Rect::at(tx0 as i32, ty0 as i32).of_size(tx1 - tx0 + 1, ty1 - ty0 + 1);
        draw_hollow_rect_mut(img, ring, color);
    }
}

/// Render the shelf image at `size` with every box outlined, in order.
pub fn render_overlay(
    image_data: &str,
    boxes: &[OverlayBox],
    size: DisplaySize,
) -> Result<RgbaImage, RenderError> {
    if image_data.trim().is_empty() {
        return Err(RenderError::NoImage);
    }
    let source = decode_image(image_data)?;
    let (width, height) = size.to_pixels();
    let mut canvas = if source.dimensions() == (width, height) {
        source
    } else {
        imageops::resize(&source, width, height, imageops::FilterType::Triangle)
    };

    for overlay_box in boxes {
        draw_outline(&mut canvas, overlay_box, OVERLAY_LINE_WIDTH);
    }
    log::debug!("Rendered overlay {}x{} with {} boxes", width, height, boxes.len());
    Ok(canvas)
}

/// Write an image as PNG, creating parent directories as needed.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    img.save_with_format(path, image::ImageFormat::Png)?;
    log::info!("Saved overlay to {:?}", path);
    Ok(())
}

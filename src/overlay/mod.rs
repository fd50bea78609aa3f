//! Bounding-box overlay.
//!
//! Detections live in source-image pixel space. The overlay maps them onto the
//! size the shelf image is currently rendered at, independently per axis:
//! `display = source / source_dimension * rendered_dimension`.

mod raster;

use std::collections::BTreeMap;

pub use raster::{
    RenderError, decode_base64, decode_image, draw_outline, natural_size, render_overlay,
    save_png,
};

use crate::color_utils::{FALLBACK_GRAY, Rgb, palette_color};
use crate::model::{ClusterId, Detection};

/// Size an image is rendered at, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    /// Non-zero stand-in used before the image has been measured.
    pub const PLACEHOLDER: DisplaySize = DisplaySize {
        width: 1.0,
        height: 1.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Fit a natural size into a viewport, keeping the aspect ratio and never upscaling.
    pub fn fit(natural: (u32, u32), max_width: u32, max_height: Option<u32>) -> Self {
        let (w, h) = (natural.0.max(1) as f32, natural.1.max(1) as f32);
        let mut scale = (max_width.max(1) as f32 / w).min(1.0);
        if let Some(max_height) = max_height {
            scale = scale.min(max_height.max(1) as f32 / h);
        }
        Self::new((w * scale).max(1.0), (h * scale).max(1.0))
    }

    /// Whole-pixel size for rasterizing, at least 1x1.
    pub fn to_pixels(self) -> (u32, u32) {
        (
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

/// Resolves the outline color of a cluster.
///
/// Order: explicit color map, then `palette[cluster_id % len]` when a palette is
/// supplied, then the fallback color.
#[derive(Debug, Clone, Copy)]
pub struct ColorResolver<'a> {
    color_map: &'a BTreeMap<ClusterId, Rgb>,
    palette: Option<&'a [Rgb]>,
    fallback: Rgb,
}

impl<'a> ColorResolver<'a> {
    pub fn new(color_map: &'a BTreeMap<ClusterId, Rgb>) -> Self {
        Self {
            color_map,
            palette: None,
            fallback: FALLBACK_GRAY,
        }
    }

    pub fn with_palette(mut self, palette: &'a [Rgb]) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn with_fallback(mut self, fallback: Rgb) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn resolve(&self, cluster_id: ClusterId) -> Rgb {
        if let Some(color) = self.color_map.get(&cluster_id) {
            return *color;
        }
        self.palette
            .and_then(|palette| palette_color(palette, cluster_id))
            .unwrap_or(self.fallback)
    }
}

/// One outline box in display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBox {
    pub cluster_id: ClusterId,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
}

/// Scale detections from source space into the rendered size, in the given order.
///
/// Returns nothing when the source size is degenerate.
pub fn layout_boxes(
    detections: &[Detection],
    source: (u32, u32),
    rendered: DisplaySize,
    colors: &ColorResolver<'_>,
) -> Vec<OverlayBox> {
    let (source_w, source_h) = source;
    if source_w == 0 || source_h == 0 {
        return Vec::new();
    }
    let sx = rendered.width / source_w as f32;
    let sy = rendered.height / source_h as f32;

    detections
        .iter()
        .map(|det| OverlayBox {
            cluster_id: det.cluster_id,
            left: det.bbox.x1 * sx,
            top: det.bbox.y1 * sy,
            width: det.bbox.width() * sx,
            height: det.bbox.height() * sy,
            color: colors.resolve(det.cluster_id),
        })
        .collect()
}

/// Rendered-size bookkeeping for the shelf image.
///
/// The rendered size is unknown until the image's natural size has been measured;
/// until then [`OverlayView::layout`] yields no boxes. Viewport changes recompute
/// the rendered size from the last measurement.
#[derive(Debug, Clone)]
pub struct OverlayView {
    natural: Option<(u32, u32)>,
    max_width: u32,
    max_height: Option<u32>,
    rendered: DisplaySize,
}

impl OverlayView {
    pub fn new(max_width: u32) -> Self {
        Self {
            natural: None,
            max_width,
            max_height: None,
            rendered: DisplaySize::PLACEHOLDER,
        }
    }

    /// Record the natural size of a newly loaded image.
    pub fn image_loaded(&mut self, natural: (u32, u32)) {
        self.natural = Some(natural);
        self.recompute();
        log::debug!(
            "Overlay image measured at {}x{}, rendered at {:.0}x{:.0}",
            natural.0,
            natural.1,
            self.rendered.width,
            self.rendered.height
        );
    }

    /// Forget the current image.
    pub fn clear(&mut self) {
        self.natural = None;
        self.rendered = DisplaySize::PLACEHOLDER;
    }

    /// Change the viewport the image is fitted into.
    pub fn resize(&mut self, max_width: u32, max_height: Option<u32>) {
        self.max_width = max_width;
        self.max_height = max_height;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.rendered = match self.natural {
            Some(natural) => DisplaySize::fit(natural, self.max_width, self.max_height),
            None => DisplaySize::PLACEHOLDER,
        };
    }

    /// Rendered size, once the image has been measured.
    pub fn rendered(&self) -> Option<DisplaySize> {
        self.natural.map(|_| self.rendered)
    }

    pub fn is_measured(&self) -> bool {
        self.natural.is_some()
    }

    /// Lay out detections for the current rendered size.
    pub fn layout(
        &self,
        detections: &[Detection],
        source: (u32, u32),
        colors: &ColorResolver<'_>,
    ) -> Vec<OverlayBox> {
        match self.rendered() {
            Some(rendered) => layout_boxes(detections, source, rendered, colors),
            None => Vec::new(),
        }
    }
}

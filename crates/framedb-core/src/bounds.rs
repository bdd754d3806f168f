//! Screen-bounds measurement over the alpha channel.
//!
//! A frame asset is an image of a physical device with a transparent
//! cut-out where the screen sits. The measurement:
//!
//! 1. Binarize the alpha channel: anything below near-full opacity is the
//!    transparent/foreground class.
//! 2. Label 8-connected components of the binarized mask, accumulating a
//!    bounding box and pixel count per component.
//! 3. Select the component whose label occupies the exact center pixel —
//!    assets are constructed so the screen cut-out always contains the
//!    canvas center. Not the largest component, not the nearest centroid.
//!
//! The selected component must be strictly interior to the canvas: the
//! transparent apron around the device body touches the border, the screen
//! cut-out never does. A center pixel on the opaque (background) label or a
//! border-touching selection is an error, not a silent bad measurement.

use std::collections::HashMap;

use image::{GrayImage, Luma, RgbaImage};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::error::{Error, Result};

/// Alpha values at or below this are treated as transparent when looking
/// for the screen cut-out (just under 99% of full opacity).
pub const OPAQUE_ALPHA_THRESHOLD: u8 = 252;

/// Pixel rectangle of a screen cut-out, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScreenBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScreenBounds {
    /// Exclusive right edge (`x + width`).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge (`y + height`).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Per-component statistics from the labeling pass.
#[derive(Debug, Clone, Copy)]
struct ComponentStats {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixel_count: u64,
}

impl ComponentStats {
    fn seed(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 1,
        }
    }

    fn absorb(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }
}

/// Binarize the alpha channel: 255 where the pixel counts as transparent
/// for detection, 0 where it is opaque background.
pub fn binarize_alpha(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[3] <= OPAQUE_ALPHA_THRESHOLD {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Measure the screen cut-out of a frame asset.
///
/// Returns the bounding rectangle of the 8-connected transparent component
/// containing the image center pixel `(width / 2, height / 2)`.
pub fn detect_screen_bounds(image: &RgbaImage) -> Result<ScreenBounds> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let mask = binarize_alpha(image);
    let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

    let mut stats: HashMap<u32, ComponentStats> = HashMap::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0];
        if label == 0 {
            continue;
        }
        stats
            .entry(label)
            .and_modify(|s| s.absorb(x, y))
            .or_insert_with(|| ComponentStats::seed(x, y));
    }

    let (cx, cy) = (width / 2, height / 2);
    let center_label = labels.get_pixel(cx, cy)[0];
    if center_label == 0 {
        return Err(Error::ScreenNotFound { cx, cy });
    }

    let screen = stats[&center_label];
    let bounds = ScreenBounds {
        x: screen.min_x,
        y: screen.min_y,
        width: screen.max_x - screen.min_x + 1,
        height: screen.max_y - screen.min_y + 1,
    };

    tracing::debug!(
        components = stats.len(),
        screen_pixels = screen.pixel_count,
        "screen component +{}+{},{}x{}",
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
    );

    if bounds.x == 0 || bounds.y == 0 || bounds.right() == width || bounds.bottom() == height {
        return Err(Error::BoundsNotInterior {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        });
    }

    Ok(bounds)
}

//! Layered-design companion: rasterize a design bundle into a frame
//! template.
//!
//! A design bundle is a directory holding layer images plus a `design.json`
//! manifest (schema `framedb.design.v1`). Three layer kinds exist: an
//! optional `background`, the required `device` pixels, and the required
//! `content` placeholder whose mask marks the screen area. The bundle is
//! loaded into a validated [`DesignDocument`] value up front — a bundle
//! missing a required layer fails loudly before anything is written.
//!
//! Composition inverts the content mask onto the device layer's alpha:
//! the screen area becomes transparent, background and content layers are
//! hidden, and the result is the device render with a screen hole — the
//! same shape of asset the measurement pipeline consumes. The accompanying
//! metadata record (template name, mask offset, canvas size) goes into a
//! JSON database document keyed by the normalized output name.

use std::collections::BTreeMap;
use std::path::Path;

use image::{GrayImage, RgbaImage};

use crate::db::{read_json, write_json};
use crate::error::{Error, Result};

const DESIGN_SCHEMA_V1: &str = "framedb.design.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayerKind {
    Background,
    Device,
    Content,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DesignManifest {
    schema: String,
    /// Canvas size `[width, height]` in pixels.
    canvas: [u32; 2],
    layers: Vec<ManifestLayer>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestLayer {
    kind: LayerKind,
    file: String,
    #[serde(default)]
    origin: [i32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mask: Option<ManifestMask>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestMask {
    file: String,
    #[serde(default)]
    origin: [i32; 2],
}

/// One raster layer placed on the canvas.
#[derive(Debug, Clone)]
pub struct Layer {
    pub image: RgbaImage,
    /// Top-left placement on the canvas.
    pub origin: [i32; 2],
}

/// A grayscale mask placed on the canvas (255 = masked, screen area).
#[derive(Debug, Clone)]
pub struct LayerMask {
    pub image: GrayImage,
    pub origin: [i32; 2],
}

/// Validated design document. Constructing one guarantees the required
/// layers are present and the canvas is non-empty.
#[derive(Debug, Clone)]
pub struct DesignDocument {
    canvas: [u32; 2],
    /// Hidden in the composite; carried for document completeness.
    background: Option<Layer>,
    device: Layer,
    /// The content pixels themselves are hidden; only the mask (or the
    /// layer's rectangle, when no mask exists) shapes the output.
    content: Layer,
    content_mask: Option<LayerMask>,
}

/// Metadata record for a composed template, in the database schema.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ComposedRecord {
    pub png_template_name: String,
    pub offset_x: i32,
    pub offset_y: i32,
    pub res_width: u32,
    pub res_height: u32,
}

/// A rasterized template plus its metadata record.
#[derive(Debug, Clone)]
pub struct ComposedTemplate {
    pub image: RgbaImage,
    pub record: ComposedRecord,
    /// Database key: normalized output name.
    pub key: String,
}

impl DesignDocument {
    /// Construct a validated document from explicit layers.
    pub fn new(
        canvas: [u32; 2],
        background: Option<Layer>,
        device: Option<Layer>,
        content: Option<Layer>,
        content_mask: Option<LayerMask>,
    ) -> Result<Self> {
        if canvas[0] == 0 || canvas[1] == 0 {
            return Err(Error::InvalidManifest {
                reason: format!("canvas must be non-empty, got {}x{}", canvas[0], canvas[1]),
            });
        }
        let device = device.ok_or(Error::MissingLayer { kind: "device" })?;
        let content = content.ok_or(Error::MissingLayer { kind: "content" })?;

        Ok(Self {
            canvas,
            background,
            device,
            content,
            content_mask,
        })
    }

    /// Load and validate a design bundle directory.
    pub fn from_bundle(dir: &Path) -> Result<Self> {
        let manifest: DesignManifest = read_json(&dir.join("design.json"))?;
        if manifest.schema != DESIGN_SCHEMA_V1 {
            return Err(Error::InvalidManifest {
                reason: format!(
                    "unsupported design schema '{}' (expected '{}')",
                    manifest.schema, DESIGN_SCHEMA_V1
                ),
            });
        }

        let mut background = None;
        let mut device = None;
        let mut content = None;
        let mut content_mask = None;

        for layer in &manifest.layers {
            let slot = match layer.kind {
                LayerKind::Background => &mut background,
                LayerKind::Device => &mut device,
                LayerKind::Content => &mut content,
            };
            if slot.is_some() {
                return Err(Error::DuplicateLayer {
                    kind: kind_name(layer.kind),
                });
            }

            let image = image::open(dir.join(&layer.file))?.to_rgba8();
            *slot = Some(Layer {
                image,
                origin: layer.origin,
            });

            if let Some(mask) = &layer.mask {
                if layer.kind != LayerKind::Content {
                    return Err(Error::InvalidManifest {
                        reason: format!(
                            "only the content layer may carry a mask, found one on {}",
                            kind_name(layer.kind)
                        ),
                    });
                }
                content_mask = Some(LayerMask {
                    image: image::open(dir.join(&mask.file))?.to_luma8(),
                    origin: mask.origin,
                });
            }
        }

        Self::new(manifest.canvas, background, device, content, content_mask)
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Rasterize the template: the device layer with the (inverted) content
    /// mask applied to its alpha, on an otherwise transparent canvas.
    pub fn compose(&self, template_name: &str) -> ComposedTemplate {
        // A content layer without a mask gets an artificial fully-masked
        // rectangle covering its own bounds.
        let mask = match &self.content_mask {
            Some(mask) => mask.clone(),
            None => LayerMask {
                image: GrayImage::from_pixel(
                    self.content.image.width(),
                    self.content.image.height(),
                    image::Luma([255u8]),
                ),
                origin: self.content.origin,
            },
        };

        let [canvas_w, canvas_h] = self.canvas;
        let mut out = RgbaImage::new(canvas_w, canvas_h);

        for (x, y, pixel) in self.device.image.enumerate_pixels() {
            let gx = self.device.origin[0] + x as i32;
            let gy = self.device.origin[1] + y as i32;
            if gx < 0 || gy < 0 || gx >= canvas_w as i32 || gy >= canvas_h as i32 {
                continue;
            }

            let coverage = mask_value(&mask, gx, gy);
            let mut composed = *pixel;
            // Inverted mask: full coverage knocks the pixel out entirely.
            composed[3] =
                ((composed[3] as u32 * (255 - coverage as u32) + 127) / 255) as u8;
            out.put_pixel(gx as u32, gy as u32, composed);
        }

        ComposedTemplate {
            image: out,
            record: ComposedRecord {
                png_template_name: template_name.to_string(),
                offset_x: mask.origin[0],
                offset_y: mask.origin[1],
                res_width: canvas_w,
                res_height: canvas_h,
            },
            key: normalize_template_key(template_name),
        }
    }
}

fn kind_name(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Background => "background",
        LayerKind::Device => "device",
        LayerKind::Content => "content",
    }
}

/// Mask value at canvas coordinates; outside the mask rectangle the device
/// pixel stays fully visible.
fn mask_value(mask: &LayerMask, gx: i32, gy: i32) -> u8 {
    let mx = gx - mask.origin[0];
    let my = gy - mask.origin[1];
    if mx < 0 || my < 0 || mx >= mask.image.width() as i32 || my >= mask.image.height() as i32 {
        return 0;
    }
    mask.image.get_pixel(mx as u32, my as u32)[0]
}

/// Database key for a composed template: lowercased stem with spaces
/// removed.
pub fn normalize_template_key(template_name: &str) -> String {
    let stem = Path::new(template_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(template_name);
    stem.to_lowercase().replace(' ', "")
}

/// Insert a composed-template record into a JSON database document,
/// preserving whatever other entries the file already holds.
pub fn record_template(db_path: &Path, key: &str, record: &ComposedRecord) -> Result<()> {
    let mut entries: BTreeMap<String, serde_json::Value> = if db_path.exists() {
        read_json(db_path)?
    } else {
        BTreeMap::new()
    };
    entries.insert(
        key.to_string(),
        serde_json::to_value(record).map_err(|e| Error::json(db_path, e))?,
    );
    write_json(db_path, &entries)
}

//! Template database: persistence, reconciliation, default colors.
//!
//! The database is one JSON document mapping device key → template entry.
//! Geometry is recorded once per device, from the first color variant
//! measured for it (variants of one device share screen geometry); image
//! references are recorded per color and overwritten on re-measurement.
//! Serialization is deterministic — sorted keys, fixed indentation, trailing
//! newline — so re-runs over an unchanged asset set are byte-identical and
//! the file diffs cleanly under version control.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bounds::ScreenBounds;
use crate::error::{Error, Result};

/// Default-color precedence, darkest first. The first of these present
/// among a device's recorded variants becomes its default.
pub const DEFAULT_COLOR_PRECEDENCE: &[&str] = &[
    "black-band",
    "space-gray",
    "black",
    "matte-black",
    "silver",
    "white",
    "gold",
    "blue",
];

/// Persisted record for one device key.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceTemplate {
    /// Color key → image filename.
    pub images: BTreeMap<String, String>,
    /// Color key of the default variant; absent until deduced or curated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,
    /// Screen rectangle edges in frame pixels.
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    /// Full frame image dimensions.
    pub res_width: u32,
    pub res_height: u32,
}

/// The template database: device key → entry, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TemplateDb {
    entries: BTreeMap<String, DeviceTemplate>,
}

impl TemplateDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a database file; a missing file is an empty database. An
    /// existing file is preserved and merged into, never overwritten
    /// wholesale.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("database {} not found, starting empty", path.display());
            return Ok(Self::new());
        }
        read_json(path)
    }

    /// Persist with deterministic serialization.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Merge one measurement into the database.
    ///
    /// Geometry is first-writer-wins per device key: an existing entry keeps
    /// its recorded bounds regardless of this call's measurement. The image
    /// reference is last-writer-wins per (device key, color key).
    pub fn merge(
        &mut self,
        device_key: &str,
        color_key: &str,
        image_filename: &str,
        frame_width: u32,
        frame_height: u32,
        bounds: ScreenBounds,
    ) {
        let entry = self
            .entries
            .entry(device_key.to_string())
            .or_insert_with(|| DeviceTemplate {
                images: BTreeMap::new(),
                default_image: None,
                left: bounds.x,
                top: bounds.y,
                right: bounds.right(),
                bottom: bounds.bottom(),
                res_width: frame_width,
                res_height: frame_height,
            });
        entry
            .images
            .insert(color_key.to_string(), image_filename.to_string());
    }

    /// Deduce a default color for every entry lacking one.
    ///
    /// Entries with `default_image` already set are left untouched, which
    /// keeps the operation idempotent and preserves curated defaults across
    /// re-runs. Returns the device keys for which no precedence color was
    /// present; those entries stay without a default (non-fatal).
    pub fn apply_default_colors<S: AsRef<str>>(&mut self, precedence: &[S]) -> Vec<String> {
        let mut missing = Vec::new();
        for (key, entry) in &mut self.entries {
            if entry.default_image.is_some() {
                continue;
            }
            match precedence
                .iter()
                .map(|c| c.as_ref())
                .find(|c| entry.images.contains_key(*c))
            {
                Some(color) => {
                    tracing::debug!("default color for {key}: {color}");
                    entry.default_image = Some(color.to_string());
                }
                None => {
                    tracing::warn!("unable to deduce default color for {key}");
                    missing.push(key.clone());
                }
            }
        }
        missing
    }

    pub fn get(&self, device_key: &str) -> Option<&DeviceTemplate> {
        self.entries.get(device_key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &DeviceTemplate)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read a JSON document from disk.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&data).map_err(|e| Error::json(path, e))
}

/// Write a JSON document with sorted object keys, 4-space indentation and a
/// trailing newline.
///
/// Values are routed through `serde_json::Value`, whose object
/// representation is key-ordered, so struct fields and map keys alike come
/// out sorted.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).map_err(|e| Error::json(path, e))?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| Error::json(path, e))?;
    buf.push(b'\n');

    std::fs::write(path, buf).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(x: u32, y: u32, width: u32, height: u32) -> ScreenBounds {
        ScreenBounds {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn new_entry_records_geometry_and_image() {
        let mut db = TemplateDb::new();
        db.merge(
            "iphone11promax",
            "space-gray",
            "Apple iPhone 11 Pro Max Space Gray.png",
            1500,
            3000,
            bounds(100, 200, 1300, 2600),
        );

        let entry = db.get("iphone11promax").expect("entry present");
        assert_eq!(entry.left, 100);
        assert_eq!(entry.top, 200);
        assert_eq!(entry.right, 1400);
        assert_eq!(entry.bottom, 2800);
        assert_eq!(entry.res_width, 1500);
        assert_eq!(entry.res_height, 3000);
        assert_eq!(
            entry.images["space-gray"],
            "Apple iPhone 11 Pro Max Space Gray.png"
        );
    }

    #[test]
    fn geometry_is_first_writer_wins() {
        let mut db = TemplateDb::new();
        db.merge("iphone11", "black", "a.png", 1500, 3000, bounds(10, 20, 30, 40));
        db.merge("iphone11", "white", "b.png", 999, 999, bounds(1, 2, 3, 4));

        let entry = db.get("iphone11").expect("entry present");
        assert_eq!(
            (entry.left, entry.top, entry.right, entry.bottom),
            (10, 20, 40, 60)
        );
        assert_eq!((entry.res_width, entry.res_height), (1500, 3000));
        assert_eq!(entry.images.len(), 2);
        assert_eq!(entry.images["white"], "b.png");
    }

    #[test]
    fn image_is_last_writer_wins_per_color() {
        let mut db = TemplateDb::new();
        db.merge("iphone11", "black", "old.png", 100, 100, bounds(10, 10, 50, 50));
        db.merge("iphone11", "black", "new.png", 100, 100, bounds(10, 10, 50, 50));
        db.merge("iphone11", "white", "w.png", 100, 100, bounds(10, 10, 50, 50));

        let entry = db.get("iphone11").expect("entry present");
        assert_eq!(entry.images["black"], "new.png");
        assert_eq!(entry.images["white"], "w.png");
        // Geometry untouched by re-measurement.
        assert_eq!(entry.left, 10);
    }

    #[test]
    fn default_color_follows_precedence() {
        let mut db = TemplateDb::new();
        db.merge("a", "silver", "s.png", 10, 10, bounds(1, 1, 2, 2));
        db.merge("a", "black", "b.png", 10, 10, bounds(1, 1, 2, 2));
        db.merge("b", "silver", "s.png", 10, 10, bounds(1, 1, 2, 2));
        db.merge("b", "gold", "g.png", 10, 10, bounds(1, 1, 2, 2));

        let missing = db.apply_default_colors(DEFAULT_COLOR_PRECEDENCE);
        assert!(missing.is_empty());
        assert_eq!(db.get("a").unwrap().default_image.as_deref(), Some("black"));
        assert_eq!(db.get("b").unwrap().default_image.as_deref(), Some("silver"));
    }

    #[test]
    fn existing_default_is_preserved() {
        let mut db = TemplateDb::new();
        db.merge("a", "black", "b.png", 10, 10, bounds(1, 1, 2, 2));
        db.merge("a", "gold", "g.png", 10, 10, bounds(1, 1, 2, 2));
        if let Some(entry) = db.entries.get_mut("a") {
            entry.default_image = Some("gold".to_string());
        }

        db.apply_default_colors(DEFAULT_COLOR_PRECEDENCE);
        assert_eq!(db.get("a").unwrap().default_image.as_deref(), Some("gold"));
    }

    #[test]
    fn unmatched_precedence_reports_key() {
        let mut db = TemplateDb::new();
        db.merge("a", "prism-green", "p.png", 10, 10, bounds(1, 1, 2, 2));

        let missing = db.apply_default_colors(DEFAULT_COLOR_PRECEDENCE);
        assert_eq!(missing, vec!["a".to_string()]);
        assert_eq!(db.get("a").unwrap().default_image, None);
    }

    #[test]
    fn serialization_is_deterministic_and_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("contents.json");

        let mut db = TemplateDb::new();
        db.merge("zeta", "black", "z.png", 10, 10, bounds(1, 1, 2, 2));
        db.merge("alpha", "white", "a.png", 10, 10, bounds(1, 1, 2, 2));
        db.save(&path).expect("save");
        let first = std::fs::read_to_string(&path).expect("read");

        // Keys sorted, stable indentation, trailing newline.
        assert!(first.find("\"alpha\"").expect("alpha") < first.find("\"zeta\"").expect("zeta"));
        assert!(first.contains("    \"alpha\""));
        assert!(first.ends_with('\n'));

        // Re-save after a round-trip: byte-identical.
        let reloaded = TemplateDb::load(&path).expect("load");
        assert_eq!(reloaded, db);
        reloaded.save(&path).expect("save again");
        let second = std::fs::read_to_string(&path).expect("read");
        assert_eq!(first, second);
    }

    #[test]
    fn load_tolerates_missing_file_and_preserves_existing_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("contents.json");

        let db = TemplateDb::load(&path).expect("missing file is empty db");
        assert!(db.is_empty());

        // Populate, reload, merge a new device: the old entry survives.
        let mut db = TemplateDb::new();
        db.merge("old", "black", "o.png", 10, 10, bounds(1, 1, 2, 2));
        db.save(&path).expect("save");

        let mut db = TemplateDb::load(&path).expect("load");
        db.merge("new", "white", "n.png", 20, 20, bounds(2, 2, 3, 3));
        assert!(db.get("old").is_some());
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn default_image_absent_from_json_until_set() {
        let mut db = TemplateDb::new();
        db.merge("a", "black", "b.png", 10, 10, bounds(1, 1, 2, 2));

        let json = serde_json::to_string(&db).expect("serialize");
        assert!(!json.contains("default_image"));

        db.apply_default_colors(DEFAULT_COLOR_PRECEDENCE);
        let json = serde_json::to_string(&db).expect("serialize");
        assert!(json.contains("\"default_image\":\"black\""));
    }
}

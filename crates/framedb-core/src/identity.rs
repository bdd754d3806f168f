//! Filename → canonical device/color identity resolution.
//!
//! Frame assets carry their identity in the filename
//! (`Apple iPhone 11 Pro Max Space Gray.png`). This module turns such a name
//! into a canonical device key (`iphone11promax`) and color key
//! (`space-gray`) using fixed lookup tables: a color vocabulary, and a rename
//! scheme that resolves marketing names which changed across releases.
//!
//! The tables live in an explicit [`IdentityConfig`] value rather than module
//! statics, so resolution is a pure function of (filename, configuration).

use std::path::Path;

use crate::error::{Error, Result};

/// Color key returned when no vocabulary token matches the filename.
pub const DEFAULT_COLOR_KEY: &str = "default";

/// Known device color phrases, device-specific and generic alike.
///
/// Declaration order is irrelevant: [`IdentityConfig`] re-orders the
/// vocabulary longest-first so specific phrases ("Jet Black", "Space Gray")
/// are always matched before the generic ones they contain.
const COLOR_VOCABULARY: &[&str] = &[
    "white band",
    "black band",
    "Space Gray",
    "Rose Gold",
    "Jet Black",
    "Matte Black",
    "Pacific Blue",
    "Sky Blue",
    "Clearly White",
    "Just Black",
    "Not Pink",
    "Silver Titanium",
    "Arctic Silver",
    "Coral Blue",
    "Maple Gold",
    "Midnight Black",
    "Midnight Green",
    "Orchid Gray",
    "Burgundy Red",
    "Lilac Purple",
    "Sunrise Gold",
    "Titanium Gray",
    "Flamingo Pink",
    "Prism Black",
    "Prism Blue",
    "Prism Green",
    "Prism White",
    "Ceramic White",
    "Oh So Orange",
    "Aura Black",
    "Aura Glow",
    "Aura Pink",
    "Aura Red",
    "Aura White",
    "Aura Blue",
    "Black",
    "White",
    "Gold",
    "Silver",
    "Blue",
    "Red",
    "Yellow",
    "Green",
    "Pink",
    "Gray",
    "Coral",
    "Purple",
    "Graphite",
];

/// Marketing-name renames: generation-qualified names are preferred over
/// year-qualified ones, and collisions between yearly and numbered product
/// generations are resolved here.
const RENAME_SCHEME: &[(&str, &str)] = &[
    ("iPad Pro (11 inch)", "iPad Pro 11"),
    ("iPad Pro (12.9 inch) (3rd generation)", "iPad Pro 12.9"),
    ("iPad Air (2019)", "iPad Air 3"),
    ("iPad Air (2019) 2020", "iPad Air 4"),
    ("iPad Mini (2019)", "iPad Mini 5"),
    ("iPodTouch Portrait", "iPod Touch"),
];

/// Vendor prefix stripped from asset filenames.
const VENDOR_PREFIX: &str = "Apple";

/// Resolved identity of one frame asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Human-readable device name after normalization and renaming.
    pub device_name: String,
    /// Canonical database key: lowercase, no whitespace or punctuation.
    pub device_key: String,
    /// Canonical color key (lowercase, hyphenated), or [`DEFAULT_COLOR_KEY`].
    pub color_key: String,
}

/// Immutable lookup tables for identity resolution.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    vendor_prefix: String,
    /// Color vocabulary, longest token first.
    color_tokens: Vec<String>,
    rename_scheme: Vec<(String, String)>,
}

impl IdentityConfig {
    /// Build a configuration from explicit tables.
    ///
    /// The vocabulary is sorted by descending token length (stable), making
    /// longest-match-wins structural: an overlapping generic token can never
    /// mask a more specific phrase, regardless of declaration order.
    pub fn new(
        vendor_prefix: impl Into<String>,
        color_tokens: &[&str],
        rename_scheme: &[(&str, &str)],
    ) -> Self {
        let mut color_tokens: Vec<String> = color_tokens.iter().map(|t| t.to_string()).collect();
        color_tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));

        Self {
            vendor_prefix: vendor_prefix.into(),
            color_tokens,
            rename_scheme: rename_scheme
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Resolve an asset filename to its device and color identity.
    ///
    /// Fails with [`Error::UnresolvedIdentity`] when no device name survives
    /// normalization; a malformed key must never reach the database.
    pub fn resolve(&self, filename: &str) -> Result<DeviceIdentity> {
        let device_name = self.device_name(filename)?;
        let device_key = device_key(&device_name);
        let color_key = self.color_key(filename);

        Ok(DeviceIdentity {
            device_name,
            device_key,
            color_key,
        })
    }

    /// Extract the human device name: strip extension and vendor prefix,
    /// normalize separators, remove color tokens, then apply the rename
    /// scheme.
    fn device_name(&self, filename: &str) -> Result<String> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);

        let mut name = stem.replace(&self.vendor_prefix, "");
        name = name.replace('-', " ");
        for token in &self.color_tokens {
            name = name.replace(token.as_str(), "");
        }
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::UnresolvedIdentity {
                filename: filename.to_string(),
            });
        }

        let renamed = self
            .rename_scheme
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.as_str())
            .unwrap_or(name);

        Ok(renamed.to_string())
    }

    /// Extract the color key: first vocabulary token (longest first) found
    /// as a substring of the filename, lowercased and hyphenated, or the
    /// sentinel default when nothing matches.
    fn color_key(&self, filename: &str) -> String {
        for token in &self.color_tokens {
            if filename.contains(token.as_str()) {
                return token.to_lowercase().replace(' ', "-");
            }
        }
        DEFAULT_COLOR_KEY.to_string()
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::new(VENDOR_PREFIX, COLOR_VOCABULARY, RENAME_SCHEME)
    }
}

/// Canonicalize a device name into a database key: lowercase with
/// whitespace, periods and parentheses removed.
pub fn device_key(device_name: &str) -> String {
    device_name
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '.' | '(' | ')'))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_device_and_color() {
        let config = IdentityConfig::default();
        let id = config
            .resolve("Apple iPhone 11 Pro Max Space Gray.png")
            .expect("resolvable");
        assert_eq!(id.device_name, "iPhone 11 Pro Max");
        assert_eq!(id.device_key, "iphone11promax");
        assert_eq!(id.color_key, "space-gray");
    }

    #[test]
    fn applies_rename_scheme() {
        let config = IdentityConfig::default();
        let id = config.resolve("Apple iPad Air (2019).png").expect("resolvable");
        assert_eq!(id.device_name, "iPad Air 3");
        assert_eq!(id.device_key, "ipadair3");
        assert_eq!(id.color_key, DEFAULT_COLOR_KEY);
    }

    #[test]
    fn specific_color_wins_over_generic() {
        let config = IdentityConfig::default();
        // "Jet Black" contains "Black"; the longer phrase must win.
        let id = config
            .resolve("Apple iPhone 7 Jet Black.png")
            .expect("resolvable");
        assert_eq!(id.color_key, "jet-black");
        assert_eq!(id.device_key, "iphone7");
    }

    #[test]
    fn missing_color_yields_sentinel() {
        let config = IdentityConfig::default();
        let id = config.resolve("Apple iPad Pro (11 inch).png").expect("resolvable");
        assert_eq!(id.color_key, DEFAULT_COLOR_KEY);
        assert_eq!(id.device_name, "iPad Pro 11");
        assert_eq!(id.device_key, "ipadpro11");
    }

    #[test]
    fn color_only_name_is_rejected() {
        let config = IdentityConfig::default();
        let err = config.resolve("Apple Space Gray.png").expect_err("expected error");
        assert!(matches!(err, Error::UnresolvedIdentity { .. }));
    }

    #[test]
    fn key_strips_punctuation() {
        assert_eq!(device_key("iPad Pro 12.9"), "ipadpro129");
        assert_eq!(device_key("iPad Air (2019)"), "ipadair2019");
    }

    #[test]
    fn hyphens_normalize_to_spaces() {
        let config = IdentityConfig::default();
        let id = config
            .resolve("Apple iPhone-8-Silver.png")
            .expect("resolvable");
        assert_eq!(id.device_name, "iPhone 8");
        assert_eq!(id.color_key, "silver");
    }
}

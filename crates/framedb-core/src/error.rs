//! Error types for the framedb-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for framedb-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the measurement and reconciliation pipeline.
///
/// Everything here is fail-fast: the pipeline stops at the first structural
/// problem rather than writing a database built from bad measurements. The
/// only non-fatal condition — a device entry for which no default color can
/// be deduced — is reported through the ingest summary, not through this
/// type.
#[derive(Debug, Error)]
pub enum Error {
    /// No device name survived filename normalization.
    #[error("no device name could be resolved from '{filename}'")]
    UnresolvedIdentity { filename: String },

    /// Image file could not be decoded.
    #[error("failed to decode image")]
    Image(#[from] image::ImageError),

    /// Image has a zero dimension; there is nothing to measure.
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The center pixel of the asset is opaque, so no screen cut-out
    /// contains it and the measurement would be meaningless.
    #[error("no transparent region covers the image center ({cx}, {cy})")]
    ScreenNotFound { cx: u32, cy: u32 },

    /// The component under the image center touches the asset border; it is
    /// the transparent apron around the device, not the screen cut-out.
    #[error("detected region +{x}+{y},{width}x{height} is not strictly interior to the frame")]
    BoundsNotInterior {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// A required layer is absent from a design bundle.
    #[error("design bundle lacks required {kind} layer")]
    MissingLayer { kind: &'static str },

    /// A layer kind appears more than once in a design bundle.
    #[error("design bundle declares more than one {kind} layer")]
    DuplicateLayer { kind: &'static str },

    /// Design bundle manifest is structurally invalid.
    #[error("invalid design manifest: {reason}")]
    InvalidManifest { reason: String },

    /// Filesystem operation failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a path to a JSON error.
    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

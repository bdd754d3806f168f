//! framedb-core — device frame template measurement and database
//! reconciliation.
//!
//! Builds and maintains the database of device frame templates used to
//! composite screenshots into photorealistic mockups. The pipeline stages
//! are:
//!
//! 1. **Identity** – asset filename → canonical device key + color key,
//!    via fixed vocabulary and rename tables.
//! 2. **Bounds** – screen cut-out measurement: alpha binarization,
//!    8-connectivity component labeling, center-pixel component selection.
//! 3. **Reconcile** – merge measurements into the keyed database:
//!    first-writer-wins geometry per device, last-writer-wins image per
//!    color.
//! 4. **Defaults** – precedence-ordered default color per device entry.
//!
//! [`Ingestor`] runs the whole pipeline over a directory of assets. The
//! [`compose`] module is the layered-design companion: it rasterizes a
//! design bundle into the same kind of frame asset and records its metadata
//! in the database schema.

pub mod bounds;
pub mod compose;
pub mod db;
pub mod error;
pub mod identity;
pub mod ingest;

pub use bounds::{detect_screen_bounds, ScreenBounds};
pub use db::{DeviceTemplate, TemplateDb, DEFAULT_COLOR_PRECEDENCE};
pub use error::{Error, Result};
pub use identity::{DeviceIdentity, IdentityConfig};
pub use ingest::{IngestConfig, IngestReport, Ingestor};

//! Batch ingestion pipeline.
//!
//! For every frame asset in a directory (already fetched and extracted by an
//! external step): resolve identity from the filename, measure the screen
//! cut-out, merge into the template database, and stage a copy of the asset
//! for distribution. After all assets are processed, default colors are
//! deduced once per device and the database is persisted.
//!
//! Assets are processed in sorted filename order. Geometry is recorded from
//! the first variant seen per device, so ordering must not depend on
//! directory-enumeration quirks of the platform.

use std::path::{Path, PathBuf};

use crate::bounds::detect_screen_bounds;
use crate::db::{TemplateDb, DEFAULT_COLOR_PRECEDENCE};
use crate::error::{Error, Result};
use crate::identity::IdentityConfig;

/// One ingestion run's inputs and filtering rules.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory of extracted frame assets.
    pub frames_dir: PathBuf,
    /// Template database JSON document (created when missing).
    pub db_path: PathBuf,
    /// Directory the processed assets are copied into for distribution.
    pub stage_dir: PathBuf,
    /// Required filename prefix (vendor + product family).
    pub filename_prefix: String,
    /// Required filename extension (without the dot).
    pub filename_extension: String,
}

impl IngestConfig {
    /// Configuration with the stock asset-naming filter (`Apple iP…png`).
    pub fn new(
        frames_dir: impl Into<PathBuf>,
        db_path: impl Into<PathBuf>,
        stage_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            db_path: db_path.into(),
            stage_dir: stage_dir.into(),
            filename_prefix: "Apple iP".to_string(),
            filename_extension: "png".to_string(),
        }
    }

    /// Whether a filename passes the enumeration filter.
    fn matches(&self, filename: &str) -> bool {
        filename.starts_with(&self.filename_prefix)
            && Path::new(filename)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.filename_extension))
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IngestReport {
    /// Assets measured and merged.
    pub assets_processed: usize,
    /// Directory entries that did not pass the naming filter.
    pub assets_skipped: usize,
    /// Device entries in the database after the run.
    pub templates: usize,
    /// Device keys left without a deducible default color.
    pub missing_default: Vec<String>,
}

/// Pipeline entry point. Create once, run over directories.
#[derive(Debug, Clone)]
pub struct Ingestor {
    identity: IdentityConfig,
    default_colors: Vec<String>,
}

impl Default for Ingestor {
    /// Ingestor with the stock lookup tables.
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            default_colors: DEFAULT_COLOR_PRECEDENCE
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl Ingestor {
    /// Ingestor with explicit lookup tables.
    pub fn new(identity: IdentityConfig, default_colors: Vec<String>) -> Self {
        Self {
            identity,
            default_colors,
        }
    }

    /// Run the pipeline: measure and merge every matching asset, deduce
    /// default colors, persist the database.
    ///
    /// Fails fast: the first asset that cannot be resolved, decoded or
    /// measured aborts the run before the database file is rewritten.
    pub fn run(&self, config: &IngestConfig) -> Result<IngestReport> {
        let mut db = TemplateDb::load(&config.db_path)?;
        let mut report = IngestReport::default();

        let mut filenames = Vec::new();
        let dir = std::fs::read_dir(&config.frames_dir)
            .map_err(|e| Error::io(&config.frames_dir, e))?;
        for entry in dir {
            let entry = entry.map_err(|e| Error::io(&config.frames_dir, e))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if config.matches(&name) {
                filenames.push(name);
            } else {
                report.assets_skipped += 1;
            }
        }
        // Deterministic order: first-writer-wins geometry must depend on the
        // asset set, not on directory-enumeration order.
        filenames.sort();

        std::fs::create_dir_all(&config.stage_dir).map_err(|e| Error::io(&config.stage_dir, e))?;

        for filename in &filenames {
            self.process_asset(config, &mut db, filename)?;
            report.assets_processed += 1;
        }

        report.missing_default = db.apply_default_colors(&self.default_colors);
        report.templates = db.len();

        db.save(&config.db_path)?;
        Ok(report)
    }

    fn process_asset(&self, config: &IngestConfig, db: &mut TemplateDb, filename: &str) -> Result<()> {
        let identity = self.identity.resolve(filename)?;
        let path = config.frames_dir.join(filename);

        let image = image::open(&path)?.to_rgba8();
        let (frame_width, frame_height) = image.dimensions();
        let bounds = detect_screen_bounds(&image)?;

        tracing::info!(
            "template {} - {}: +{}+{},{}x{}",
            identity.device_name,
            identity.color_key,
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
        );

        db.merge(
            &identity.device_key,
            &identity.color_key,
            filename,
            frame_width,
            frame_height,
            bounds,
        );

        // Stage exactly once per processed asset, after measurement.
        let staged = config.stage_dir.join(filename);
        std::fs::copy(&path, &staged).map_err(|e| Error::io(&staged, e))?;
        Ok(())
    }
}

//! framedb CLI — build and maintain the device frame template database.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use framedb_core::compose::DesignDocument;
use framedb_core::{detect_screen_bounds, IngestConfig, Ingestor};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "framedb")]
#[command(about = "Measure device frame assets and maintain the template database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a directory of frame assets into the template database.
    Ingest(CliIngestArgs),

    /// Measure the screen bounds of a single frame asset.
    Measure {
        /// Path to the frame image (PNG with alpha).
        #[arg(long)]
        image: PathBuf,
    },

    /// Rasterize a layered design bundle into a frame template.
    Compose(CliComposeArgs),
}

#[derive(Debug, Clone, Args)]
struct CliIngestArgs {
    /// Directory of extracted frame assets.
    #[arg(long)]
    frames_dir: PathBuf,

    /// Template database JSON document (created if missing).
    #[arg(long)]
    db: PathBuf,

    /// Directory processed assets are staged into for distribution.
    #[arg(long)]
    stage_dir: PathBuf,

    /// Filename prefix assets must carry to be ingested.
    #[arg(long, default_value = "Apple iP")]
    filename_prefix: String,

    /// Filename extension assets must carry to be ingested.
    #[arg(long, default_value = "png")]
    filename_extension: String,
}

#[derive(Debug, Clone, Args)]
struct CliComposeArgs {
    /// Design bundle directory (design.json plus layer images).
    #[arg(long)]
    bundle: PathBuf,

    /// Output PNG path; its filename becomes the template name.
    #[arg(long)]
    out: PathBuf,

    /// Optional JSON database to record the template metadata in.
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest(args) => run_ingest(&args),
        Commands::Measure { image } => run_measure(&image),
        Commands::Compose(args) => run_compose(&args),
    }
}

// ── ingest ─────────────────────────────────────────────────────────────

fn run_ingest(args: &CliIngestArgs) -> CliResult<()> {
    let config = IngestConfig {
        frames_dir: args.frames_dir.clone(),
        db_path: args.db.clone(),
        stage_dir: args.stage_dir.clone(),
        filename_prefix: args.filename_prefix.clone(),
        filename_extension: args.filename_extension.clone(),
    };

    tracing::info!("Ingesting frames from {}", config.frames_dir.display());
    let report = Ingestor::default().run(&config)?;

    tracing::info!(
        "Processed {} assets ({} skipped) into {} templates",
        report.assets_processed,
        report.assets_skipped,
        report.templates,
    );
    for key in &report.missing_default {
        tracing::warn!("template {key} has no deducible default color");
    }
    tracing::info!("Database written to {}", config.db_path.display());

    Ok(())
}

// ── measure ────────────────────────────────────────────────────────────

fn run_measure(image_path: &Path) -> CliResult<()> {
    let image = image::open(image_path)
        .map_err(|e| -> CliError {
            format!("Failed to open image {}: {}", image_path.display(), e).into()
        })?
        .to_rgba8();

    let bounds = detect_screen_bounds(&image)?;
    println!("+{}+{},{}x{}", bounds.x, bounds.y, bounds.width, bounds.height);

    Ok(())
}

// ── compose ────────────────────────────────────────────────────────────

fn run_compose(args: &CliComposeArgs) -> CliResult<()> {
    let template_name = args
        .out
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| -> CliError {
            format!("output path {} has no filename", args.out.display()).into()
        })?;

    // Validation and rasterization both happen before anything is written:
    // a bundle missing a required layer produces no partial output.
    let document = DesignDocument::from_bundle(&args.bundle)?;
    tracing::info!(
        "Composing {} (background layer: {})",
        template_name,
        if document.has_background() { "present, hidden" } else { "absent" },
    );
    let composed = document.compose(template_name);

    composed.image.save(&args.out)?;
    tracing::info!(
        "Template written to {} ({}x{}, screen offset +{}+{})",
        args.out.display(),
        composed.record.res_width,
        composed.record.res_height,
        composed.record.offset_x,
        composed.record.offset_y,
    );

    if let Some(db_path) = &args.db {
        framedb_core::compose::record_template(db_path, &composed.key, &composed.record)?;
        tracing::info!("Metadata recorded under '{}' in {}", composed.key, db_path.display());
    }

    Ok(())
}

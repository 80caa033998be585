//! yolo2page - Convert YOLO segmentation labels to PAGE-XML
//!
//! A command line tool that nests the polygons of YOLO label files into
//! a TextRegion/TextLine hierarchy and writes one PAGE-XML file per page.
//!
//! Given a label file, converts that page. Given a folder, converts every
//! `*.txt` file in it, looking up images by file stem.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pagetree_core::api::{ConvertOptions, convert_folder, convert_page_to_file};
use pagetree_core::dimensions::find_image_for;
use pagetree_core::layout::{BuildParams, DEFAULT_CONTAINMENT_THRESHOLD, OrphanLinePolicy};
use pagetree_core::mapping::Mapping;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert YOLO segmentation labels to hierarchical PAGE-XML.
#[derive(Parser, Debug)]
#[command(name = "yolo2page")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A label file (*.txt) or a folder of label files
    labels: PathBuf,

    /// The page image, or the folder holding images named after the labels
    images: PathBuf,

    /// Output file (single page) or folder (batch). Defaults to the label
    /// path with an .xml extension, or <labels>/page_xml for folders
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// JSON file mapping class ids to element rules
    #[arg(short = 'm', long)]
    mapping: Option<PathBuf>,

    /// Minimum share of a region's area that must lie inside its parent
    #[arg(long = "region-threshold", default_value_t = DEFAULT_CONTAINMENT_THRESHOLD)]
    region_threshold: f64,

    /// Minimum share of a line's area that must lie inside its region
    #[arg(long = "line-threshold", default_value_t = DEFAULT_CONTAINMENT_THRESHOLD)]
    line_threshold: f64,

    /// Let later orphan lines join a TextRegion synthesized for an earlier one
    #[arg(long = "reuse-orphan-parents", action = ArgAction::SetTrue)]
    reuse_orphan_parents: bool,

    /// Worker threads for folder conversion (default: all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build ConvertOptions from command line arguments.
fn build_options(args: &Args) -> Result<ConvertOptions> {
    let orphan_lines = if args.reuse_orphan_parents {
        OrphanLinePolicy::Reuse
    } else {
        OrphanLinePolicy::PerLine
    };
    let params = BuildParams::new(args.region_threshold, args.line_threshold)?
        .with_orphan_lines(orphan_lines);
    if args.threads == Some(0) {
        bail!("--threads must be at least 1");
    }
    Ok(ConvertOptions {
        params,
        threads: args.threads,
        created: None,
    })
}

fn load_mapping(path: Option<&Path>) -> Result<Mapping> {
    match path {
        Some(path) => Mapping::load(path)
            .with_context(|| format!("failed to load mapping {}", path.display())),
        None => {
            info!("no mapping given, using the built-in line mapping");
            Ok(Mapping::default())
        }
    }
}

/// Resolve the image for a single label file: either the file given, or
/// the image in the given folder that shares the label's stem.
fn resolve_image(label: &Path, images: &Path) -> Result<PathBuf> {
    if !images.is_dir() {
        return Ok(images.to_path_buf());
    }
    let stem = label
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    find_image_for(&stem, images)
        .with_context(|| format!("no image for {} in {}", label.display(), images.display()))
}

fn convert_single(args: &Args, mapping: &Mapping, options: &ConvertOptions) -> Result<()> {
    let image = resolve_image(&args.labels, &args.images)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.labels.with_extension("xml"));

    let outcome = convert_page_to_file(&args.labels, &image, &output, mapping, options)
        .with_context(|| format!("failed to convert {}", args.labels.display()))?;

    let stats = outcome.layout.stats;
    println!(
        "{}: {} regions, {} lines ({} synthesized), {} skipped lines, {} excluded",
        output.display(),
        stats.top_level + stats.nested + stats.promoted,
        stats.lines_assigned + stats.lines_synthesized,
        stats.lines_synthesized,
        outcome.skipped_lines.len(),
        outcome.layout.excluded.len(),
    );
    Ok(())
}

fn convert_batch(args: &Args, mapping: &Mapping, options: &ConvertOptions) -> Result<bool> {
    let summary = convert_folder(
        &args.labels,
        &args.images,
        args.output.as_deref(),
        mapping,
        options,
        None,
    )?;

    for failure in &summary.failed {
        eprintln!("Error: {}: {}", failure.label.display(), failure.error);
    }
    println!(
        "converted {} of {} pages ({} failed)",
        summary.converted.len(),
        summary.total(),
        summary.failed.len(),
    );
    Ok(summary.failed.is_empty())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let options = build_options(&args)?;
    let mapping = load_mapping(args.mapping.as_deref())?;

    if !args.labels.exists() {
        bail!("File not found: {}", args.labels.display());
    }

    if args.labels.is_dir() {
        if !convert_batch(&args, &mapping, &options)? {
            std::process::exit(1);
        }
    } else {
        convert_single(&args, &mapping, &options)?;
    }

    Ok(())
}

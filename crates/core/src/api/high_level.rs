//! High-level conversion API.
//!
//! Provides the main entry points:
//! - `build_page_layout()` - Classify and nest one page's annotations in memory
//! - `convert_page()` - Label file + image to a PageLayout
//! - `convert_page_to_file()` - Same, writing PAGE-XML to disk
//! - `convert_folder()` - Every label file of a folder, one rayon task per page

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::annotation::{RawAnnotation, parse_page};
use crate::classify::classify_page;
use crate::converter::PageXmlWriter;
use crate::dimensions::{find_image_for, image_dimensions};
use crate::error::{PageError, Result};
use crate::layout::{BuildParams, HierarchyBuilder, PageLayout};
use crate::mapping::Mapping;

pub(crate) fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Options for page and folder conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    /// Hierarchy build parameters.
    pub params: BuildParams,

    /// Worker threads for folder conversion. None uses all available cores.
    pub threads: Option<usize>,

    /// Timestamp written to Metadata/Created. None uses the current UTC time.
    pub created: Option<String>,
}

impl ConvertOptions {
    fn timestamp(&self) -> String {
        self.created
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Result of converting one page.
#[derive(Debug)]
pub struct PageOutcome {
    pub layout: PageLayout,
    /// Label lines that could not be parsed
    pub skipped_lines: Vec<PageError>,
    /// File name recorded in Page/@imageFilename
    pub image_filename: String,
}

/// A page that could not be converted during a folder run.
#[derive(Debug)]
pub struct PageFailure {
    pub label: PathBuf,
    pub error: PageError,
}

/// Outcome of a folder run.
#[derive(Debug, Default)]
pub struct FolderSummary {
    /// Written XML files, ordered by label file name
    pub converted: Vec<PathBuf>,
    pub failed: Vec<PageFailure>,
    /// Pages never started because the run was cancelled
    pub cancelled: Vec<PathBuf>,
}

impl FolderSummary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len() + self.cancelled.len()
    }
}

/// Classifies and nests one page's annotations.
///
/// `page` only labels diagnostics. Unknown classes and degenerate polygons
/// end up in `PageLayout::excluded`.
pub fn build_page_layout(
    annotations: &[RawAnnotation],
    mapping: &Mapping,
    page_size: (u32, u32),
    params: &BuildParams,
    page: &str,
) -> PageLayout {
    let (classified, excluded) = classify_page(annotations, mapping, page_size, page);
    let forest = HierarchyBuilder::new(*params).build(classified);
    PageLayout {
        width: page_size.0,
        height: page_size.1,
        roots: forest.roots,
        excluded,
        stats: forest.stats,
    }
}

/// Converts one label file and its image into a layout.
pub fn convert_page(
    label_path: impl AsRef<Path>,
    image_path: impl AsRef<Path>,
    mapping: &Mapping,
    options: &ConvertOptions,
) -> Result<PageOutcome> {
    let label_path = label_path.as_ref();
    let image_path = image_path.as_ref();

    let page_size = image_dimensions(image_path)?;
    let labels = parse_page(label_path)?;
    let page = label_path.display().to_string();
    let layout = build_page_layout(
        &labels.annotations,
        mapping,
        page_size,
        &options.params,
        &page,
    );

    if !labels.skipped.is_empty() || !layout.excluded.is_empty() {
        warn!(
            page,
            skipped_lines = labels.skipped.len(),
            excluded_regions = layout.excluded.len(),
            "page converted with omissions"
        );
    }

    let image_filename = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(PageOutcome {
        layout,
        skipped_lines: labels.skipped,
        image_filename,
    })
}

/// Converts one page and writes PAGE-XML to `output_path`.
pub fn convert_page_to_file(
    label_path: impl AsRef<Path>,
    image_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    mapping: &Mapping,
    options: &ConvertOptions,
) -> Result<PageOutcome> {
    let output_path = output_path.as_ref();
    let outcome = convert_page(label_path, image_path, mapping, options)?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(output_path)?);
    let mut writer = PageXmlWriter::new(file, &options.timestamp());
    writer.write_page(&outcome.image_filename, &outcome.layout)?;
    info!(output = %output_path.display(), "created PAGE-XML");
    Ok(outcome)
}

/// Lists `*.txt` label files in a directory, sorted by file name.
pub fn list_label_files(labels_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(labels_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

enum PageRun {
    Converted(PathBuf),
    Failed(PageError),
    Cancelled,
}

/// Converts every label file in `labels_dir`.
///
/// Pages run in parallel on a dedicated rayon pool and never abort the run;
/// failures are collected in the summary. Setting `cancel` stops pages that
/// have not started yet. Output defaults to `<labels_dir>/page_xml`.
pub fn convert_folder(
    labels_dir: impl AsRef<Path>,
    images_dir: impl AsRef<Path>,
    output_dir: Option<&Path>,
    mapping: &Mapping,
    options: &ConvertOptions,
    cancel: Option<&AtomicBool>,
) -> Result<FolderSummary> {
    let labels_dir = labels_dir.as_ref();
    let images_dir = images_dir.as_ref();
    for dir in [labels_dir, images_dir] {
        if !dir.is_dir() {
            return Err(PageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("folder not found: {}", dir.display()),
            )));
        }
    }

    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| labels_dir.join("page_xml"));
    std::fs::create_dir_all(&output_dir)?;

    let labels = list_label_files(labels_dir)?;
    if labels.is_empty() {
        warn!(folder = %labels_dir.display(), "no label files found");
        return Ok(FolderSummary::default());
    }
    info!(count = labels.len(), "converting label files");

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or_else(default_thread_count))
        .build()
        .map_err(|e| PageError::ThreadPool(e.to_string()))?;

    let runs: Vec<(PathBuf, PageRun)> = pool.install(|| {
        labels
            .into_par_iter()
            .map(|label| {
                if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    return (label, PageRun::Cancelled);
                }
                let result = convert_folder_page(&label, images_dir, &output_dir, mapping, options);
                let run = match result {
                    Ok(output) => PageRun::Converted(output),
                    Err(err) => {
                        error!(label = %label.display(), error = %err, "failed to convert page");
                        PageRun::Failed(err)
                    }
                };
                (label, run)
            })
            .collect()
    });

    let mut summary = FolderSummary::default();
    for (label, run) in runs {
        match run {
            PageRun::Converted(output) => summary.converted.push(output),
            PageRun::Failed(error) => summary.failed.push(PageFailure { label, error }),
            PageRun::Cancelled => summary.cancelled.push(label),
        }
    }

    info!(
        converted = summary.converted.len(),
        failed = summary.failed.len(),
        cancelled = summary.cancelled.len(),
        "conversion complete"
    );
    Ok(summary)
}

fn convert_folder_page(
    label: &Path,
    images_dir: &Path,
    output_dir: &Path,
    mapping: &Mapping,
    options: &ConvertOptions,
) -> Result<PathBuf> {
    let stem = label
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let image = find_image_for(&stem, images_dir).ok_or_else(|| PageError::ImageRead {
        path: images_dir.join(&stem),
        msg: "no image found for label".to_string(),
    })?;
    let output = output_dir.join(format!("{stem}.xml"));
    convert_page_to_file(label, &image, &output, mapping, options)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ElementKind;
    use crate::mapping::ElementRule;

    fn square(class_id: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> RawAnnotation {
        RawAnnotation {
            class_id,
            vertices: vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)],
        }
    }

    #[test]
    fn test_build_page_layout_reports_exclusions() {
        let mapping = Mapping::new([(0, ElementRule::new(ElementKind::TextRegion))]);
        let annotations = [square(0, 0.0, 0.0, 0.5, 0.5), square(7, 0.0, 0.0, 0.5, 0.5)];
        let layout = build_page_layout(
            &annotations,
            &mapping,
            (100, 100),
            &BuildParams::default(),
            "p",
        );
        assert_eq!(layout.roots.len(), 1);
        assert_eq!(layout.excluded.len(), 1);
        assert_eq!(layout.excluded[0].class_id, 7);
        assert_eq!(layout.stats.top_level, 1);
    }

    #[test]
    fn test_timestamp_prefers_explicit_value() {
        let options = ConvertOptions {
            created: Some("fixed".to_string()),
            ..ConvertOptions::default()
        };
        assert_eq!(options.timestamp(), "fixed");
        assert!(ConvertOptions::default().timestamp().ends_with('Z'));
    }

    #[test]
    fn test_convert_folder_missing_dir() {
        let err = convert_folder(
            "/nonexistent/labels",
            "/nonexistent/images",
            None,
            &Mapping::default(),
            &ConvertOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PageError::Io(_)));
    }
}

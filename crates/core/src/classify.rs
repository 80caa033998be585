//! Element classification: raw annotations to typed, absolutely positioned regions.

use tracing::warn;

use crate::annotation::RawAnnotation;
use crate::error::{PageError, Result};
use crate::geometry::Shape;
use crate::layout::{ElementKind, Excluded};
use crate::mapping::{ElementRule, Mapping};
use crate::utils::Point;

/// A region ready for the hierarchy build pass.
#[derive(Debug, Clone)]
pub struct Classified<'m> {
    /// Creation sequence: the annotation's position in the label file
    pub seq: usize,
    pub class_id: u32,
    pub rule: &'m ElementRule,
    pub shape: Shape,
}

impl Classified<'_> {
    pub fn kind(&self) -> ElementKind {
        self.rule.element_kind
    }
}

/// Products this close to a whole pixel are snapped to it before truncation,
/// so that e.g. 0.29 * 100 lands on 29 rather than 28.
const PIXEL_SNAP: f64 = 1e-6;

fn to_pixel(v: f64) -> f64 {
    let nearest = v.round();
    if (v - nearest).abs() < PIXEL_SNAP {
        nearest
    } else {
        v.trunc()
    }
}

/// Scales normalized vertices to whole pixels, truncating toward zero.
pub fn denormalize(vertices: &[Point], width: u32, height: u32) -> Vec<Point> {
    let (w, h) = (f64::from(width), f64::from(height));
    vertices
        .iter()
        .map(|&(x, y)| (to_pixel(x * w), to_pixel(y * h)))
        .collect()
}

/// Resolves one annotation against the mapping.
pub fn classify<'m>(
    raw: &RawAnnotation,
    seq: usize,
    mapping: &'m Mapping,
    page_size: (u32, u32),
) -> Result<Classified<'m>> {
    let rule = mapping
        .get(raw.class_id)
        .ok_or(PageError::UnknownClass(raw.class_id))?;
    let (width, height) = page_size;
    let shape = Shape::new(denormalize(&raw.vertices, width, height))?;
    Ok(Classified {
        seq,
        class_id: raw.class_id,
        rule,
        shape,
    })
}

/// Classifies every annotation of a page.
///
/// Unknown classes and degenerate polygons are dropped with a warning and
/// reported in the returned exclusion list.
pub fn classify_page<'m>(
    annotations: &[RawAnnotation],
    mapping: &'m Mapping,
    page_size: (u32, u32),
    page: &str,
) -> (Vec<Classified<'m>>, Vec<Excluded>) {
    let mut classified = Vec::with_capacity(annotations.len());
    let mut excluded = Vec::new();

    for (seq, raw) in annotations.iter().enumerate() {
        match classify(raw, seq, mapping, page_size) {
            Ok(region) => classified.push(region),
            Err(err) => {
                warn!(page, class_id = raw.class_id, seq, error = %err, "skipping region");
                excluded.push(Excluded {
                    seq,
                    class_id: raw.class_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    (classified, excluded)
}

//! Polygon primitives used for containment tests.
//!
//! All functions are pure. Intersection is computed with `geo`'s boolean
//! operations, which handle non-convex simple polygons; callers always pass
//! (inner, outer) in the same order so repeated runs produce identical ratios.

use geo::{Area, BooleanOps, Coord, LineString, Polygon};
use rustc_hash::FxHashSet;

use crate::error::{PageError, Result};
use crate::utils::{HasBBox, Point, Rect, get_bound, rects_overlap};

fn distinct_vertices(polygon: &[Point]) -> usize {
    polygon
        .iter()
        .map(|(x, y)| (x.to_bits(), y.to_bits()))
        .collect::<FxHashSet<_>>()
        .len()
}

/// Polygon area via the shoelace formula (absolute value).
///
/// Fails with `DegeneratePolygon` when fewer than 3 distinct vertices are
/// supplied. Collinear vertices yield `Ok(0.0)`.
pub fn area(polygon: &[Point]) -> Result<f64> {
    let distinct = distinct_vertices(polygon);
    if distinct < 3 {
        return Err(PageError::DegeneratePolygon(format!(
            "{distinct} distinct vertices, need at least 3"
        )));
    }

    let n = polygon.len();
    let mut twice = 0.0;
    for i in 0..n {
        let (x0, y0) = polygon[i];
        let (x1, y1) = polygon[(i + 1) % n];
        twice += x0 * y1 - x1 * y0;
    }
    Ok((twice / 2.0).abs())
}

/// Axis-aligned bounding box (min_x, min_y, max_x, max_y).
pub fn bounding_box(polygon: &[Point]) -> Rect {
    get_bound(polygon.iter().copied())
}

fn to_geo(polygon: &[Point]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = polygon.iter().map(|&(x, y)| Coord { x, y }).collect();
    Polygon::new(LineString::new(coords), Vec::new())
}

/// Exact intersection area between two simple polygons.
///
/// Returns 0 without clipping when the bounding boxes do not overlap.
pub fn intersection_area(a: &[Point], b: &[Point]) -> f64 {
    if !rects_overlap(bounding_box(a), bounding_box(b)) {
        return 0.0;
    }
    to_geo(a).intersection(&to_geo(b)).unsigned_area()
}

/// Fraction of `inner`'s area that lies inside `outer`, in [0, 1].
pub fn containment_ratio(inner: &[Point], outer: &[Point]) -> Result<f64> {
    let inner_area = area(inner)?;
    if inner_area == 0.0 {
        return Err(PageError::DegeneratePolygon(
            "inner polygon has zero area".to_string(),
        ));
    }
    Ok((intersection_area(inner, outer) / inner_area).clamp(0.0, 1.0))
}

/// A validated polygon with its bounding box, area and clip form cached.
///
/// The hierarchy builder compares every child against many candidate
/// parents, so the conversion to `geo` is done once per region.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    points: Vec<Point>,
    bbox: Rect,
    area: f64,
    clip: Polygon<f64>,
}

impl Shape {
    /// Builds a shape, rejecting polygons without a positive, finite area.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let area = area(&points)?;
        if !(area > 0.0 && area.is_finite()) {
            return Err(PageError::DegeneratePolygon(format!(
                "area {area} is not positive and finite"
            )));
        }
        let bbox = bounding_box(&points);
        let clip = to_geo(&points);
        Ok(Self {
            points,
            bbox,
            area,
            clip,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Intersection area with another shape, short-circuiting on disjoint boxes.
    pub fn intersection_area(&self, other: &Shape) -> f64 {
        if !rects_overlap(self.bbox, other.bbox) {
            return 0.0;
        }
        self.clip.intersection(&other.clip).unsigned_area()
    }

    /// Fraction of this shape's area inside `outer`.
    pub fn containment_in(&self, outer: &Shape) -> f64 {
        (self.intersection_area(outer) / self.area).clamp(0.0, 1.0)
    }
}

impl HasBBox for Shape {
    fn x0(&self) -> f64 {
        self.bbox.0
    }
    fn y0(&self) -> f64 {
        self.bbox.1
    }
    fn x1(&self) -> f64 {
        self.bbox.2
    }
    fn y1(&self) -> f64 {
        self.bbox.3
    }
}

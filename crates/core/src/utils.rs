//! Miscellaneous routines shared by the conversion pipeline.
//!
//! Provides:
//! - Geometric aliases (Point, Rect) and the HasBBox trait
//! - Plane, an R-tree backed index used to look up candidate parents
//! - Formatting helpers for PAGE-XML output

use std::borrow::Cow;

use rstar::{AABB, RTree, RTreeObject};

/// Floating-point infinity for bounding box calculations.
pub const INF_F64: f64 = f64::MAX;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// An axis-aligned rectangle (min_x, min_y, max_x, max_y).
pub type Rect = (f64, f64, f64, f64);

/// Trait for objects that have a bounding box.
pub trait HasBBox {
    fn x0(&self) -> f64;
    fn y0(&self) -> f64;
    fn x1(&self) -> f64;
    fn y1(&self) -> f64;

    fn bbox(&self) -> Rect {
        (self.x0(), self.y0(), self.x1(), self.y1())
    }

    fn width(&self) -> f64 {
        self.x1() - self.x0()
    }

    fn height(&self) -> f64 {
        self.y1() - self.y0()
    }
}

/// Computes a minimal rectangle that covers all the points.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Rect {
    let mut x0 = INF_F64;
    let mut y0 = INF_F64;
    let mut x1 = -INF_F64;
    let mut y1 = -INF_F64;

    for (x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }

    (x0, y0, x1, y1)
}

/// Returns true if two rectangles share any area or boundary.
#[inline]
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    !(a.2 < b.0 || b.2 < a.0 || a.3 < b.1 || b.3 < a.1)
}

#[derive(Clone)]
struct PlaneNode {
    id: usize,
    bbox: Rect,
}

impl PartialEq for PlaneNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl RTreeObject for PlaneNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.bbox.0, self.bbox.1], [self.bbox.2, self.bbox.3])
    }
}

/// A set-like data structure for objects placed on a plane.
///
/// Items are stored in insertion order and ids are stable (id == seq index).
/// Lookups return ids in ascending order so callers iterate deterministically
/// regardless of the tree's internal layout.
pub struct Plane<T> {
    seq: Vec<T>,
    tree: RTree<PlaneNode>,
}

impl<T> Default for Plane<T> {
    fn default() -> Self {
        Self {
            seq: Vec::new(),
            tree: RTree::new(),
        }
    }
}

impl<T: HasBBox> Plane<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object to the plane (indexed immediately).
    pub fn add(&mut self, obj: T) -> usize {
        let id = self.seq.len();
        let bbox = obj.bbox();
        self.seq.push(obj);
        self.tree.insert(PlaneNode { id, bbox });
        id
    }

    /// Finds objects whose bounding box touches the given one.
    pub fn find(&self, bbox: Rect) -> Vec<&T> {
        self.find_with_indices(bbox)
            .into_iter()
            .map(|(_, obj)| obj)
            .collect()
    }

    /// Finds objects whose bounding box touches the given one, as (index, object) pairs.
    pub fn find_with_indices(&self, bbox: Rect) -> Vec<(usize, &T)> {
        let env = AABB::from_corners([bbox.0, bbox.1], [bbox.2, bbox.3]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&env)
            .map(|node| node.id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| (id, &self.seq[id])).collect()
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Formats absolute points as a PAGE `Coords/@points` value ("x,y x,y ...").
pub fn points2str(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 10);
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{},{}", *x as i64, *y as i64));
    }
    out
}

/// Encodes a string for XML attributes by escaping special characters.
///
/// Returns `Cow::Borrowed` if no escaping needed (zero allocation),
/// or `Cow::Owned` with escaped string (single allocation).
pub fn enc(x: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Boxed(Rect);

    impl HasBBox for Boxed {
        fn x0(&self) -> f64 {
            self.0.0
        }
        fn y0(&self) -> f64 {
            self.0.1
        }
        fn x1(&self) -> f64 {
            self.0.2
        }
        fn y1(&self) -> f64 {
            self.0.3
        }
    }

    #[test]
    fn test_get_bound() {
        let bound = get_bound(vec![(3.0, 4.0), (-1.0, 10.0), (5.0, 2.0)]);
        assert_eq!(bound, (-1.0, 2.0, 5.0, 10.0));
    }

    #[test]
    fn test_rects_overlap_touching_edges() {
        assert!(rects_overlap((0.0, 0.0, 10.0, 10.0), (10.0, 0.0, 20.0, 10.0)));
        assert!(!rects_overlap((0.0, 0.0, 10.0, 10.0), (10.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_plane_find_returns_ascending_ids() {
        let mut plane = Plane::new();
        plane.add(Boxed((50.0, 50.0, 60.0, 60.0)));
        plane.add(Boxed((0.0, 0.0, 100.0, 100.0)));
        plane.add(Boxed((5.0, 5.0, 20.0, 20.0)));

        let hits: Vec<usize> = plane
            .find_with_indices((8.0, 8.0, 9.0, 9.0))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(hits, vec![1, 2]);
        assert_eq!(plane.len(), 3);
        assert!(!plane.is_empty());
        assert!(Plane::<Boxed>::new().is_empty());
    }

    #[test]
    fn test_points2str_truncates() {
        assert_eq!(points2str(&[(1.9, 2.0), (10.0, 20.5)]), "1,2 10,20");
    }

    #[test]
    fn test_enc_escapes_quotes() {
        assert_eq!(enc("a\"b<c"), "a&quot;b&lt;c");
    }
}

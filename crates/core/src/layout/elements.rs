//! Layout element types: ElementKind, Region, PageLayout.

use std::fmt;
use std::str::FromStr;

use crate::utils::Point;

/// PAGE element kinds a class id can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    TextRegion,
    TextLine,
    TableRegion,
    ImageRegion,
    GraphicRegion,
    SeparatorRegion,
    NoiseRegion,
}

impl ElementKind {
    pub const ALL: [ElementKind; 7] = [
        Self::TextRegion,
        Self::TextLine,
        Self::TableRegion,
        Self::ImageRegion,
        Self::GraphicRegion,
        Self::SeparatorRegion,
        Self::NoiseRegion,
    ];

    /// The PAGE-XML element name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextRegion => "TextRegion",
            Self::TextLine => "TextLine",
            Self::TableRegion => "TableRegion",
            Self::ImageRegion => "ImageRegion",
            Self::GraphicRegion => "GraphicRegion",
            Self::SeparatorRegion => "SeparatorRegion",
            Self::NoiseRegion => "NoiseRegion",
        }
    }

    pub const fn is_line(self) -> bool {
        matches!(self, Self::TextLine)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown element kind '{s}'"))
    }
}

/// A node of the recovered layout tree.
///
/// Regions own their children; `parent` is a non-owning back reference
/// holding the parent's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Page-unique id, `r%04d` for regions and `l%04d` for lines
    pub id: String,
    pub kind: ElementKind,
    /// PAGE `type` attribute (e.g. "paragraph"), TextRegion only in output
    pub subtype: Option<String>,
    /// Absolute pixel coordinates
    pub polygon: Vec<Point>,
    pub area: f64,
    pub parent: Option<String>,
    pub children: Vec<Region>,
    /// True for TextRegions created to hold an orphan line
    pub synthetic: bool,
}

impl Region {
    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn walk(&self) -> RegionWalk<'_> {
        RegionWalk { stack: vec![self] }
    }
}

/// Pre-order iterator returned by [`Region::walk`] and [`PageLayout::walk`].
pub struct RegionWalk<'a> {
    stack: Vec<&'a Region>,
}

impl<'a> Iterator for RegionWalk<'a> {
    type Item = &'a Region;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A region dropped from the tree, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Excluded {
    /// Position of the annotation in the label file
    pub seq: usize,
    pub class_id: u32,
    pub reason: String,
}

/// Counters collected during one build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub top_level: usize,
    pub nested: usize,
    pub promoted: usize,
    pub lines_assigned: usize,
    pub lines_synthesized: usize,
}

/// The recovered forest for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    /// Top-level roots in creation order
    pub roots: Vec<Region>,
    pub excluded: Vec<Excluded>,
    pub stats: BuildStats,
}

impl PageLayout {
    /// Depth-first walk over every node of every root.
    pub fn walk(&self) -> impl Iterator<Item = &Region> {
        self.roots.iter().flat_map(Region::walk)
    }

    /// Looks up a node anywhere in the forest by id.
    pub fn find(&self, id: &str) -> Option<&Region> {
        self.walk().find(|region| region.id == id)
    }
}

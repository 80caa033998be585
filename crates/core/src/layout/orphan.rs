//! Orphan resolution for regions and lines with no qualifying parent.
//!
//! Resolution is a pure function of the orphan and the build policy; the
//! hierarchy builder applies the returned decision to its arena.

use crate::geometry::Shape;
use crate::mapping::ElementRule;

use super::elements::ElementKind;

/// How orphan lines obtain their synthetic TextRegion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanLinePolicy {
    /// Every orphan line gets its own synthetic parent.
    #[default]
    PerLine,
    /// Synthetic parents become candidates for later lines, so a line that
    /// falls inside an earlier orphan's parent joins it instead.
    Reuse,
}

/// A region or line that found no geometric parent.
#[derive(Debug, Clone, Copy)]
pub struct Orphan<'a> {
    pub kind: ElementKind,
    pub rule: &'a ElementRule,
    pub shape: &'a Shape,
}

/// A TextRegion to create around an orphan line.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticParent {
    pub kind: ElementKind,
    pub subtype: String,
    pub shape: Shape,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    /// The orphan becomes a top-level root as-is.
    Promoted,
    /// The orphan is wrapped in a new top-level region.
    Synthesized(SyntheticParent),
}

/// Decides what happens to an orphan. Nothing is ever dropped.
pub fn resolve_orphan(orphan: Orphan<'_>) -> Resolution {
    if orphan.kind.is_line() {
        Resolution::Synthesized(SyntheticParent {
            kind: ElementKind::TextRegion,
            subtype: orphan.rule.default_parent_subtype().to_string(),
            shape: orphan.shape.clone(),
        })
    } else {
        Resolution::Promoted
    }
}

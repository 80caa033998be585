//! Hierarchy inference: links one page's classified regions into a forest.
//!
//! The pass runs in three tiers. Top-level containers become roots as they
//! are. Nested regions are placed largest first, so every region that could
//! contain one is already final when it is evaluated. Lines go last, smallest
//! first, into the tightest TextRegion that contains them.
//!
//! A candidate must be strictly larger than the region it would hold, so no
//! region ends up beneath one it contains. Among qualifying candidates the
//! one with the smallest area wins; equal areas fall back to the lower
//! creation sequence. That total order is what makes output reproducible
//! across runs.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use tracing::{debug, info};

use crate::classify::Classified;
use crate::geometry::Shape;
use crate::mapping::ElementRule;
use crate::utils::{HasBBox, Plane, Rect, get_bound};

use super::arena::{Node, NodeId, RegionArena};
use super::elements::{BuildStats, ElementKind, Region};
use super::orphan::{Orphan, OrphanLinePolicy, Resolution, resolve_orphan};
use super::params::BuildParams;

/// Processing group of a classified region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// No structural parent: roots by construction.
    TopLevel,
    /// Must sit inside a region of `required_parent_kind`.
    Nested,
    /// TextLines.
    Line,
}

impl Tier {
    pub fn of(rule: &ElementRule) -> Self {
        if rule.element_kind.is_line() {
            Self::Line
        } else if rule.required_parent_kind.is_some() {
            Self::Nested
        } else {
            Self::TopLevel
        }
    }
}

/// Output of one build pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    pub roots: Vec<Region>,
    pub stats: BuildStats,
}

/// A finalized region that later regions may nest into.
struct Candidate {
    node: NodeId,
    bbox: Rect,
}

impl HasBBox for Candidate {
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

/// Builds a page's region forest from geometric containment.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    params: BuildParams,
}

impl HierarchyBuilder {
    pub fn new(params: BuildParams) -> Self {
        Self { params }
    }

    /// Runs the build pass over one page's regions.
    pub fn build(&self, regions: Vec<Classified<'_>>) -> Forest {
        let input_len = regions.iter().map(|r| r.seq + 1).max().unwrap_or(0);
        let mut top_level = Vec::new();
        let mut nested = Vec::new();
        let mut lines = Vec::new();
        for region in regions {
            match Tier::of(region.rule) {
                Tier::TopLevel => top_level.push(region),
                Tier::Nested => nested.push(region),
                Tier::Line => lines.push(region),
            }
        }

        top_level.sort_by_key(|r| r.seq);
        nested.sort_by_key(|r| (Reverse(OrderedFloat(r.shape.area())), r.seq));
        lines.sort_by_key(|r| (OrderedFloat(r.shape.area()), r.seq));

        let mut pass = BuildPass::new(&self.params, input_len);
        for region in top_level {
            pass.place_top_level(region);
        }
        for region in nested {
            pass.place_nested(region);
        }
        for line in lines {
            pass.place_line(line);
        }
        pass.finish()
    }
}

struct BuildPass<'p> {
    params: &'p BuildParams,
    arena: RegionArena,
    candidates: Plane<Candidate>,
    stats: BuildStats,
}

impl<'p> BuildPass<'p> {
    fn new(params: &'p BuildParams, input_len: usize) -> Self {
        Self {
            params,
            arena: RegionArena::with_input_len(input_len),
            candidates: Plane::new(),
            stats: BuildStats::default(),
        }
    }

    fn push(&mut self, region: Classified<'_>) -> NodeId {
        let kind = region.kind();
        let subtype = region.rule.subtype.clone();
        self.arena.push(region.seq, kind, subtype, region.shape)
    }

    fn publish(&mut self, node: NodeId) {
        let bbox = self.arena.get(node).shape.bbox();
        self.candidates.add(Candidate { node, bbox });
    }

    fn place_top_level(&mut self, region: Classified<'_>) {
        let node = self.push(region);
        self.arena.finalize(node);
        self.arena.add_root(node);
        self.publish(node);
        self.stats.top_level += 1;
    }

    fn place_nested(&mut self, region: Classified<'_>) {
        let Some(required) = region.rule.required_parent_kind else {
            return self.place_top_level(region);
        };
        let wanted_subtype = region.rule.parent_subtype.as_deref();
        let parent = self.tightest_parent(&region.shape, self.params.region_threshold, |n| {
            n.kind == required && wanted_subtype.is_none_or(|s| n.subtype.as_deref() == Some(s))
        });

        match parent {
            Some((parent, ratio)) => {
                let node = self.push(region);
                self.arena.attach(node, parent);
                let label = self.arena.finalize(node).to_string();
                debug!(
                    region = %label,
                    parent = self.arena.label(parent).unwrap_or_default(),
                    ratio,
                    "nested region"
                );
                self.publish(node);
                self.stats.nested += 1;
            }
            None => {
                let resolution = resolve_orphan(Orphan {
                    kind: region.kind(),
                    rule: region.rule,
                    shape: &region.shape,
                });
                let seq = region.seq;
                let node = self.push(region);
                self.apply_resolution(node, resolution);
                self.arena.finalize(node);
                debug!(seq, "region has no parent, promoted to page level");
                self.publish(node);
                self.stats.promoted += 1;
            }
        }
    }

    fn place_line(&mut self, line: Classified<'_>) {
        let parent = self.tightest_parent(&line.shape, self.params.line_threshold, |n| {
            n.kind == ElementKind::TextRegion
        });

        match parent {
            Some((parent, ratio)) => {
                let node = self.push(line);
                self.arena.attach(node, parent);
                if self.arena.get(parent).synthetic {
                    self.grow_synthetic(parent, node);
                }
                let label = self.arena.finalize(node).to_string();
                debug!(
                    line = %label,
                    parent = self.arena.label(parent).unwrap_or_default(),
                    ratio,
                    "assigned line"
                );
                self.stats.lines_assigned += 1;
            }
            None => {
                let resolution = resolve_orphan(Orphan {
                    kind: line.kind(),
                    rule: line.rule,
                    shape: &line.shape,
                });
                let node = self.push(line);
                self.apply_resolution(node, resolution);
                self.arena.finalize(node);
                self.stats.lines_synthesized += 1;
            }
        }
    }

    /// Applies an orphan decision to an unlinked node.
    fn apply_resolution(&mut self, node: NodeId, resolution: Resolution) {
        match resolution {
            Resolution::Promoted => self.arena.add_root(node),
            Resolution::Synthesized(parent) => {
                let wrapper =
                    self.arena
                        .push_synthetic(parent.kind, Some(parent.subtype), parent.shape);
                let label = self.arena.finalize(wrapper).to_string();
                self.arena.add_root(wrapper);
                self.arena.attach(node, wrapper);
                debug!(region = %label, "created synthetic parent for orphan");
                if self.params.orphan_lines == OrphanLinePolicy::Reuse {
                    self.publish(wrapper);
                }
            }
        }
    }

    /// Widens a shared synthetic parent to the bounding rectangle of itself
    /// and `line`, then republishes it under the wider box.
    fn grow_synthetic(&mut self, parent: NodeId, line: NodeId) {
        let (x0, y0, x1, y1) = get_bound(
            self.arena
                .get(parent)
                .shape
                .points()
                .iter()
                .chain(self.arena.get(line).shape.points())
                .copied(),
        );
        match Shape::new(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]) {
            Ok(shape) => {
                self.arena.set_shape(parent, shape);
                self.publish(parent);
            }
            Err(err) => debug!(error = %err, "synthetic parent left unchanged"),
        }
    }

    /// Finds the smallest candidate holding at least `threshold` of `shape`.
    ///
    /// Input regions no larger than `shape` are skipped. Synthetic parents
    /// are exempt because they grow to cover every line they take.
    fn tightest_parent(
        &self,
        shape: &Shape,
        threshold: f64,
        accept: impl Fn(&Node) -> bool,
    ) -> Option<(NodeId, f64)> {
        self.candidates
            .find(shape.bbox())
            .into_iter()
            .map(|candidate| candidate.node)
            .filter(|&id| {
                let node = self.arena.get(id);
                (node.synthetic || node.shape.area() > shape.area()) && accept(node)
            })
            .filter_map(|id| {
                let ratio = shape.containment_in(&self.arena.get(id).shape);
                (ratio >= threshold).then_some((id, ratio))
            })
            .min_by_key(|(id, _)| {
                let node = self.arena.get(*id);
                (OrderedFloat(node.shape.area()), node.seq)
            })
    }

    fn finish(self) -> Forest {
        let stats = self.stats;
        info!(
            candidates = self.candidates.len(),
            top_level = stats.top_level,
            nested = stats.nested,
            promoted = stats.promoted,
            lines_assigned = stats.lines_assigned,
            lines_synthesized = stats.lines_synthesized,
            "hierarchy built"
        );
        Forest {
            roots: self.arena.materialize(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::new(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]).unwrap()
    }

    #[test]
    fn test_tier_of() {
        let article = ElementRule::new(ElementKind::TextRegion);
        let paragraph = ElementRule::new(ElementKind::TextRegion).with_parent(ElementKind::TextRegion);
        let line = ElementRule::new(ElementKind::TextLine);
        let table = ElementRule::new(ElementKind::TableRegion);
        assert_eq!(Tier::of(&article), Tier::TopLevel);
        assert_eq!(Tier::of(&paragraph), Tier::Nested);
        assert_eq!(Tier::of(&line), Tier::Line);
        assert_eq!(Tier::of(&table), Tier::TopLevel);
    }

    #[test]
    fn test_build_empty_page() {
        let forest = HierarchyBuilder::default().build(Vec::new());
        assert!(forest.roots.is_empty());
        assert_eq!(forest.stats, BuildStats::default());
    }

    #[test]
    fn test_nested_region_skips_wrong_parent_kind() {
        let table = ElementRule::new(ElementKind::TableRegion);
        let paragraph = ElementRule::new(ElementKind::TextRegion).with_parent(ElementKind::TextRegion);
        let regions = vec![
            Classified {
                seq: 0,
                class_id: 0,
                rule: &table,
                shape: shape(0.0, 0.0, 100.0, 100.0),
            },
            Classified {
                seq: 1,
                class_id: 1,
                rule: &paragraph,
                shape: shape(10.0, 10.0, 20.0, 20.0),
            },
        ];

        let forest = HierarchyBuilder::default().build(regions);
        assert_eq!(forest.roots.len(), 2);
        assert_eq!(forest.stats.promoted, 1);
        assert_eq!(forest.roots[1].kind, ElementKind::TextRegion);
    }

    #[test]
    fn test_line_inside_promoted_region() {
        let paragraph = ElementRule::new(ElementKind::TextRegion).with_parent(ElementKind::TextRegion);
        let line = ElementRule::new(ElementKind::TextLine);
        let regions = vec![
            Classified {
                seq: 0,
                class_id: 0,
                rule: &line,
                shape: shape(12.0, 12.0, 18.0, 14.0),
            },
            Classified {
                seq: 1,
                class_id: 1,
                rule: &paragraph,
                shape: shape(10.0, 10.0, 20.0, 20.0),
            },
        ];

        let forest = HierarchyBuilder::default().build(regions);
        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.roots[0].id, "r0000");
        assert_eq!(forest.roots[0].children[0].id, "l0000");
        assert_eq!(forest.stats.lines_assigned, 1);
    }
}

//! Index arena holding one page's regions while the build pass links them.
//!
//! Nodes refer to each other by `NodeId`; nothing is owned by another node
//! until [`RegionArena::materialize`] turns the roots into an owned tree.

use crate::geometry::Shape;

use super::elements::{ElementKind, Region};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Creation sequence; input position, or past the input for synthetic nodes
    pub(crate) seq: usize,
    pub(crate) kind: ElementKind,
    pub(crate) subtype: Option<String>,
    pub(crate) shape: Shape,
    pub(crate) label: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) synthetic: bool,
}

#[derive(Debug, Default)]
pub struct RegionArena {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    next_seq: usize,
    regions_labeled: usize,
    lines_labeled: usize,
}

impl RegionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena for `input_len` input regions; synthetic nodes are
    /// sequenced after all of them.
    pub fn with_input_len(input_len: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(input_len),
            next_seq: input_len,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds an unlinked node with an explicit creation sequence.
    pub fn push(
        &mut self,
        seq: usize,
        kind: ElementKind,
        subtype: Option<String>,
        shape: Shape,
    ) -> NodeId {
        self.next_seq = self.next_seq.max(seq + 1);
        self.push_node(seq, kind, subtype, shape, false)
    }

    /// Adds a node created by the build pass, sequenced after every input node.
    pub fn push_synthetic(
        &mut self,
        kind: ElementKind,
        subtype: Option<String>,
        shape: Shape,
    ) -> NodeId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.push_node(seq, kind, subtype, shape, true)
    }

    fn push_node(
        &mut self,
        seq: usize,
        kind: ElementKind,
        subtype: Option<String>,
        shape: Shape,
        synthetic: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            seq,
            kind,
            subtype,
            shape,
            label: None,
            parent: None,
            children: Vec::new(),
            synthetic,
        });
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Assigns the next `r%04d` or `l%04d` label. Labels are handed out once,
    /// in finalization order.
    pub fn finalize(&mut self, id: NodeId) -> &str {
        let node = &mut self.nodes[id.0];
        if node.label.is_none() {
            let label = if node.kind.is_line() {
                self.lines_labeled += 1;
                format!("l{:04}", self.lines_labeled - 1)
            } else {
                self.regions_labeled += 1;
                format!("r{:04}", self.regions_labeled - 1)
            };
            node.label = Some(label);
        }
        node.label.as_deref().unwrap_or_default()
    }

    pub(crate) fn set_shape(&mut self, id: NodeId, shape: Shape) {
        self.nodes[id.0].shape = shape;
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].label.as_deref()
    }

    /// Makes `id` a top-level root.
    pub fn add_root(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id.0].parent.is_none());
        let seq = self.nodes[id.0].seq;
        let pos = self
            .roots
            .partition_point(|r| self.nodes[r.0].seq < seq);
        self.roots.insert(pos, id);
    }

    /// Links `child` under `parent`, keeping siblings in creation order.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) {
        debug_assert!(child != parent);
        debug_assert!(self.nodes[child.0].parent.is_none());
        let seq = self.nodes[child.0].seq;
        let pos = self.nodes[parent.0]
            .children
            .partition_point(|c| self.nodes[c.0].seq < seq);
        self.nodes[parent.0].children.insert(pos, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Converts the linked roots into owned region trees.
    pub fn materialize(&self) -> Vec<Region> {
        self.roots
            .iter()
            .map(|&root| self.materialize_node(root, None))
            .collect()
    }

    fn materialize_node(&self, id: NodeId, parent: Option<&str>) -> Region {
        let node = &self.nodes[id.0];
        let label = node.label.clone().unwrap_or_default();
        let children = node
            .children
            .iter()
            .map(|&child| self.materialize_node(child, Some(&label)))
            .collect();
        Region {
            id: label.clone(),
            kind: node.kind,
            subtype: node.subtype.clone(),
            polygon: node.shape.points().to_vec(),
            area: node.shape.area(),
            parent: parent.map(str::to_string),
            children,
            synthetic: node.synthetic,
        }
    }
}

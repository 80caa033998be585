//! Class-id to PAGE element mapping.
//!
//! The mapping is a JSON object keyed by class id:
//!
//! ```json
//! {
//!   "0": {"element": "TextRegion", "type": "article"},
//!   "1": {"element": "TextRegion", "type": "paragraph", "parent": "TextRegion"},
//!   "2": {"element": "TextLine", "parent": "TextRegion", "parent_type": "paragraph"}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{PageError, Result};
use crate::layout::ElementKind;

/// Subtype given to synthetic parents when a line rule names none.
pub const DEFAULT_PARENT_SUBTYPE: &str = "paragraph";

#[derive(Debug, Deserialize)]
struct RuleEntry {
    element: Option<String>,
    #[serde(rename = "type")]
    subtype: Option<String>,
    parent: Option<String>,
    parent_type: Option<String>,
}

/// Structural rule for one class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRule {
    pub element_kind: ElementKind,
    pub subtype: Option<String>,
    /// Kind of the structural parent; TextRegion or None
    pub required_parent_kind: Option<ElementKind>,
    /// For nested regions: the subtype a parent must carry.
    /// For lines: the subtype of a synthesized orphan parent.
    pub parent_subtype: Option<String>,
}

impl ElementRule {
    pub fn new(element_kind: ElementKind) -> Self {
        Self {
            element_kind,
            subtype: None,
            required_parent_kind: None,
            parent_subtype: None,
        }
    }

    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = Some(subtype.to_string());
        self
    }

    pub fn with_parent(mut self, kind: ElementKind) -> Self {
        self.required_parent_kind = Some(kind);
        self
    }

    pub fn with_parent_subtype(mut self, subtype: &str) -> Self {
        self.parent_subtype = Some(subtype.to_string());
        self
    }

    /// Subtype for a TextRegion synthesized around an orphan line.
    pub fn default_parent_subtype(&self) -> &str {
        self.parent_subtype
            .as_deref()
            .unwrap_or(DEFAULT_PARENT_SUBTYPE)
    }

    fn from_entry(class_id: u32, entry: RuleEntry) -> Result<Self> {
        let element = entry.element.ok_or_else(|| {
            PageError::Config(format!("class {class_id}: missing required 'element' field"))
        })?;
        let element_kind: ElementKind = element
            .parse()
            .map_err(|e| PageError::Config(format!("class {class_id}: {e}")))?;

        let parent_kind = entry
            .parent
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<ElementKind>()
                    .map_err(|e| PageError::Config(format!("class {class_id}: parent {e}")))
            })
            .transpose()?;

        let required_parent_kind = match (element_kind, parent_kind) {
            (ElementKind::TextLine, Some(kind)) if kind != ElementKind::TextRegion => {
                return Err(PageError::Config(format!(
                    "class {class_id}: TextLine parent must be TextRegion, got {kind}"
                )));
            }
            // Lines always nest in a TextRegion whether or not the rule says so.
            (ElementKind::TextLine, _) => Some(ElementKind::TextRegion),
            (ElementKind::TextRegion, Some(ElementKind::TextRegion)) => Some(ElementKind::TextRegion),
            (ElementKind::TextRegion, Some(parent)) => {
                warn!(class_id, %parent, "TextRegion only nests in a TextRegion, treating as top level");
                None
            }
            (kind, Some(parent)) => {
                warn!(class_id, %kind, %parent, "parent is only honoured for TextRegion and TextLine, ignoring");
                None
            }
            (_, None) => None,
        };

        Ok(Self {
            element_kind,
            subtype: entry.subtype.filter(|s| !s.is_empty()),
            required_parent_kind,
            parent_subtype: entry.parent_type.filter(|s| !s.is_empty()),
        })
    }
}

/// Read-only class-id to rule table, shared by every page of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    rules: BTreeMap<u32, ElementRule>,
}

impl Default for Mapping {
    /// Single-class mapping: class 0 is a TextLine inside a paragraph.
    fn default() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(
            0,
            ElementRule::new(ElementKind::TextLine)
                .with_parent(ElementKind::TextRegion)
                .with_parent_subtype(DEFAULT_PARENT_SUBTYPE),
        );
        Self { rules }
    }
}

impl Mapping {
    pub fn new(rules: impl IntoIterator<Item = (u32, ElementRule)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Loads a mapping from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| PageError::Config(format!("{}: {e}", path.display())))?;
        let mapping = Self::from_json(&data)?;
        if mapping.is_empty() {
            warn!(path = %path.display(), "mapping defines no classes, every annotation will be excluded");
        }
        info!(path = %path.display(), classes = mapping.len(), "loaded mapping");
        Ok(mapping)
    }

    /// Parses a mapping from JSON text.
    pub fn from_json(data: &str) -> Result<Self> {
        let entries: BTreeMap<String, RuleEntry> =
            serde_json::from_str(data).map_err(|e| PageError::Config(e.to_string()))?;

        let mut rules = BTreeMap::new();
        for (key, entry) in entries {
            let class_id: u32 = key
                .trim()
                .parse()
                .map_err(|_| PageError::Config(format!("class key '{key}' is not an integer")))?;
            let rule = ElementRule::from_entry(class_id, entry)?;
            debug!(
                class_id,
                element = %rule.element_kind,
                parent = ?rule.required_parent_kind.map(ElementKind::as_str),
                "mapping rule"
            );
            if rules.insert(class_id, rule).is_some() {
                return Err(PageError::Config(format!("class {class_id} defined twice")));
            }
        }
        Ok(Self { rules })
    }

    pub fn get(&self, class_id: u32) -> Option<&ElementRule> {
        self.rules.get(&class_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

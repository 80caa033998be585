//! Hierarchy build parameters.

use crate::error::{PageError, Result};

use super::orphan::OrphanLinePolicy;

/// Minimum fraction of a child's area that must lie inside a parent.
pub const DEFAULT_CONTAINMENT_THRESHOLD: f64 = 0.5;

/// Parameters for the hierarchy build pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildParams {
    /// Containment needed to nest a region under another region.
    pub region_threshold: f64,

    /// Containment needed to place a TextLine in a TextRegion.
    pub line_threshold: f64,

    /// Whether orphan lines share synthetic parents.
    pub orphan_lines: OrphanLinePolicy,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            region_threshold: DEFAULT_CONTAINMENT_THRESHOLD,
            line_threshold: DEFAULT_CONTAINMENT_THRESHOLD,
            orphan_lines: OrphanLinePolicy::default(),
        }
    }
}

impl BuildParams {
    /// Creates build parameters, rejecting thresholds outside (0, 1].
    pub fn new(region_threshold: f64, line_threshold: f64) -> Result<Self> {
        for (name, value) in [
            ("region_threshold", region_threshold),
            ("line_threshold", line_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(PageError::InvalidParams(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(Self {
            region_threshold,
            line_threshold,
            orphan_lines: OrphanLinePolicy::default(),
        })
    }

    pub fn with_orphan_lines(mut self, policy: OrphanLinePolicy) -> Self {
        self.orphan_lines = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_half() {
        let params = BuildParams::default();
        assert_eq!(params.region_threshold, 0.5);
        assert_eq!(params.line_threshold, 0.5);
        assert_eq!(params.orphan_lines, OrphanLinePolicy::PerLine);
    }

    #[test]
    fn test_new_validates_range() {
        assert!(BuildParams::new(0.5, 1.0).is_ok());
        assert!(BuildParams::new(0.0, 0.5).is_err());
        assert!(BuildParams::new(0.5, 1.5).is_err());
        assert!(BuildParams::new(f64::NAN, 0.5).is_err());
    }
}

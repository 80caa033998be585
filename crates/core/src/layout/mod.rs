//! Layout tree recovery.
//!
//! This module contains:
//! - Layout element types (ElementKind, Region, PageLayout)
//! - Build parameters (BuildParams)
//! - The region arena and hierarchy builder
//! - Orphan resolution

pub mod arena;
pub mod elements;
pub mod hierarchy;
pub mod orphan;
pub mod params;

pub use arena::{NodeId, RegionArena};
pub use elements::*;
pub use hierarchy::{Forest, HierarchyBuilder, Tier};
pub use orphan::{Orphan, OrphanLinePolicy, Resolution, SyntheticParent, resolve_orphan};
pub use params::*;

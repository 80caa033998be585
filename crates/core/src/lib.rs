//! pagetree - recover nested PAGE layout trees from flat polygon annotations.
//!
//! YOLO segmentation labels carry a class id and a polygon per region but no
//! parent/child relation. This crate classifies each polygon through a
//! class mapping, nests regions and lines by geometric containment, and
//! writes the resulting forest as PAGE-XML.

pub mod annotation;
pub mod api;
pub mod classify;
pub mod converter;
pub mod dimensions;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod mapping;
pub mod utils;

pub use api::high_level;

pub use error::{PageError, Result};

//! Output converters for recovered layouts.
//!
//! - PageXmlWriter: PAGE 2019-07-15 XML

mod page_xml;

pub use page_xml::{PAGE_NS, PageXmlWriter, render_page_xml};

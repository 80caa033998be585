//! PAGE-XML writer - renders a PageLayout as a PcGts document.

use std::io::{self, Write};

use crate::layout::{ElementKind, PageLayout, Region};
use crate::utils::{enc, points2str};

/// PAGE content schema namespace.
pub const PAGE_NS: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15";

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Writes one PcGts document per page.
pub struct PageXmlWriter<W: Write> {
    /// Output writer
    outfp: W,
    /// Metadata/Creator text
    creator: String,
    /// Metadata/Created and LastChange timestamp
    created: String,
}

impl<W: Write> PageXmlWriter<W> {
    /// Create a writer. `created` is written verbatim as the document timestamp.
    pub fn new(outfp: W, created: &str) -> Self {
        Self {
            outfp,
            creator: concat!("pagetree ", env!("CARGO_PKG_VERSION")).to_string(),
            created: created.to_string(),
        }
    }

    /// Override the Metadata/Creator text.
    pub fn with_creator(mut self, creator: &str) -> Self {
        self.creator = creator.to_string();
        self
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.outfp.write_all(text.as_bytes())
    }

    fn indent(&mut self, depth: usize) -> io::Result<()> {
        for _ in 0..depth {
            self.write("  ")?;
        }
        Ok(())
    }

    /// Render a page layout as a complete document.
    pub fn write_page(&mut self, image_filename: &str, layout: &PageLayout) -> io::Result<()> {
        self.write("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
        let root = format!(
            "<PcGts xmlns=\"{PAGE_NS}\" xmlns:xsi=\"{XSI_NS}\" xsi:schemaLocation=\"{PAGE_NS} {PAGE_NS}/pagecontent.xsd\">\n"
        );
        self.write(&root)?;

        self.write("  <Metadata>\n")?;
        let metadata = format!(
            "    <Creator>{}</Creator>\n    <Created>{}</Created>\n    <LastChange>{}</LastChange>\n",
            enc(&self.creator),
            enc(&self.created),
            enc(&self.created)
        );
        self.write(&metadata)?;
        self.write("  </Metadata>\n")?;

        let page = format!(
            "  <Page imageFilename=\"{}\" imageWidth=\"{}\" imageHeight=\"{}\"",
            enc(image_filename),
            layout.width,
            layout.height
        );
        self.write(&page)?;
        if layout.roots.is_empty() {
            self.write("/>\n")?;
        } else {
            self.write(">\n")?;
            for region in &layout.roots {
                self.render_region(region, 2)?;
            }
            self.write("  </Page>\n")?;
        }

        self.write("</PcGts>\n")?;
        self.outfp.flush()
    }

    fn render_region(&mut self, region: &Region, depth: usize) -> io::Result<()> {
        self.indent(depth)?;
        let mut open = format!("<{} id=\"{}\"", region.kind, enc(&region.id));
        if region.kind == ElementKind::TextRegion
            && let Some(subtype) = &region.subtype
        {
            open.push_str(&format!(" type=\"{}\"", enc(subtype)));
        }
        open.push_str(">\n");
        self.write(&open)?;

        self.indent(depth + 1)?;
        let coords = format!("<Coords points=\"{}\"/>\n", points2str(&region.polygon));
        self.write(&coords)?;

        for child in &region.children {
            self.render_region(child, depth + 1)?;
        }

        self.indent(depth)?;
        let close = format!("</{}>\n", region.kind);
        self.write(&close)
    }

    /// Consume the writer and return the underlying output.
    pub fn into_inner(self) -> W {
        self.outfp
    }
}

/// Render a layout to an in-memory XML string.
pub fn render_page_xml(image_filename: &str, layout: &PageLayout, created: &str) -> String {
    let mut writer = PageXmlWriter::new(Vec::new(), created);
    // Writing into a Vec cannot fail.
    let _ = writer.write_page(image_filename, layout);
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BuildStats;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }

    fn sample_layout() -> PageLayout {
        let line = Region {
            id: "l0000".to_string(),
            kind: ElementKind::TextLine,
            subtype: None,
            polygon: rect(15.0, 15.0, 85.0, 25.0),
            area: 700.0,
            parent: Some("r0000".to_string()),
            children: Vec::new(),
            synthetic: false,
        };
        let table = Region {
            id: "r0001".to_string(),
            kind: ElementKind::TableRegion,
            subtype: Some("ignored".to_string()),
            polygon: rect(0.0, 60.0, 10.0, 70.0),
            area: 100.0,
            parent: None,
            children: Vec::new(),
            synthetic: false,
        };
        let region = Region {
            id: "r0000".to_string(),
            kind: ElementKind::TextRegion,
            subtype: Some("paragraph".to_string()),
            polygon: rect(10.0, 10.0, 90.0, 50.0),
            area: 3200.0,
            parent: None,
            children: vec![line],
            synthetic: false,
        };
        PageLayout {
            width: 100,
            height: 100,
            roots: vec![region, table],
            excluded: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    #[test]
    fn test_write_page_structure() {
        let xml = render_page_xml("scan&1.png", &sample_layout(), "2024-01-01T00:00:00Z");
        let expected_body = concat!(
            "  <Page imageFilename=\"scan&amp;1.png\" imageWidth=\"100\" imageHeight=\"100\">\n",
            "    <TextRegion id=\"r0000\" type=\"paragraph\">\n",
            "      <Coords points=\"10,10 90,10 90,50 10,50\"/>\n",
            "      <TextLine id=\"l0000\">\n",
            "        <Coords points=\"15,15 85,15 85,25 15,25\"/>\n",
            "      </TextLine>\n",
            "    </TextRegion>\n",
            "    <TableRegion id=\"r0001\">\n",
            "      <Coords points=\"0,60 10,60 10,70 0,70\"/>\n",
            "    </TableRegion>\n",
            "  </Page>\n",
            "</PcGts>\n",
        );
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<PcGts xmlns="));
        assert!(xml.contains("<Created>2024-01-01T00:00:00Z</Created>"));
        assert!(xml.ends_with(expected_body), "unexpected body:\n{xml}");
    }

    #[test]
    fn test_empty_page_self_closes() {
        let mut layout = sample_layout();
        layout.roots.clear();
        let xml = render_page_xml("a.png", &layout, "t");
        assert!(xml.contains("imageHeight=\"100\"/>\n</PcGts>"));
    }

    #[test]
    fn test_custom_creator() {
        let mut writer = PageXmlWriter::new(Vec::new(), "t").with_creator("labeler <v2>");
        writer.write_page("a.png", &sample_layout()).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert!(xml.contains("<Creator>labeler &lt;v2&gt;</Creator>"));
    }
}

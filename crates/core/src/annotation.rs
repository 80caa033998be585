//! YOLO segmentation label parsing.
//!
//! One annotation per line: `class_id x1 y1 x2 y2 ...` with coordinates
//! normalized to [0, 1]. Coordinates outside that range reject the line.

use std::path::Path;

use tracing::warn;

use crate::error::{PageError, Result};
use crate::utils::Point;

/// One polygon annotation as read from a label file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    pub class_id: u32,
    /// Normalized vertices in input order
    pub vertices: Vec<Point>,
}

/// Annotations of one label file plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct LabelFile {
    pub annotations: Vec<RawAnnotation>,
    pub skipped: Vec<PageError>,
}

/// Parses one label line. Blank lines yield `Ok(None)`.
///
/// `line_no` is 1-based and only used for error reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<RawAnnotation>> {
    let mut tokens = line.split_whitespace();
    let Some(class_token) = tokens.next() else {
        return Ok(None);
    };

    let parse_err = |msg: String| PageError::Parse { line: line_no, msg };

    let class_id: u32 = class_token
        .parse()
        .map_err(|_| parse_err(format!("class id '{class_token}' is not a non-negative integer")))?;

    let coords = tokens
        .map(|t| {
            t.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| parse_err(format!("coordinate '{t}' is not a number")))
                .and_then(|v| {
                    if (0.0..=1.0).contains(&v) {
                        Ok(v)
                    } else {
                        Err(parse_err(format!("coordinate {v} outside [0, 1]")))
                    }
                })
        })
        .collect::<Result<Vec<f64>>>()?;

    if coords.len() % 2 != 0 {
        return Err(parse_err(format!(
            "odd coordinate count {}",
            coords.len()
        )));
    }
    if coords.len() < 6 {
        return Err(parse_err(format!(
            "{} vertices, need at least 3",
            coords.len() / 2
        )));
    }

    let vertices = coords.chunks_exact(2).map(|c| (c[0], c[1])).collect();
    Ok(Some(RawAnnotation { class_id, vertices }))
}

/// Parses a whole label document, skipping malformed lines with a warning.
pub fn parse_label_str(content: &str, source: &str) -> LabelFile {
    let mut file = LabelFile::default();
    for (idx, line) in content.lines().enumerate() {
        match parse_line(line, idx + 1) {
            Ok(Some(annotation)) => file.annotations.push(annotation),
            Ok(None) => {}
            Err(err) => {
                warn!(page = source, error = %err, "skipping label line");
                file.skipped.push(err);
            }
        }
    }
    file
}

/// Reads and parses a label file. Failing to read the file is fatal for the page.
pub fn parse_page(path: impl AsRef<Path>) -> Result<LabelFile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    Ok(parse_label_str(&content, &path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_triangle() {
        let ann = parse_line("2 0.1 0.2 0.3 0.4 0.5 0.6", 1).unwrap().unwrap();
        assert_eq!(ann.class_id, 2);
        assert_eq!(ann.vertices, vec![(0.1, 0.2), (0.3, 0.4), (0.5, 0.6)]);
    }

    #[test]
    fn test_parse_line_blank() {
        assert_eq!(parse_line("   \t", 4).unwrap(), None);
    }

    #[test]
    fn test_parse_line_odd_coordinates() {
        let err = parse_line("0 0.1 0.2 0.3 0.4 0.5 0.6 0.7", 3).unwrap_err();
        assert!(matches!(err, PageError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_parse_line_non_numeric() {
        assert!(parse_line("0 0.1 abc 0.3 0.4 0.5 0.6", 1).is_err());
        assert!(parse_line("x 0.1 0.2 0.3 0.4 0.5 0.6", 1).is_err());
        assert!(parse_line("-1 0.1 0.2 0.3 0.4 0.5 0.6", 1).is_err());
        assert!(parse_line("0 0.1 NaN 0.3 0.4 0.5 0.6", 1).is_err());
    }

    #[test]
    fn test_parse_line_out_of_range() {
        let err = parse_line("0 0.1 0.2 1e308 0.4 0.5 0.6", 2).unwrap_err();
        assert!(matches!(err, PageError::Parse { line: 2, .. }));
        assert!(parse_line("0 -0.01 0.2 0.3 0.4 0.5 0.6", 1).is_err());
        assert!(parse_line("0 0 0 1 0 1 1", 1).unwrap().is_some());
    }

    #[test]
    fn test_parse_line_too_few_vertices() {
        let err = parse_line("0 0.1 0.2 0.3 0.4", 9).unwrap_err();
        assert!(matches!(err, PageError::Parse { line: 9, .. }));
    }

    #[test]
    fn test_parse_label_str_skips_bad_lines() {
        let content = "0 0 0 1 0 1 1\n\n1 0.5\n2 0 0 0.5 0 0.5 0.5 0 0.5\n";
        let file = parse_label_str(content, "page.txt");
        assert_eq!(file.annotations.len(), 2);
        assert_eq!(file.annotations[1].class_id, 2);
        assert_eq!(file.skipped.len(), 1);
        assert!(matches!(file.skipped[0], PageError::Parse { line: 3, .. }));
    }
}

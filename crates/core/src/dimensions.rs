//! Page image lookup and dimension probing.

use std::path::{Path, PathBuf};

use crate::error::{PageError, Result};

/// Image extensions tried, in order, when pairing a label file with its image.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "tif", "tiff", "bmp", "webp"];

/// Reads (width, height) from an image header without decoding pixels.
pub fn image_dimensions(path: impl AsRef<Path>) -> Result<(u32, u32)> {
    let path = path.as_ref();
    let read_err = |msg: String| PageError::ImageRead {
        path: path.to_path_buf(),
        msg,
    };
    if !path.is_file() {
        return Err(read_err("file not found".to_string()));
    }
    let (width, height) = image::image_dimensions(path).map_err(|e| read_err(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(read_err(format!("empty image {width}x{height}")));
    }
    Ok((width, height))
}

/// Finds the image in `dir` sharing `stem`, trying [`IMAGE_EXTENSIONS`] in order.
pub fn find_image_for(stem: &str, dir: impl AsRef<Path>) -> Option<PathBuf> {
    let dir = dir.as_ref();
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_of_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        image::RgbImage::new(64, 32).save(&path).unwrap();
        assert_eq!(image_dimensions(&path).unwrap(), (64, 32));
    }

    #[test]
    fn test_missing_image_is_read_error() {
        let err = image_dimensions("/nonexistent/page.png").unwrap_err();
        assert!(matches!(err, PageError::ImageRead { .. }));
    }

    #[test]
    fn test_garbage_image_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            image_dimensions(&path),
            Err(PageError::ImageRead { .. })
        ));
    }

    #[test]
    fn test_find_image_prefers_jpg() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan.png"), b"").unwrap();
        std::fs::write(dir.path().join("scan.jpg"), b"").unwrap();
        assert_eq!(
            find_image_for("scan", dir.path()),
            Some(dir.path().join("scan.jpg"))
        );
        assert_eq!(find_image_for("other", dir.path()), None);
    }
}

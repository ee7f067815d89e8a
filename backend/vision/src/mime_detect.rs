//! MIME type detection for stored scan images.
//!
//! Uploads are always re-encoded to PNG before they are written, so that is
//! the only image type the upload directory holds.

use std::path::Path;

const PNG: &str = "image/png";
const OCTET_STREAM: &str = "application/octet-stream";

/// Detect the MIME type of a stored file by extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => PNG,
        _ => OCTET_STREAM,
    }
}

/// Whether a file is safe to render inline in a browser.
pub fn is_inline_safe(mime: &str) -> bool {
    mime == PNG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_png() {
        assert_eq!(detect_mime_type(&PathBuf::from("scan_1a2b3c4d.png")), "image/png");
        assert!(is_inline_safe("image/png"));
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(detect_mime_type(&PathBuf::from("BOX_00ff00ff.PNG")), "image/png");
    }

    #[test]
    fn anything_else_is_an_opaque_download() {
        for name in ["notes.txt", "photo.jpg", "no_extension"] {
            let mime = detect_mime_type(&PathBuf::from(name));
            assert_eq!(mime, "application/octet-stream");
            assert!(!is_inline_safe(mime));
        }
    }
}

//! Image reference resolution — classifies references as local paths or
//! URLs and validates local files against the format/size policy.

use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::error::{Result, VisionError};

/// Extensions accepted for local image files (case-insensitive).
pub const SUPPORTED_FORMATS: [&str; 5] = ["jpeg", "jpg", "png", "webp", "gif"];

/// Maximum local file size accepted by the remote provider.
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// `MAX_IMAGE_BYTES` expressed in megabytes, for policy introspection.
pub const MAX_IMAGE_MB: u64 = MAX_IMAGE_BYTES / (1024 * 1024);

/// A validated image reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Remote URL, passed through unvalidated — the remote provider
    /// performs the fetch.
    Remote { url: String },
    /// Local file that exists and satisfies the format/size policy.
    Local {
        path: PathBuf,
        size: u64,
        format: String,
    },
}

/// Metadata returned by [`check`] without triggering an analysis call.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageCheck {
    Remote,
    Local { size: u64, format: String },
}

/// Whether a reference is an `http`/`https` URL rather than a local path.
pub fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// The static format/size policy applied to local files.
pub fn format_policy() -> (&'static [&'static str], u64) {
    (&SUPPORTED_FORMATS, MAX_IMAGE_MB)
}

/// Classify and validate an image reference.
///
/// URLs are tagged [`ImageSource::Remote`] with no filesystem check. Local
/// paths must point at an existing regular file with a supported extension
/// and a size within [`MAX_IMAGE_BYTES`]. Read-only: only a stat is issued.
pub fn resolve(reference: &str) -> Result<ImageSource> {
    if is_url(reference) {
        return Ok(ImageSource::Remote {
            url: reference.to_string(),
        });
    }

    let path = Path::new(reference);
    let (size, format) = validate_local(path, reference)?;

    Ok(ImageSource::Local {
        path: path.to_path_buf(),
        size,
        format,
    })
}

/// Same validation as [`resolve`], returning metadata only.
pub fn check(reference: &str) -> Result<ImageCheck> {
    if is_url(reference) {
        return Ok(ImageCheck::Remote);
    }

    let (size, format) = validate_local(Path::new(reference), reference)?;
    Ok(ImageCheck::Local { size, format })
}

fn validate_local(path: &Path, reference: &str) -> Result<(u64, String)> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VisionError::NotFound(reference.to_string()));
        }
        Err(e) => return Err(VisionError::Io(e)),
    };

    if !metadata.is_file() {
        return Err(VisionError::NotFound(reference.to_string()));
    }

    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_FORMATS.contains(&format.as_str()) {
        return Err(VisionError::UnsupportedFormat {
            found: if format.is_empty() {
                "(none)".to_string()
            } else {
                format
            },
            supported: SUPPORTED_FORMATS.join(", "),
        });
    }

    let size = metadata.len();
    if size > MAX_IMAGE_BYTES {
        return Err(VisionError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }

    Ok((size, format))
}

impl ImageSource {
    /// Render the reference in a form the remote API accepts: URLs pass
    /// through unchanged, local files become base64 data URLs.
    ///
    /// This is the only point where file contents are read.
    pub fn to_remote_reference(&self) -> Result<String> {
        match self {
            ImageSource::Remote { url } => Ok(url.clone()),
            ImageSource::Local { path, format, .. } => {
                let bytes = std::fs::read(path)?;
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                Ok(format!("data:{};base64,{encoded}", mime_for(format)))
            }
        }
    }
}

fn mime_for(format: &str) -> &'static str {
    match format {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_image(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn urls_pass_through_without_filesystem_checks() {
        let source = resolve("https://example.com/cat.png").unwrap();
        assert_eq!(
            source,
            ImageSource::Remote {
                url: "https://example.com/cat.png".to_string()
            }
        );
        assert!(is_url("http://example.com/a.jpg"));
        assert!(!is_url("/tmp/a.jpg"));
        assert!(!is_url("ftp://example.com/a.jpg"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, VisionError::NotFound(_)));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let as_png = dir.path().join("sub.png");
        std::fs::create_dir(&as_png).unwrap();
        let err = resolve(as_png.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, VisionError::NotFound(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "notes.txt", b"hello");
        let err = resolve(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, VisionError::UnsupportedFormat { .. }));

        let path = write_image(&dir, "noext", b"hello");
        let err = resolve(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, VisionError::UnsupportedFormat { .. }));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "shot.PNG", b"\x89PNG");
        let source = resolve(path.to_str().unwrap()).unwrap();
        match source {
            ImageSource::Local { size, format, .. } => {
                assert_eq!(size, 4);
                assert_eq!(format, "png");
            }
            other => panic!("expected local source, got {other:?}"),
        }
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        let f = std::fs::File::create(&path).unwrap();
        // Sparse file — no need to write 20MB of data.
        f.set_len(MAX_IMAGE_BYTES + 1).unwrap();

        let err = resolve(path.to_str().unwrap()).unwrap_err();
        match err {
            VisionError::TooLarge { size, max } => {
                assert_eq!(size, MAX_IMAGE_BYTES + 1);
                assert_eq!(max, MAX_IMAGE_BYTES);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn file_at_exact_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.gif");
        let f = std::fs::File::create(&path).unwrap();
        f.set_len(MAX_IMAGE_BYTES).unwrap();

        assert!(resolve(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn check_reports_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "photo.webp", &[0u8; 42]);
        let report = check(path.to_str().unwrap()).unwrap();
        assert_eq!(
            report,
            ImageCheck::Local {
                size: 42,
                format: "webp".to_string()
            }
        );

        assert_eq!(check("https://example.com/x.png").unwrap(), ImageCheck::Remote);
        assert!(matches!(
            check("/no/such.png").unwrap_err(),
            VisionError::NotFound(_)
        ));
    }

    #[test]
    fn local_files_become_data_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, "dot.gif", b"GIF89a");
        let source = resolve(path.to_str().unwrap()).unwrap();
        let reference = source.to_remote_reference().unwrap();
        assert!(reference.starts_with("data:image/gif;base64,"));

        let encoded = reference.strip_prefix("data:image/gif;base64,").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"GIF89a");
    }

    #[test]
    fn remote_reference_is_unchanged() {
        let source = resolve("https://example.com/dog.jpg").unwrap();
        assert_eq!(
            source.to_remote_reference().unwrap(),
            "https://example.com/dog.jpg"
        );
    }
}

//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! ## Why download to a temp file?
//!
//! Both extraction backends want a file-system path. Downloading to a
//! `TempDir` gives us one while ensuring cleanup happens automatically
//! when `ResolvedInput` is dropped, even if the process panics. We check
//! the `.pdf` extension and the PDF magic bytes (`%PDF`) before returning
//! so callers get a meaningful error before any extraction or API call.

use crate::error::Pdf2AnkiError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists, is readable, and is
/// a PDF (extension and magic bytes).
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2AnkiError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Reject anything that is not named like a PDF, before touching the file.
fn check_extension(path: &Path) -> Result<(), Pdf2AnkiError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ext != "pdf" {
        return Err(Pdf2AnkiError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: if ext.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{ext}")
            },
        });
    }
    Ok(())
}

/// Resolve a local file path, validating existence, extension, and PDF
/// magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2AnkiError> {
    let path = PathBuf::from(path_str);

    check_extension(&path)?;

    if !path.exists() {
        return Err(Pdf2AnkiError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            // Verify PDF magic bytes. A file too short to hold them is not
            // a PDF either.
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(Pdf2AnkiError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2AnkiError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2AnkiError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2AnkiError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2AnkiError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2AnkiError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2AnkiError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2AnkiError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| Pdf2AnkiError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2AnkiError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Verify PDF magic bytes; a response shorter than the magic is not a
    // PDF either.
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Pdf2AnkiError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if last.to_ascii_lowercase().ends_with(".pdf") {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/deck.pdf"));
        assert!(is_url("http://example.com/deck.pdf"));
        assert!(!is_url("/tmp/deck.pdf"));
        assert!(!is_url("deck.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn rejects_non_pdf_extension() {
        let err = resolve_local("slides.pptx").unwrap_err();
        match err {
            Pdf2AnkiError::UnsupportedFormat { extension, .. } => {
                assert_eq!(extension, ".pptx");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_extension() {
        let err = resolve_local("slides").unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::UnsupportedFormat { .. }));
    }

    #[test]
    fn rejects_wrong_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"PK\x03\x04not a pdf").unwrap();

        let err = resolve_local(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::NotAPdf { .. }));
    }

    #[test]
    fn rejects_file_shorter_than_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%P").unwrap();

        let err = resolve_local(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::NotAPdf { .. }));
    }

    #[test]
    fn accepts_pdf_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7\n%rest").unwrap();

        let resolved = resolve_local(path.to_str().unwrap()).unwrap();
        assert_eq!(resolved.path(), path);
    }

    #[test]
    fn missing_file_reported() {
        let err = resolve_local("/no/such/dir/deck.pdf").unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::FileNotFound { .. }));
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(
            extract_filename("https://example.com/a/lecture3.pdf"),
            "lecture3.pdf"
        );
        assert_eq!(
            extract_filename("https://example.com/download"),
            "downloaded.pdf"
        );
    }
}

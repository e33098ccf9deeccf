//! Optional YouTube cookies for yt-dlp.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// A real Netscape cookies file is at least ~50 bytes.
const MIN_COOKIES_FILE_SIZE: u64 = 50;

/// Check that a cookies file looks like Netscape format.
///
/// Accepts the standard header or any tab-separated line with at least six
/// fields.
pub fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File")
        || content.starts_with("# HTTP Cookie File")
    {
        return true;
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| line.split('\t').count() >= 6)
}

/// Copy a valid cookies file into `work_dir` and return the copy's path.
///
/// yt-dlp writes cookies back after use, so it always gets a private
/// writable copy. Returns `None` when the source is missing, tiny, or not
/// Netscape format.
pub async fn prepare_cookies(source: &Path, work_dir: &Path) -> Option<PathBuf> {
    let metadata = match tokio::fs::metadata(source).await {
        Ok(m) => m,
        Err(_) => {
            debug!(path = %source.display(), "Cookies file not found, skipping");
            return None;
        }
    };

    if metadata.len() < MIN_COOKIES_FILE_SIZE {
        debug!(
            path = %source.display(),
            bytes = metadata.len(),
            "Cookies file is too small, skipping"
        );
        return None;
    }

    match tokio::fs::read_to_string(source).await {
        Ok(content) if is_valid_netscape_cookies(&content) => {}
        Ok(_) => {
            debug!(path = %source.display(), "Cookies file is not Netscape format, skipping");
            return None;
        }
        Err(e) => {
            warn!("Failed to read cookies file: {}", e);
            return None;
        }
    }

    let target = work_dir.join("cookies.txt");
    if let Err(e) = tokio::fs::copy(source, &target).await {
        warn!("Failed to copy cookies file: {}", e);
        return None;
    }

    info!("Using cookies file for YouTube authentication");
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tPREF\tf1=50000000\n";

    #[test]
    fn test_netscape_detection() {
        assert!(is_valid_netscape_cookies(VALID));
        assert!(is_valid_netscape_cookies(
            "# comment\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n"
        ));
        assert!(!is_valid_netscape_cookies("{\"cookies\": []}"));
        assert!(!is_valid_netscape_cookies(""));
    }

    #[tokio::test]
    async fn test_prepare_cookies_copies_valid_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("cookies.txt");
        std::fs::write(&source, VALID).unwrap();

        let copied = prepare_cookies(&source, work_dir.path()).await.unwrap();
        assert!(copied.starts_with(work_dir.path()));
        assert_eq!(std::fs::read_to_string(copied).unwrap(), VALID);
    }

    #[tokio::test]
    async fn test_prepare_cookies_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(prepare_cookies(&dir.path().join("missing.txt"), dir.path())
            .await
            .is_none());

        let tiny = dir.path().join("tiny.txt");
        std::fs::write(&tiny, "x").unwrap();
        assert!(prepare_cookies(&tiny, dir.path()).await.is_none());

        let json = dir.path().join("json.txt");
        std::fs::write(&json, format!("{{\"cookies\": \"{}\"}}", "a".repeat(80))).unwrap();
        assert!(prepare_cookies(&json, dir.path()).await.is_none());
    }
}

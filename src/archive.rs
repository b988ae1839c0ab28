use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use url::Url;

/// Content ID for an archived page: first 8 hex chars of SHA-256 over
/// host + path. Scheme, query and fragment are excluded so refetches of the
/// same page land on the same snapshot name.
pub fn generate_id(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.host_str().unwrap_or_default().as_bytes());
    hasher.update(url.path().as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..8].to_string()
}

/// Snapshot location: <base>/<DD_MM_YYYY>/<site_folder>/<id>.html.gz.
/// Pure path join; the write is a separate step.
pub fn archive_path(
    base_dir: &Path,
    date_str: &str,
    site_folder: &str,
    content_id: &str,
) -> PathBuf {
    base_dir
        .join(date_str)
        .join(site_folder)
        .join(format!("{content_id}.html.gz"))
}

/// Write the raw response body as a gzip snapshot, creating parent dirs.
pub fn save_snapshot(path: &Path, raw: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating archive dir {}", parent.display()))?;
    }
    let file = fs::File::create(path)
        .with_context(|| format!("creating snapshot {}", path.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let url = Url::parse("https://www.gtmstores.com/locations/").unwrap();
        assert_eq!(generate_id(&url), generate_id(&url));
        assert_eq!(generate_id(&url), "38cdda31");
    }

    #[test]
    fn id_ignores_query_and_fragment() {
        let a = Url::parse("https://x.com/a?b=1").unwrap();
        let b = Url::parse("https://x.com/a#frag").unwrap();
        let c = Url::parse("https://x.com/a").unwrap();
        assert_eq!(generate_id(&a), generate_id(&c));
        assert_eq!(generate_id(&b), generate_id(&c));
        assert_eq!(generate_id(&c), "89f6a01e");
    }

    #[test]
    fn id_shape() {
        let url = Url::parse("https://x.com/a").unwrap();
        let id = generate_id(&url);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn path_layout() {
        let p = archive_path(
            Path::new("data/page_source"),
            "15_01_2025",
            "www_gtmstores_com",
            "38cdda31",
        );
        assert_eq!(
            p,
            PathBuf::from("data/page_source/15_01_2025/www_gtmstores_com/38cdda31.html.gz")
        );
    }

    #[test]
    fn snapshot_roundtrip() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let dir = std::env::temp_dir().join("gtm_scraper_snapshot_test");
        let path = dir.join("aaaaaaaa.html.gz");
        save_snapshot(&path, b"<html>hello</html>").unwrap();

        let mut out = String::new();
        GzDecoder::new(fs::File::open(&path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "<html>hello</html>");
        let _ = fs::remove_dir_all(&dir);
    }
}

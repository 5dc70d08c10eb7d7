//! Carrier discovery and path helpers for the CLI front end.

use std::path::{Path, PathBuf};

use fast_glob::glob_match;
use walkdir::WalkDir;

use crate::config::{CARRIER_PATTERNS, EXCLUDED_PATTERNS};

/// Maximum directory depth searched by the interactive wizard.
const DISCOVERY_DEPTH: usize = 3;

/// Finds candidate carrier images under `root`.
///
/// Excluded directories (build trees, VCS metadata) are pruned before
/// descent; matches are returned in walk order.
pub fn discover_carriers(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .max_depth(DISCOVERY_DEPTH)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry.file_name().to_str().unwrap_or_default()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_str().unwrap_or_default().to_ascii_lowercase();
            CARRIER_PATTERNS.iter().any(|pattern| glob_match(pattern, &name))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn is_excluded(name: &str) -> bool {
    EXCLUDED_PATTERNS.iter().any(|pattern| glob_match(pattern, name))
}

/// Default output path for an embedded carrier: `photo.png` → `photo.pxv.png`.
pub fn output_path(carrier: &Path) -> PathBuf {
    let stem = carrier.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let extension = carrier.extension().and_then(|s| s.to_str()).unwrap_or("png");
    carrier.with_file_name(format!("{stem}.pxv.{extension}"))
}

/// Best-effort content type for a payload file, by extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("txt") | Some("md") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_finds_images_and_prunes_excluded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("photo.png"), b"x").unwrap();
        std::fs::write(dir.path().join("photo.JPG"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/buried.png"), b"x").unwrap();

        let mut found: Vec<String> = discover_carriers(dir.path())
            .into_iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        found.sort();

        assert_eq!(found, vec!["photo.JPG", "photo.png"]);
    }

    #[test]
    fn test_output_path_inserts_marker() {
        assert_eq!(output_path(Path::new("/tmp/photo.png")), Path::new("/tmp/photo.pxv.png"));
        assert_eq!(output_path(Path::new("pic.jpeg")), Path::new("pic.pxv.jpeg"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.txt")), "text/plain");
        assert_eq!(guess_content_type(Path::new("a.unknown")), "application/octet-stream");
    }
}

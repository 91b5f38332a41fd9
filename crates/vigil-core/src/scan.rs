//! Repository scan producing the entry set the engine works on.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::entry::{normalize_rel_path, FileEntry};
use crate::error::{Result, VigilError};

/// Directory names never scanned, wherever they appear.
pub const SKIPPED_DIRS: &[&str] = &[".git", "target", "node_modules"];

fn is_skipped(entry: &DirEntry, root: &Path, exclude: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if SKIPPED_DIRS.contains(&name.as_ref()) {
        return true;
    }
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
    exclude.iter().any(|ex| rel == ex.as_path())
}

/// Walk `root` and read every regular file as a [`FileEntry`].
///
/// `exclude` holds root-relative directories to skip (the state directory,
/// typically). Files that are not valid UTF-8 get `content = None`.
/// Unreadable directory entries are skipped. The result is sorted by path.
pub fn collect_entries(root: &Path, exclude: &[PathBuf]) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(VigilError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "scan root is not a directory"),
        ));
    }

    let exclude: Vec<PathBuf> = exclude
        .iter()
        .map(|p| p.strip_prefix(root).unwrap_or(p).to_path_buf())
        .collect();
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped(e, root, &exclude));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(%err, root = %root.display(), "skipping path during scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel_path = normalize_rel_path(&rel.to_string_lossy());
        let file = match std::fs::read(entry.path()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => FileEntry::new(&rel_path, text),
                Err(_) => FileEntry::without_content(&rel_path),
            },
            Err(err) => {
                debug!(%err, path = %rel_path, "unreadable file");
                FileEntry::without_content(&rel_path)
            }
        };
        entries.push(file);
    }

    entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    debug!(count = entries.len(), root = %root.display(), "scan complete");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scan_skips_noise_and_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for (p, c) in [
            ("src/b.rs", "fn b() {}"),
            ("a.txt", "hello"),
            (".git/HEAD", "ref"),
            ("node_modules/x/index.js", "x"),
            ("target/debug/out", "bin"),
            (".vigil/integrity.json", "[]"),
        ] {
            let full = root.join(p);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, c).unwrap();
        }
        std::fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let entries = collect_entries(root, &[PathBuf::from(".vigil")]).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "blob.bin", "src/b.rs"]);
        assert_eq!(entries[0].content.as_deref(), Some("hello"));
        assert!(entries[1].content.is_none());
    }

    #[test]
    fn absolute_exclude_is_relativized() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("state")).unwrap();
        std::fs::write(dir.path().join("state/x.json"), "{}").unwrap();
        std::fs::write(dir.path().join("keep.txt"), "k").unwrap();

        let entries = collect_entries(dir.path(), &[dir.path().join("state")]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rel_path, "keep.txt");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_entries(&dir.path().join("nope"), &[]).is_err());
    }
}

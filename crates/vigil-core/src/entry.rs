use serde::{Deserialize, Serialize};

/// A tracked file: repository-relative POSIX path plus its text content.
///
/// `content` is `None` for files that could not be read as text. Entries
/// with absent or blank content are skipped by every engine component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(rename = "relPath")]
    pub rel_path: String,
    pub content: Option<String>,
}

impl FileEntry {
    pub fn new(rel_path: impl AsRef<str>, content: impl Into<String>) -> Self {
        Self {
            rel_path: normalize_rel_path(rel_path.as_ref()),
            content: Some(content.into()),
        }
    }

    /// Entry whose content is unknown (binary or unreadable).
    pub fn without_content(rel_path: impl AsRef<str>) -> Self {
        Self {
            rel_path: normalize_rel_path(rel_path.as_ref()),
            content: None,
        }
    }

    /// Content to fingerprint, or `None` when the entry must be skipped.
    pub fn trackable_content(&self) -> Option<&str> {
        if self.rel_path.is_empty() {
            return None;
        }
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

/// Normalize a repository-relative path to POSIX form.
///
/// Backslashes become `/`, `.` segments are dropped and repeated separators
/// collapse. `..` is kept as-is; the mover rejects it.
pub fn normalize_rel_path(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    for segment in unified.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

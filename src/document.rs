/*! Source documents.

A [SourceDocument] is the read-only input of the pipeline: an ordered list of lines
identified by the path it was read from.
!*/
use std::path::{Path, PathBuf};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
    lines: Vec<String>,
}

impl SourceDocument {
    /// Build a document from in-memory text. `path` is only used as an identity.
    pub fn new(path: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            path: path.into(),
            lines: content.lines().map(String::from).collect(),
        }
    }

    /// Read an UTF-8 text file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(path, &content))
    }

    /// Get a reference to the document's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::SourceDocument;

    #[test]
    fn lines_are_kept_in_order() {
        let doc = SourceDocument::new("mem", "a\n\nb\r\nc");
        assert_eq!(doc.lines(), &["a", "", "b", "c"]);
        assert_eq!(doc.line(3), Some("c"));
        assert_eq!(doc.line(4), None);
    }

    #[test]
    fn from_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "ahë\nahete").unwrap();
        let doc = SourceDocument::from_path(f.path()).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.path(), f.path());
    }

    #[test]
    fn missing_file() {
        let r = SourceDocument::from_path(std::path::Path::new("does/not/exist.txt"));
        assert!(r.is_err());
    }
}

//! Loading the novel the agent answers questions about.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AppError;

/// Path used when `--novel` is not given.
pub const DEFAULT_NOVEL_PATH: &str = "nvQA/Frankenstein.txt";

/// The full text of a novel, read once before the session starts.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: String,
}

impl Document {
    /// Read `path` as UTF-8. A missing file and an unreadable one are
    /// reported as different errors.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AppError::DocumentNotFound(path.to_path_buf()),
            _ => AppError::DocumentRead { path: path.to_path_buf(), source: e },
        })?;
        info!(path = %path.display(), chars = text.chars().count(), "novel loaded");
        Ok(Self { path: path.to_path_buf(), text })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display, falling back to the full path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_text_and_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Frankenstein.txt");
        fs::write(&path, "You will rejoice to hear…").unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.name(), "Frankenstein.txt");
        assert_eq!(doc.char_count(), 25);
        assert_eq!(doc.into_text(), "You will rejoice to hear…");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Document::load(Path::new("/nonexistent/novel.txt")).unwrap_err();
        assert!(matches!(err, AppError::DocumentNotFound(p) if p.ends_with("novel.txt")));
    }

    #[test]
    fn invalid_utf8_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        let err = Document::load(&path).unwrap_err();
        assert!(matches!(err, AppError::DocumentRead { .. }));
    }

    #[test]
    fn directory_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = Document::load(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::DocumentRead { .. }));
    }
}

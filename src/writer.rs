use crate::{
    error::{Error, Result},
    notebook::Notebook,
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Persists stripped notebooks with atomic replace semantics.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Writer;

impl Writer {
    /// Creates the output directory (and parents) if absent.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub(crate) fn ensure_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
    }

    /// Serializes and writes a notebook.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails. The
    /// destination is left as it was in that case.
    pub(crate) fn write_notebook(&self, path: &Path, notebook: &Notebook) -> Result<usize> {
        let content = notebook.to_json_string()?;
        self.write_file_atomic(path, &content)?;

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(content.len())
    }

    /// Writes a file atomically.
    ///
    /// # Process
    ///
    /// 1. Writes content to a temporary sibling file
    /// 2. Syncs the temporary file to disk
    /// 3. Atomically renames it over the target path
    ///
    /// A failed write never leaves a half-written target behind.
    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let temp_path = Self::temp_path(path);

        let result = Self::write_and_sync(&temp_path, content)
            .and_then(|()| fs::rename(&temp_path, path).map_err(|e| Error::io(path, e)));

        if result.is_err() && temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        result
    }

    fn write_and_sync(temp_path: &Path, content: &str) -> Result<()> {
        let mut temp_file = fs::File::create(temp_path).map_err(|e| Error::io(temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(temp_path, e))?;

        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::Cell;
    use assert_fs::prelude::*;

    #[test]
    fn test_write_notebook() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("lab.ipynb");

        let nb = Notebook::new(vec![Cell::code("x = 1")]);
        let written = Writer.write_notebook(target.path(), &nb).unwrap();

        let content = std::fs::read_to_string(target.path()).unwrap();
        assert_eq!(content.len(), written);
        assert_eq!(Notebook::parse(&content).unwrap(), nb);
        temp.child("lab.ipynb.tmp").assert(predicates::path::missing());
    }

    #[test]
    fn test_write_replaces_existing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("lab.ipynb");
        target.write_str("old contents").unwrap();

        let nb = Notebook::new(Vec::new());
        Writer.write_notebook(target.path(), &nb).unwrap();

        let content = std::fs::read_to_string(target.path()).unwrap();
        assert!(content.contains("\"nbformat\": 4"));
    }

    #[test]
    fn test_missing_parent_is_io_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.path().join("no/such/dir/lab.ipynb");

        let err = Writer
            .write_notebook(&target, &Notebook::new(Vec::new()))
            .unwrap_err();

        assert!(err.is_io());
        assert!(!target.exists());
    }

    #[test]
    fn test_ensure_dir_creates_parents() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c");

        Writer.ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            Writer::temp_path(Path::new("/x/lab.ipynb")),
            PathBuf::from("/x/lab.ipynb.tmp")
        );
    }
}

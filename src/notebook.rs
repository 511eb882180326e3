//! Jupyter notebook (nbformat v4) document model.
//!
//! Only the fields the stripper needs are typed. Everything else on the
//! notebook and on each cell is kept in a flattened map so that a
//! read/write cycle does not lose kernel specs, cell ids, attachments or
//! unknown keys.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;

/// The only major format version this crate understands.
pub const SUPPORTED_MAJOR_VERSION: u64 = 4;

/// A parsed notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Cells in document order
    pub cells: Vec<Cell>,

    /// Major format version (always 4 once parsed)
    pub nbformat: u64,

    /// Minor format version
    #[serde(default)]
    pub nbformat_minor: u64,

    /// Notebook metadata and any other top-level keys, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Kind of cell
    pub cell_type: CellType,

    /// Cell content
    pub source: Source,

    /// Execution results (code cells only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Value>>,

    /// Execution index. `None` means the key is absent (non-code cells),
    /// `Some(None)` serializes as `null`.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_count: Option<Option<u64>>,

    /// `id`, `metadata`, `attachments` and unknown keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn present_or_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(Some)
}

impl Cell {
    /// Creates a code cell with no outputs and no execution count.
    #[must_use]
    pub fn code(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Code,
            source: Source::Text(source.into()),
            outputs: Some(Vec::new()),
            execution_count: Some(None),
            extra: Map::new(),
        }
    }

    /// Creates a markdown cell.
    #[must_use]
    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Markdown,
            source: Source::Text(source.into()),
            outputs: None,
            execution_count: None,
            extra: Map::new(),
        }
    }

    /// Returns true for executable code cells.
    #[must_use]
    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// Returns true if the cell carries outputs or an execution index.
    #[must_use]
    pub fn has_execution_state(&self) -> bool {
        self.outputs.as_ref().is_some_and(|o| !o.is_empty())
            || matches!(self.execution_count, Some(Some(_)))
    }
}

/// Type of notebook cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CellType {
    /// Executable code cell
    Code,
    /// Markdown documentation cell
    Markdown,
    /// Raw text cell
    Raw,
    /// Any other value, preserved verbatim
    Other(String),
}

impl From<String> for CellType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "code" => Self::Code,
            "markdown" => Self::Markdown,
            "raw" => Self::Raw,
            _ => Self::Other(s),
        }
    }
}

impl From<CellType> for String {
    fn from(t: CellType) -> Self {
        match t {
            CellType::Code => "code".to_string(),
            CellType::Markdown => "markdown".to_string(),
            CellType::Raw => "raw".to_string(),
            CellType::Other(s) => s,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::Markdown => f.write_str("markdown"),
            Self::Raw => f.write_str("raw"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Cell source as stored on disk: one string or a list of fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    /// Single string
    Text(String),
    /// Fragments to be concatenated, normally one per line
    Lines(Vec<String>),
}

impl Source {
    /// Returns the logical text of the cell.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }

    /// Replaces the text, keeping the on-disk shape.
    pub fn set_text(&mut self, text: &str) {
        *self = if matches!(self, Self::Lines(_)) {
            Self::Lines(text.split_inclusive('\n').map(str::to_string).collect())
        } else {
            Self::Text(text.to_string())
        };
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Notebook {
    /// Creates an empty v4 notebook with the given cells.
    #[must_use]
    pub fn new(cells: Vec<Cell>) -> Self {
        let mut extra = Map::new();
        extra.insert("metadata".to_string(), Value::Object(Map::new()));
        Self {
            cells,
            nbformat: SUPPORTED_MAJOR_VERSION,
            nbformat_minor: 5,
            extra,
        }
    }

    /// Parses a notebook from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] for malformed JSON or structure and
    /// [`Error::UnsupportedVersion`] when `nbformat` is not 4.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::invalid_document("", e.to_string()))?;

        let Some(object) = value.as_object() else {
            return Err(Error::invalid_document("", "top-level value is not an object"));
        };

        let major = object
            .get("nbformat")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::invalid_document("", "missing or non-integer `nbformat`"))?;

        if major != SUPPORTED_MAJOR_VERSION {
            let minor = object
                .get("nbformat_minor")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            return Err(Error::UnsupportedVersion {
                path: Default::default(),
                major,
                minor,
            });
        }

        serde_json::from_value(value).map_err(|e| Error::invalid_document("", e.to_string()))
    }

    /// Reads and parses a notebook file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a document error
    /// if it is not a v4 notebook.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                Error::invalid_document(path, "file is not valid UTF-8")
            } else {
                Error::io(path, e)
            }
        })?;

        Self::parse(&content).map_err(|e| e.with_path(path))
    }

    /// Serializes the notebook the way Jupyter writes it: sorted keys,
    /// one-space indent, trailing newline.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if JSON encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        // Map is BTree-backed, so going through Value sorts every key.
        let value = serde_json::to_value(self)?;

        let mut buf = Vec::with_capacity(4096);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut serializer)?;
        buf.push(b'\n');

        String::from_utf8(buf).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })
    }

    /// Number of code cells.
    #[must_use]
    pub fn code_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_code()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "cells": [
                {
                    "cell_type": "markdown",
                    "id": "intro",
                    "metadata": {},
                    "source": ["# Lab 1\n", "Fill in the blanks."]
                },
                {
                    "cell_type": "code",
                    "execution_count": 3,
                    "id": "c1",
                    "metadata": {"tags": ["solution"]},
                    "outputs": [{"output_type": "stream", "name": "stdout", "text": ["2\n"]}],
                    "source": "print(1 + 1)"
                }
            ],
            "metadata": {
                "kernelspec": {"display_name": "Python 3", "language": "python", "name": "python3"}
            },
            "nbformat": 4,
            "nbformat_minor": 5
        })
    }

    #[test]
    fn test_parse_typed_fields() {
        let nb = Notebook::parse(&sample().to_string()).unwrap();

        assert_eq!(nb.cells.len(), 2);
        assert_eq!(nb.cells[0].cell_type, CellType::Markdown);
        assert_eq!(nb.cells[0].source.text(), "# Lab 1\nFill in the blanks.");
        assert_eq!(nb.cells[0].execution_count, None);
        assert_eq!(nb.cells[1].execution_count, Some(Some(3)));
        assert_eq!(nb.cells[1].outputs.as_ref().map(Vec::len), Some(1));
        assert!(nb.cells[1].has_execution_state());
        assert_eq!(nb.code_cell_count(), 1);
    }

    #[test]
    fn test_unrelated_fields_pass_through() {
        let original = sample();
        let nb = Notebook::parse(&original.to_string()).unwrap();
        let written: Value = serde_json::from_str(&nb.to_json_string().unwrap()).unwrap();

        assert_eq!(written, original);
    }

    #[test]
    fn test_null_execution_count_survives() {
        let nb = Notebook::new(vec![Cell::code("x = 1")]);
        let written: Value = serde_json::from_str(&nb.to_json_string().unwrap()).unwrap();

        assert_eq!(written["cells"][0]["execution_count"], Value::Null);
        assert_eq!(written["cells"][0]["outputs"], json!([]));
    }

    #[test]
    fn test_markdown_has_no_execution_keys() {
        let nb = Notebook::new(vec![Cell::markdown("hello")]);
        let written: Value = serde_json::from_str(&nb.to_json_string().unwrap()).unwrap();
        let cell = written["cells"][0].as_object().unwrap();

        assert!(!cell.contains_key("execution_count"));
        assert!(!cell.contains_key("outputs"));
    }

    #[test]
    fn test_output_format() {
        let json = Notebook::new(vec![Cell::markdown("é")]).to_json_string().unwrap();

        assert!(json.starts_with("{\n \"cells\": ["));
        assert!(json.ends_with("}\n"));
        assert!(json.contains('é'));
        // sorted keys
        assert!(json.find("\"metadata\"").unwrap() < json.find("\"nbformat\"").unwrap());
    }

    #[test]
    fn test_unknown_cell_type_preserved() {
        let doc = json!({
            "cells": [{"cell_type": "heading", "metadata": {}, "source": "x"}],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 0
        });
        let nb = Notebook::parse(&doc.to_string()).unwrap();

        assert_eq!(nb.cells[0].cell_type, CellType::Other("heading".to_string()));
        assert!(!nb.cells[0].is_code());
        assert!(nb.to_json_string().unwrap().contains("\"heading\""));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Notebook::parse("{ not json").unwrap_err();
        assert!(err.is_invalid_document());
    }

    #[test]
    fn test_rejects_missing_cells() {
        let err = Notebook::parse(r#"{"nbformat": 4, "nbformat_minor": 5, "metadata": {}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn test_rejects_old_version() {
        let err = Notebook::parse(r#"{"nbformat": 3, "nbformat_minor": 0, "worksheets": []}"#)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { major: 3, minor: 0, .. }));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = Notebook::parse("[1, 2, 3]").unwrap_err();
        assert!(err.is_invalid_document());
    }

    #[test]
    fn test_source_set_text_keeps_shape() {
        let mut lines = Source::Lines(vec!["a\n".into(), "b".into()]);
        lines.set_text("x\ny\nz");
        assert_eq!(lines, Source::Lines(vec!["x\n".into(), "y\n".into(), "z".into()]));

        let mut text = Source::Text("a".into());
        text.set_text("x\ny");
        assert_eq!(text, Source::Text("x\ny".into()));
    }

    #[test]
    fn test_read_reports_path() {
        use assert_fs::prelude::*;

        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("broken-complete.ipynb");
        file.write_str("nope").unwrap();

        let err = Notebook::read(file.path()).unwrap_err();
        assert!(err.to_string().contains("broken-complete.ipynb"));

        let err = Notebook::read(&temp.path().join("missing.ipynb")).unwrap_err();
        assert!(err.is_io());
    }
}

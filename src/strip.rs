//! Solution stripping.
//!
//! Replaces every `# BEGIN_SOLUTION` ... `# END_SOLUTION` region in code
//! cells with a placeholder and clears execution state, turning an answer
//! key into a student copy.

use crate::error::{Error, Result};
use crate::notebook::Notebook;
use memchr::memmem::Finder;
use tracing::{debug, warn};

/// Marker opening a solution region.
pub const BEGIN_SOLUTION: &str = "# BEGIN_SOLUTION";

/// Marker closing a solution region.
pub const END_SOLUTION: &str = "# END_SOLUTION";

/// Text left in place of each removed region.
pub const PLACEHOLDER: &str = "# ADD YOUR CODE HERE";

/// Marker literals recognised by the stripper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Opens a region
    pub begin: String,
    /// Closes a region
    pub end: String,
    /// Replaces each region
    pub placeholder: String,
}

impl Markers {
    /// Checks that the markers can delimit a region.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a marker is empty, both markers are
    /// the same, or the placeholder contains a marker.
    pub fn validate(&self) -> Result<()> {
        let Self {
            begin,
            end,
            placeholder,
        } = self;

        if begin.is_empty() || end.is_empty() {
            return Err(Error::config("solution markers must not be empty"));
        }

        if begin == end {
            return Err(Error::config(format!(
                "begin and end markers must differ (both are '{begin}')"
            )));
        }

        if placeholder.contains(begin.as_str()) || placeholder.contains(end.as_str()) {
            return Err(Error::config(format!(
                "placeholder '{placeholder}' must not contain a solution marker"
            )));
        }

        Ok(())
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            begin: BEGIN_SOLUTION.to_string(),
            end: END_SOLUTION.to_string(),
            placeholder: PLACEHOLDER.to_string(),
        }
    }
}

/// What a strip pass did to one notebook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripReport {
    /// Code cells visited
    pub code_cells: usize,

    /// Code cells whose source changed
    pub modified_cells: usize,

    /// Solution regions replaced
    pub regions_replaced: usize,

    /// Code cells that had outputs or an execution count
    pub cleared_cells: usize,

    /// Begin markers found inside an already open region
    pub nested_begins: usize,
}

impl StripReport {
    pub(crate) fn absorb(&mut self, other: &Self) {
        self.code_cells += other.code_cells;
        self.modified_cells += other.modified_cells;
        self.regions_replaced += other.regions_replaced;
        self.cleared_cells += other.cleared_cells;
        self.nested_begins += other.nested_begins;
    }
}

/// Result of scanning one source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    /// Source with regions replaced
    pub text: String,
    /// Number of regions replaced
    pub regions: usize,
    /// Begin markers swallowed by an enclosing region
    pub nested_begins: usize,
}

/// Strips solution regions from notebooks.
#[derive(Debug, Clone)]
pub struct SolutionStripper {
    markers: Markers,
    begin: Finder<'static>,
    end: Finder<'static>,
}

impl Default for SolutionStripper {
    fn default() -> Self {
        Self::with_valid_markers(Markers::default())
    }
}

impl SolutionStripper {
    /// Creates a stripper for the given markers.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the markers fail
    /// [`Markers::validate`].
    pub fn new(markers: Markers) -> Result<Self> {
        markers.validate()?;
        Ok(Self::with_valid_markers(markers))
    }

    fn with_valid_markers(markers: Markers) -> Self {
        let begin = Finder::new(markers.begin.as_bytes()).into_owned();
        let end = Finder::new(markers.end.as_bytes()).into_owned();
        Self { markers, begin, end }
    }

    /// Returns the markers in use.
    #[must_use]
    pub const fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Replaces every complete begin/end region in `source`.
    ///
    /// Each begin marker pairs with the nearest end marker after it. A begin
    /// marker with no end marker after it is left as text.
    #[must_use]
    pub fn replace_regions(&self, source: &str) -> Replaced {
        let haystack = source.as_bytes();
        let begin_len = self.markers.begin.len();
        let end_len = self.markers.end.len();

        let mut text = String::with_capacity(source.len());
        let mut cursor = 0;
        let mut regions = 0;
        let mut nested_begins = 0;

        while let Some(found) = self.begin.find(&haystack[cursor..]) {
            let start = cursor + found;
            let body_start = start + begin_len;

            let Some(body_len) = self.end.find(&haystack[body_start..]) else {
                break;
            };
            let body_end = body_start + body_len;

            nested_begins += self.begin.find_iter(&haystack[body_start..body_end]).count();

            text.push_str(&source[cursor..start]);
            text.push_str(&self.markers.placeholder);
            cursor = body_end + end_len;
            regions += 1;
        }

        text.push_str(&source[cursor..]);

        Replaced {
            text,
            regions,
            nested_begins,
        }
    }

    /// Strips the notebook in place and reports what changed.
    ///
    /// Non-code cells are not touched. Every code cell loses its outputs
    /// and execution count whether or not it contained a region.
    pub fn strip_in_place(&self, notebook: &mut Notebook) -> StripReport {
        let mut report = StripReport::default();

        for (index, cell) in notebook.cells.iter_mut().enumerate() {
            if !cell.is_code() {
                continue;
            }

            let mut cell_report = StripReport {
                code_cells: 1,
                ..StripReport::default()
            };

            let replaced = self.replace_regions(&cell.source.text());
            if replaced.regions > 0 {
                cell.source.set_text(&replaced.text);
                cell_report.modified_cells = 1;
                cell_report.regions_replaced = replaced.regions;
                debug!("Cell {}: replaced {} solution region(s)", index, replaced.regions);
            }

            if replaced.nested_begins > 0 {
                warn!(
                    "Cell {}: {} '{}' marker(s) inside an open region were removed with it",
                    index, replaced.nested_begins, self.markers.begin
                );
                cell_report.nested_begins = replaced.nested_begins;
            }

            if cell.has_execution_state() {
                cell_report.cleared_cells = 1;
            }
            cell.outputs = Some(Vec::new());
            cell.execution_count = Some(None);

            report.absorb(&cell_report);
        }

        report
    }

    /// Returns the stripped notebook.
    #[must_use]
    pub fn strip(&self, mut notebook: Notebook) -> Notebook {
        self.strip_in_place(&mut notebook);
        notebook
    }
}

/// Strips a notebook using the default markers.
///
/// # Examples
///
/// ```
/// use woodhouse::{strip, Cell, Notebook};
///
/// let nb = Notebook::new(vec![Cell::code(
///     "x = 1\n# BEGIN_SOLUTION\ny = x + 1\n# END_SOLUTION",
/// )]);
/// let student = strip(nb);
///
/// assert_eq!(student.cells[0].source.text(), "x = 1\n# ADD YOUR CODE HERE");
/// ```
#[must_use]
pub fn strip(notebook: Notebook) -> Notebook {
    SolutionStripper::default().strip(notebook)
}

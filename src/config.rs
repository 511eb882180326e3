use crate::error::{Error, Result};
use crate::strip::Markers;
use std::path::PathBuf;

/// Filename suffix marking an answer-key notebook.
pub const DEFAULT_COMPLETION_SUFFIX: &str = "-complete.ipynb";

const NOTEBOOK_EXTENSION: &str = ".ipynb";

/// Configuration for one strip run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Notebook file or directory of notebooks to strip
    pub input: PathBuf,

    /// Output file (single-file mode) or directory (directory mode)
    pub output: Option<PathBuf>,

    /// Suffix identifying answer-key notebooks
    pub completion_suffix: String,

    /// Solution markers and placeholder
    pub markers: Markers,

    /// Dry run mode (no file writes)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use woodhouse::Config;
    ///
    /// let config = Config::builder()
    ///     .input("lab1-complete.ipynb")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Input path doesn't exist
    /// - Completion suffix is empty or not a notebook suffix
    /// - Markers are empty, identical, or appear in the placeholder
    /// - Explicit output is the input itself
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(Error::config(format!(
                "Input path does not exist: {}",
                self.input.display()
            )));
        }

        if self.completion_suffix.len() <= NOTEBOOK_EXTENSION.len()
            || !self.completion_suffix.ends_with(NOTEBOOK_EXTENSION)
        {
            return Err(Error::config(format!(
                "completion suffix '{}' must end with '{}' and mark the name before it",
                self.completion_suffix, NOTEBOOK_EXTENSION
            )));
        }

        self.markers.validate()?;

        if let Some(ref output) = self.output {
            if *output == self.input {
                return Err(Error::usage(format!(
                    "output path is the same as the input ({}); refusing to overwrite the answer key",
                    output.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            output: None,
            completion_suffix: DEFAULT_COMPLETION_SUFFIX.to_string(),
            markers: Markers::default(),
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    completion_suffix: Option<String>,
    markers: Option<Markers>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the notebook file or directory to strip.
    #[must_use]
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Sets the output file or directory.
    ///
    /// Without it, outputs are derived by dropping the completion suffix.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Sets the completion suffix (default `-complete.ipynb`).
    #[must_use]
    pub fn completion_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.completion_suffix = Some(suffix.into());
        self
    }

    /// Sets the solution markers.
    #[must_use]
    pub fn markers(mut self, markers: Markers) -> Self {
        self.markers = Some(markers);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            input: self.input.unwrap_or_else(|| PathBuf::from(".")),
            output: self.output,
            completion_suffix: self
                .completion_suffix
                .unwrap_or_else(|| DEFAULT_COMPLETION_SUFFIX.to_string()),
            markers: self.markers.unwrap_or_default(),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}

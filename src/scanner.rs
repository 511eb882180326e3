use crate::{
    config::Config,
    error::{Error, Result},
};
use globset::{Glob, GlobMatcher};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// One notebook to strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Job {
    /// Answer-key notebook
    pub input: PathBuf,

    /// Student notebook to write
    pub output: PathBuf,
}

/// How the input was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Plan {
    /// One explicit input file.
    Single(Job),

    /// Every matching notebook in a directory.
    Directory {
        /// Directory receiving the outputs (created if absent)
        output_dir: PathBuf,
        /// Jobs in file-name order
        jobs: Vec<Job>,
    },
}

impl Plan {
    /// Returns the planned jobs.
    pub(crate) fn jobs(&self) -> &[Job] {
        match self {
            Self::Single(job) => std::slice::from_ref(job),
            Self::Directory { jobs, .. } => jobs,
        }
    }
}

/// Derives the student filename from an answer-key filename.
///
/// Returns `None` when `file_name` does not end with `suffix` or nothing
/// would remain before it.
///
/// # Examples
///
/// ```
/// use woodhouse::derive_output_name;
///
/// assert_eq!(
///     derive_output_name("lab1-complete.ipynb", "-complete.ipynb").as_deref(),
///     Some("lab1.ipynb")
/// );
/// assert_eq!(derive_output_name("lab1.ipynb", "-complete.ipynb"), None);
/// ```
#[must_use]
pub fn derive_output_name(file_name: &str, suffix: &str) -> Option<String> {
    file_name
        .strip_suffix(suffix)
        .filter(|stem| !stem.is_empty())
        .map(|stem| format!("{stem}.ipynb"))
}

/// Resolves the configured input into strip jobs.
pub(crate) struct Scanner {
    input: PathBuf,
    output: Option<PathBuf>,
    suffix: String,
    matcher: GlobMatcher,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion suffix cannot form a glob.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let pattern = format!("*{}", globset::escape(&config.completion_suffix));
        let matcher = Glob::new(&pattern)
            .map_err(|e| Error::config(format!("Invalid suffix pattern '{pattern}': {e}")))?
            .compile_matcher();

        Ok(Self {
            input: config.input.clone(),
            output: config.output.clone(),
            suffix: config.completion_suffix.clone(),
            matcher,
        })
    }

    /// Builds the plan for the configured input.
    ///
    /// # Errors
    ///
    /// Returns a usage error if a single file has no explicit output and its
    /// name does not carry the completion suffix, or if a directory input is
    /// paired with an output that is an existing file.
    pub(crate) fn plan(&self) -> Result<Plan> {
        if self.input.is_dir() {
            self.plan_directory()
        } else {
            self.plan_single().map(Plan::Single)
        }
    }

    fn plan_single(&self) -> Result<Job> {
        let output = match self.output {
            Some(ref output) => output.clone(),
            None => self.derived_path(&self.input).ok_or_else(|| {
                Error::usage(format!(
                    "cannot derive an output name for '{}': it does not end with '{}'. \
                    Pass an explicit output path.",
                    self.input.display(),
                    self.suffix
                ))
            })?,
        };

        Ok(Job {
            input: self.input.clone(),
            output,
        })
    }

    fn plan_directory(&self) -> Result<Plan> {
        let output_dir = self.output.clone().unwrap_or_else(|| self.input.clone());

        if output_dir.is_file() {
            return Err(Error::usage(format!(
                "output '{}' is a file, but input '{}' is a directory",
                output_dir.display(),
                self.input.display()
            )));
        }

        debug!("Scanning {} for '*{}'", self.input.display(), self.suffix);

        let mut jobs = Vec::new();
        let walker = WalkDir::new(&self.input)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.matcher.is_match(entry.file_name()) {
                trace!("Skipping {}", entry.path().display());
                continue;
            }

            let Some(name) = self.derived_name(entry.path()) else {
                trace!("Skipping {} (nothing before suffix)", entry.path().display());
                continue;
            };

            jobs.push(Job {
                input: entry.path().to_path_buf(),
                output: output_dir.join(name),
            });
        }

        let jobs = self.drop_jobs_overwriting_inputs(&output_dir, jobs);

        if jobs.is_empty() {
            warn!(
                "No notebooks ending in '{}' found in {}",
                self.suffix,
                self.input.display()
            );
        } else {
            debug!("Found {} notebook(s)", jobs.len());
        }

        Ok(Plan::Directory { output_dir, jobs })
    }

    /// Skips jobs whose output is another job's answer key.
    ///
    /// Only possible when outputs land in the input directory, e.g.
    /// `a-complete-complete.ipynb` would otherwise replace `a-complete.ipynb`.
    fn drop_jobs_overwriting_inputs(&self, output_dir: &Path, jobs: Vec<Job>) -> Vec<Job> {
        if !same_directory(output_dir, &self.input) {
            return jobs;
        }

        let input_names: HashSet<OsString> = jobs
            .iter()
            .filter_map(|job| job.input.file_name().map(OsStr::to_os_string))
            .collect();

        jobs.into_iter()
            .filter(|job| {
                let clobbers = job
                    .output
                    .file_name()
                    .is_some_and(|name| input_names.contains(name));
                if clobbers {
                    warn!(
                        "Skipping {}: its output {} is another answer key",
                        job.input.display(),
                        job.output.display()
                    );
                }
                !clobbers
            })
            .collect()
    }

    fn derived_name(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        derive_output_name(file_name, &self.suffix)
    }

    fn derived_path(&self, path: &Path) -> Option<PathBuf> {
        let name = self.derived_name(path)?;
        Some(path.with_file_name(name))
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

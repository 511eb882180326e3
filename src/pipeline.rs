use crate::{
    config::Config,
    error::{Error, Result},
    notebook::Notebook,
    scanner::{Job, Plan, Scanner},
    strip::{SolutionStripper, StripReport},
    writer::Writer,
};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Statistics collected during a run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Notebooks selected for stripping
    pub notebooks_found: usize,

    /// Notebooks stripped successfully
    pub notebooks_stripped: usize,

    /// Notebooks written to disk (0 in dry run)
    pub notebooks_written: usize,

    /// Notebooks that failed
    pub notebooks_failed: usize,

    /// Totals across all stripped notebooks
    pub report: StripReport,

    /// Total execution time
    pub duration: Duration,
}

impl RunStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!(
            "Stripped {}/{} notebook(s): {} solution region(s) removed, {} cell(s) cleared, {} written in {:.2}s",
            self.notebooks_stripped,
            self.notebooks_found,
            self.report.regions_replaced,
            self.report.cleared_cells,
            self.notebooks_written,
            self.duration.as_secs_f64()
        );
    }
}

/// Orchestrates planning, stripping and writing.
pub struct Pipeline {
    config: Config,
    scanner: Scanner,
    stripper: SolutionStripper,
    writer: Writer,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let scanner = Scanner::new(&config)?;
        let stripper = SolutionStripper::new(config.markers.clone())?;

        Ok(Self {
            config,
            scanner,
            stripper,
            writer: Writer,
        })
    }

    /// Executes the run and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Plan**: single file or every matching notebook in a directory
    /// 2. **Strip**: read, transform in memory
    /// 3. **Write**: atomically persist each result
    ///
    /// # Errors
    ///
    /// In single-file mode the first failure is returned as is. In directory
    /// mode every notebook is attempted and the failures are returned
    /// together as [`Error::Multiple`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use woodhouse::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .input("./notebooks")
    ///     .output("./student")
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(input = %self.config.input.display()))]
    pub fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();

        let plan = self.scanner.plan()?;
        let mut stats = RunStats {
            notebooks_found: plan.jobs().len(),
            ..RunStats::default()
        };

        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
        }

        match plan {
            Plan::Single(job) => {
                self.process(&job, &mut stats)?;
            }
            Plan::Directory { output_dir, jobs } => {
                if !self.config.dry_run && !jobs.is_empty() {
                    self.writer.ensure_dir(&output_dir)?;
                }

                let mut errors = Vec::new();
                for job in &jobs {
                    if let Err(e) = self.process(job, &mut stats) {
                        warn!("Failed to strip {}: {}", job.input.display(), e);
                        stats.notebooks_failed += 1;
                        errors.push(e);
                    }
                }

                if !errors.is_empty() {
                    return Err(Error::multiple(errors));
                }
            }
        }

        stats.duration = start_time.elapsed();

        info!(
            "✓ Stripped {} notebook(s) in {:.2}s",
            stats.notebooks_stripped,
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }

    /// Reads, strips and writes one notebook.
    fn process(&self, job: &Job, stats: &mut RunStats) -> Result<()> {
        let mut notebook = Notebook::read(&job.input)?;
        let report = self.stripper.strip_in_place(&mut notebook);

        stats.notebooks_stripped += 1;
        stats.report.absorb(&report);

        if self.config.dry_run {
            info!(
                "Would write {} ({} region(s) removed)",
                job.output.display(),
                report.regions_replaced
            );
            return Ok(());
        }

        self.writer.write_notebook(&job.output, &notebook)?;
        stats.notebooks_written += 1;

        info!(
            "{} -> {} ({} region(s) removed, {} code cell(s))",
            job.input.display(),
            job.output.display(),
            report.regions_replaced,
            report.code_cells
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use serde_json::{json, Value};

    fn answer_key() -> String {
        json!({
            "cells": [
                {"cell_type": "markdown", "metadata": {}, "source": ["# Exercise\n", "Add one."]},
                {
                    "cell_type": "code",
                    "execution_count": 12,
                    "metadata": {},
                    "outputs": [{"output_type": "execute_result", "data": {"text/plain": ["2"]}, "execution_count": 12, "metadata": {}}],
                    "source": ["def add_one(x):\n", "    # BEGIN_SOLUTION\n", "    return x + 1\n", "    # END_SOLUTION\n"]
                }
            ],
            "metadata": {"kernelspec": {"name": "python3", "display_name": "Python 3", "language": "python"}},
            "nbformat": 4,
            "nbformat_minor": 5
        })
        .to_string()
    }

    fn read_json(path: &std::path::Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_single_file_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("lab-complete.ipynb");
        input.write_str(&answer_key()).unwrap();

        let config = Config::builder().input(input.path()).build().unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.notebooks_written, 1);
        assert_eq!(stats.report.regions_replaced, 1);

        let out = read_json(&temp.path().join("lab.ipynb"));
        assert_eq!(
            out["cells"][1]["source"],
            json!(["def add_one(x):\n", "    # ADD YOUR CODE HERE\n"])
        );
        assert_eq!(out["cells"][1]["outputs"], json!([]));
        assert_eq!(out["cells"][1]["execution_count"], Value::Null);
        assert_eq!(out["metadata"]["kernelspec"]["name"], "python3");
        assert_eq!(out["cells"][0], read_json(input.path())["cells"][0]);
    }

    #[test]
    fn test_directory_run_creates_output_dir() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a-complete.ipynb").write_str(&answer_key()).unwrap();
        temp.child("b-complete.ipynb").write_str(&answer_key()).unwrap();
        temp.child("readme.md").write_str("not a notebook").unwrap();

        let out_dir = temp.path().join("student");
        let config = Config::builder()
            .input(temp.path())
            .output(&out_dir)
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.notebooks_found, 2);
        assert_eq!(stats.notebooks_written, 2);
        assert!(out_dir.join("a.ipynb").is_file());
        assert!(out_dir.join("b.ipynb").is_file());
    }

    #[test]
    fn test_directory_run_continues_past_bad_notebook() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a-complete.ipynb").write_str("not json").unwrap();
        temp.child("b-complete.ipynb").write_str(&answer_key()).unwrap();

        let config = Config::builder().input(temp.path()).build().unwrap();
        let err = Pipeline::new(config).unwrap().run().unwrap_err();

        match err {
            Error::Multiple { count, ref errors } => {
                assert_eq!(count, 1);
                assert!(errors[0].is_invalid_document());
            }
            other => panic!("unexpected error: {other}"),
        }
        temp.child("a.ipynb").assert(predicates::path::missing());
        temp.child("b.ipynb").assert(predicates::path::is_file());
    }

    #[test]
    fn test_directory_run_keeps_answer_key_named_like_an_output() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a-complete-complete.ipynb").write_str(&answer_key()).unwrap();
        let key = temp.child("a-complete.ipynb");
        key.write_str(&answer_key()).unwrap();

        let config = Config::builder().input(temp.path()).build().unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.notebooks_written, 1);
        key.assert(predicates::str::contains("return x + 1"));
        temp.child("a.ipynb").assert(predicates::str::contains("# ADD YOUR CODE HERE"));
    }

    #[test]
    fn test_single_file_invalid_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("lab-complete.ipynb");
        input.write_str(r#"{"nbformat": 3, "nbformat_minor": 0, "worksheets": []}"#).unwrap();

        let config = Config::builder().input(input.path()).build().unwrap();
        let err = Pipeline::new(config).unwrap().run().unwrap_err();

        assert!(err.is_invalid_document());
        temp.child("lab.ipynb").assert(predicates::path::missing());
    }

    #[test]
    fn test_usage_error_never_strips() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("lab.ipynb");
        input.write_str(&answer_key()).unwrap();

        let config = Config::builder().input(input.path()).build().unwrap();
        let err = Pipeline::new(config).unwrap().run().unwrap_err();

        assert!(err.is_usage());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a-complete.ipynb").write_str(&answer_key()).unwrap();

        let config = Config::builder()
            .input(temp.path())
            .output(temp.path().join("out"))
            .dry_run(true)
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.notebooks_stripped, 1);
        assert_eq!(stats.notebooks_written, 0);
        assert!(!temp.child("out").exists());
    }
}

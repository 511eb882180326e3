//! # woodhouse
//!
//! Personal command-line tools. The library half turns Jupyter answer-key
//! notebooks into student copies.
//!
//! ## Features
//!
//! - Replaces `# BEGIN_SOLUTION` ... `# END_SOLUTION` regions in code cells
//!   with `# ADD YOUR CODE HERE`
//! - Clears outputs and execution counts of every code cell
//! - Keeps notebook metadata, cell ids and unknown keys intact
//! - Single-file or whole-directory runs driven by a `-complete.ipynb` suffix
//! - Atomic writes: a failed run never leaves a half-written notebook
//!
//! ## Quick Start
//!
//! ```no_run
//! use woodhouse::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input("./lectures")
//!     .output("./student")
//!     .build()?;
//!
//! woodhouse::run(config)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Scanner**: Resolves the input into (answer key, student copy) pairs
//! 2. **Stripper**: Pure in-memory transform of one notebook
//! 3. **Writer**: Serializes and atomically persists the result

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod notebook;
mod pipeline;
mod scanner;
mod strip;
mod writer;

pub use config::{Config, ConfigBuilder, DEFAULT_COMPLETION_SUFFIX};
pub use error::{Error, Result};
pub use notebook::{Cell, CellType, Notebook, Source, SUPPORTED_MAJOR_VERSION};
pub use pipeline::{Pipeline, RunStats};
pub use scanner::derive_output_name;
pub use strip::{
    strip, Markers, Replaced, SolutionStripper, StripReport, BEGIN_SOLUTION, END_SOLUTION,
    PLACEHOLDER,
};

/// Runs a complete strip with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - No output path can be derived for a single input file
/// - A notebook is not a valid v4 document
/// - File operations fail
pub fn run(config: Config) -> Result<RunStats> {
    Pipeline::new(config)?.run()
}

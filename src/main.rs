use anyhow::Context;
use clap::{Parser, Subcommand};
use woodhouse::{Config, Error, Pipeline, DEFAULT_COMPLETION_SUFFIX};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "woodhouse",
    version,
    about = "woodhouse: A collection of personal tools.",
    long_about = "woodhouse: A collection of personal tools.\n\n\
    USAGE EXAMPLES:\n  \
      # Strip one answer key into lab1.ipynb next to it\n  \
      woodhouse notebook strip-answers lab1-complete.ipynb\n\n  \
      # Strip into an explicit file\n  \
      woodhouse notebook strip-answers answers.ipynb student.ipynb\n\n  \
      # Strip every *-complete.ipynb in a directory into ./student\n  \
      woodhouse notebook strip-answers ./lectures ./student"
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Notebook-related tools.
    Notebook {
        #[command(subcommand)]
        action: NotebookCommand,
    },
}

#[derive(Subcommand, Debug)]
enum NotebookCommand {
    /// Strip solution blocks from a Jupyter notebook.
    StripAnswers {
        /// Answer-key notebook, or a directory of them
        #[arg(value_name = "INPUT_PATH")]
        input: PathBuf,

        /// Student notebook (or directory); derived from the suffix when omitted
        #[arg(value_name = "OUTPUT_PATH")]
        output: Option<PathBuf>,

        /// Filename suffix marking answer keys
        #[arg(
            long,
            default_value = DEFAULT_COMPLETION_SUFFIX,
            value_name = "SUFFIX",
            allow_hyphen_values = true
        )]
        suffix: String,

        /// Dry run (don't write files)
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Command::Notebook {
            action:
                NotebookCommand::StripAnswers {
                    input,
                    output,
                    suffix,
                    dry_run,
                },
        } => strip_answers(input, output, suffix, dry_run),
    }
}

fn strip_answers(
    input: PathBuf,
    output: Option<PathBuf>,
    suffix: String,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut builder = Config::builder()
        .input(input)
        .completion_suffix(suffix)
        .dry_run(dry_run);

    if let Some(output) = output {
        builder = builder.output(output);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .inspect_err(report_batch_failures)
        .context("Strip failed")?;

    stats.print_summary();
    Ok(())
}

fn report_batch_failures(err: &Error) {
    if let Error::Multiple { errors, .. } = err {
        for e in errors {
            eprintln!("  {e}");
        }
    }
}

fn setup_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("woodhouse=info"),
        1 => EnvFilter::new("woodhouse=debug"),
        _ => EnvFilter::new("woodhouse=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

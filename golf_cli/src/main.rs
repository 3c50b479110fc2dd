use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use golf_pipeline::{pipeline, PipelineConfig};

#[derive(Debug, Parser)]
#[command(name = "golfstats")]
#[command(about = "Builds player statistics and the static golf API tree", long_about = None)]
struct Cli {
    /// Record store root (users/, courses/, rounds/<userId>/)
    #[arg(short, long, env = "GOLF_INPUT_DIR", default_value = pipeline::DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Directory the API tree is published to
    #[arg(short, long, env = "GOLF_OUTPUT_DIR", default_value = pipeline::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild and publish the API tree (default)
    Build,
    /// Load and validate records without writing anything
    Check,
}

/// Progress goes to stdout; warnings and errors go to stderr.
struct SplitLogger {
    out: env_logger::Logger,
    err: env_logger::Logger,
}

impl SplitLogger {
    fn from_env() -> Self {
        let build = |target| {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(target)
                .build()
        };
        Self {
            out: build(env_logger::Target::Stdout),
            err: build(env_logger::Target::Stderr),
        }
    }

    fn init(self) {
        let max_level = self.out.filter();
        if log::set_boxed_logger(Box::new(self)).is_ok() {
            log::set_max_level(max_level);
        }
    }

    fn route(&self, level: log::Level) -> &env_logger::Logger {
        if level <= log::Level::Warn {
            &self.err
        } else {
            &self.out
        }
    }
}

impl log::Log for SplitLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.route(metadata.level()).enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        self.route(record.level()).log(record);
    }

    fn flush(&self) {
        self.out.flush();
        self.err.flush();
    }
}

fn main() -> ExitCode {
    SplitLogger::from_env().init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(1)
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = PipelineConfig {
        input_root: cli.input,
        output_root: cli.output,
    };

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let summary = golf_pipeline::run(&config).with_context(|| {
                format!(
                    "pipeline failed: {} -> {}",
                    config.input_root.display(),
                    config.output_root.display()
                )
            })?;
            log::info!(
                "done: {} users, {} rounds, {} statistics, {} resources at {}",
                summary.loaded.users,
                summary.loaded.rounds,
                summary.loaded.statistics,
                summary.resources_written,
                summary.output_root.display()
            );
        }
        Command::Check => {
            let summary = golf_pipeline::check(&config)
                .with_context(|| format!("check failed: {}", config.input_root.display()))?;
            log::info!(
                "ok: {} users, {} courses, {} rounds, {} with statistics",
                summary.users,
                summary.courses,
                summary.rounds,
                summary.statistics
            );
        }
    }

    Ok(())
}

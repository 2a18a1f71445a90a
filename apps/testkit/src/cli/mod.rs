//! CLI command handling for testkit

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use testkit_config::{logging, AppConfig};
use testkit_core::{
    BuildRunner, CommandRunner, FixtureRegistry, FixtureRequest, FixtureStager, LocatorSearch,
    RunContext,
};
use tracing::{debug, info};

/// The main CLI struct.
#[derive(Parser)]
#[command(name = "testkit")]
#[command(about = "Stage, inspect and isolate build tool plugin test fixtures")]
#[command(version)]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Copy fixture projects into the build output and write the locator file
    Stage {
        /// Directory holding one subdirectory per fixture (repeatable)
        #[arg(long, required = true)]
        source: Vec<PathBuf>,
        /// Where staged fixtures go (replaced on every run)
        #[arg(long)]
        output: PathBuf,
        /// Scratch directory for isolated copies during tests
        #[arg(long)]
        staging: PathBuf,
        /// Locator file to write
        #[arg(long)]
        locator: PathBuf,
        /// Fixture used by tests that do not name one
        #[arg(long)]
        implicit: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Show the fixtures the locator file points at
    Fixtures {
        /// Locator file (default: search the configured roots)
        #[arg(long)]
        locator: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Make an isolated copy of a fixture and print its directory
    ///
    /// The copy is kept; remove it with `testkit clean`.
    Isolate {
        /// Fixture name (default: the implicit fixture)
        fixture: Option<String>,
        /// Locator file (default: search the configured roots)
        #[arg(long)]
        locator: Option<PathBuf>,
    },
    /// Run the build tool against a fresh isolated copy of a fixture
    Run {
        /// Fixture name (default: the implicit fixture)
        #[arg(long)]
        fixture: Option<String>,
        /// Locator file (default: search the configured roots)
        #[arg(long)]
        locator: Option<PathBuf>,
        /// Keep the isolated copy after the build
        #[arg(long)]
        keep: bool,
        /// Build tool program (default: runner.program from configuration)
        #[arg(long)]
        program: Option<String>,
        /// Arguments passed to the build tool
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Remove the staging directory and every isolated copy in it
    Clean {
        /// Locator file (default: search the configured roots)
        #[arg(long)]
        locator: Option<PathBuf>,
    },
}

/// Parse arguments, set up logging and dispatch
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::initialize(&config);

    let cwd = std::env::current_dir().context("Failed to read the working directory")?;

    match cli.command {
        Commands::Stage {
            source,
            output,
            staging,
            locator,
            implicit,
            format,
        } => {
            let (first, rest) = source
                .split_first()
                .context("At least one --source directory is required")?;
            let report = rest
                .iter()
                .fold(FixtureStager::new(first, output, staging, locator), |stager, dir| {
                    stager.with_source(dir)
                })
                .with_implicit_fixture(implicit)
                .stage()
                .context("Failed to stage fixtures")?;
            output::print_stage_report(&report, &format)?;
        }
        Commands::Fixtures { locator, format } => {
            let registry = load_registry(&config, &cwd, locator.as_deref())?;
            output::print_registry(&registry, &format)?;
        }
        Commands::Isolate { fixture, locator } => {
            let context = RunContext::new(search_for(&config, &cwd, locator.as_deref()));
            let scope = context
                .scope_for(&request_for(fixture))
                .context("Failed to isolate fixture")?;
            let directory = scope.persist();
            info!(directory = %directory.display(), "Isolated fixture kept");
            println!("{}", directory.display());
        }
        Commands::Run {
            fixture,
            locator,
            keep,
            program,
            args,
        } => {
            let context = RunContext::new(search_for(&config, &cwd, locator.as_deref()));
            let scope = context
                .scope_for(&request_for(fixture))
                .context("Failed to isolate fixture")?;

            let runner = match program {
                Some(program) => CommandRunner::from_config(&config.runner).with_program(program),
                None => CommandRunner::from_config(&config.runner),
            };
            let invocation = scope.invocation(args);
            debug!(program = %runner.program(), "Running build against isolated fixture");
            let result = runner.run(&invocation);

            if keep {
                eprintln!("Kept isolated fixture at {}", scope.persist().display());
            } else {
                context.after_each(scope);
            }

            let build = result.context("Failed to run the build tool")?;
            return Ok(exit_code_for(build.exit_code));
        }
        Commands::Clean { locator } => {
            let registry = load_registry(&config, &cwd, locator.as_deref())?;
            registry.release();
            println!("Removed {}", registry.staging_dir().display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn search_for(config: &AppConfig, cwd: &Path, locator: Option<&Path>) -> LocatorSearch {
    match locator {
        Some(path) => LocatorSearch::explicit(cwd.join(path)),
        None => LocatorSearch::from_config(&config.locator, cwd),
    }
}

/// Read-only registry for commands that must not create the staging directory
fn load_registry(config: &AppConfig, cwd: &Path, locator: Option<&Path>) -> Result<FixtureRegistry> {
    FixtureRegistry::inspect(&search_for(config, cwd, locator))
        .context("Failed to load the fixture registry")
}

fn request_for(fixture: Option<String>) -> FixtureRequest {
    match fixture {
        Some(name) => FixtureRequest::named(name),
        None => FixtureRequest::new(),
    }
}

fn exit_code_for(code: Option<i32>) -> ExitCode {
    match code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

//! Describing and running host build tool invocations against isolated fixtures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use testkit_config::RunnerConfig;
use testkit_foundation::{TestKitError, TestKitResult};
use tracing::debug;

/// Flag appended to every invocation so failures carry full stack traces
pub const STACKTRACE_FLAG: &str = "--stacktrace";

/// Environment variable set on the build tool process when debug output is requested
pub const DEBUG_ENV: &str = "TESTKIT_DEBUG";

/// Everything the host build tool's runner needs to execute one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInvocation {
    pub working_dir: PathBuf,
    /// Caller arguments followed by `--stacktrace`
    pub arguments: Vec<String>,
    pub debug: bool,
    pub forward_output: bool,
}

impl BuildInvocation {
    pub fn new<I, S>(working_dir: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut arguments: Vec<String> = args.into_iter().map(Into::into).collect();
        arguments.push(STACKTRACE_FLAG.to_string());

        Self {
            working_dir: working_dir.into(),
            arguments,
            debug: true,
            forward_output: true,
        }
    }

    pub fn with_forward_output(mut self, forward_output: bool) -> Self {
        self.forward_output = forward_output;
        self
    }

    /// Hand the invocation to a runner
    pub fn run_with(&self, runner: &dyn BuildRunner) -> TestKitResult<BuildOutput> {
        runner.run(self)
    }
}

/// Captured result of one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl BuildOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes build invocations
///
/// A failed build is reported through [`BuildOutput`]; `Err` means the build
/// tool could not be run at all.
#[cfg_attr(test, mockall::automock)]
pub trait BuildRunner: Send + Sync {
    fn run(&self, invocation: &BuildInvocation) -> TestKitResult<BuildOutput>;
}

/// Runs the build tool as a child process
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    env: BTreeMap<String, String>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            program: config.program.clone(),
            env: config.env.clone(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl BuildRunner for CommandRunner {
    fn run(&self, invocation: &BuildInvocation) -> TestKitResult<BuildOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(&invocation.arguments)
            .current_dir(&invocation.working_dir)
            .envs(&self.env);
        if invocation.debug {
            command.env(DEBUG_ENV, "true");
        }

        debug!(
            program = %self.program,
            arguments = ?invocation.arguments,
            working_dir = %invocation.working_dir.display(),
            "Running build tool"
        );

        let output = command.output().map_err(|e| {
            TestKitError::invocation(
                format!(
                    "unable to start `{}` in `{}`",
                    self.program,
                    invocation.working_dir.display()
                ),
                Some(e),
            )
        })?;

        if invocation.forward_output {
            // Forwarding is a convenience; a closed stdout must not fail the build
            let _ = std::io::stdout().write_all(&output.stdout);
            let _ = std::io::stderr().write_all(&output.stderr);
        }

        let result = BuildOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(exit_code = ?result.exit_code, "Build tool finished");
        Ok(result)
    }
}

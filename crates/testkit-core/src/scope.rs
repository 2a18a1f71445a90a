//! A per-test isolated copy of one fixture

use crate::invocation::BuildInvocation;
use crate::isolation::remove_dir_best_effort;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Isolated copy of a fixture, owned by a single test
///
/// The copy lives at `<staging>/<token>/<fixture>`. Dropping the scope deletes
/// the whole `<token>` directory; call [`FixtureScope::persist`] to keep it.
#[derive(Debug)]
pub struct FixtureScope {
    fixture: String,
    token_dir: PathBuf,
    directory: PathBuf,
    persisted: bool,
}

impl FixtureScope {
    pub(crate) fn new(fixture: impl Into<String>, token_dir: PathBuf, directory: PathBuf) -> Self {
        Self {
            fixture: fixture.into(),
            token_dir,
            directory,
            persisted: false,
        }
    }

    /// Name of the fixture this scope was copied from
    pub fn fixture(&self) -> &str {
        &self.fixture
    }

    /// The isolated directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Describe a build tool run against the isolated directory
    ///
    /// `--stacktrace` is always appended, and debug output and output
    /// forwarding are switched on.
    pub fn invocation<I, S>(&self, args: I) -> BuildInvocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BuildInvocation::new(&self.directory, args)
    }

    /// Delete the isolated directory now
    ///
    /// Failures are logged, never returned. Calling this again is a no-op.
    pub fn release(&self) {
        if remove_dir_best_effort(&self.token_dir) {
            debug!(fixture = %self.fixture, directory = %self.directory.display(), "Released fixture scope");
        }
    }

    /// Keep the isolated directory and return its path
    pub fn persist(mut self) -> PathBuf {
        self.persisted = true;
        self.directory.clone()
    }
}

impl Drop for FixtureScope {
    fn drop(&mut self) {
        if !self.persisted {
            self.release();
        }
    }
}

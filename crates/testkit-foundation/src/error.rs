//! Error handling for TestKit fixture resolution and isolation

use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by every TestKit crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TestKitError {
    /// Locator record missing or malformed, or the fixture base directory is unusable
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// No fixture name could be selected for a request
    #[error("Ambiguous fixture: {message} (available fixtures: [{}])", available.join(", "))]
    AmbiguousFixture {
        message: String,
        available: Vec<String>,
    },

    /// Copying a fixture into its isolated directory failed
    #[error("Isolation of fixture '{fixture}' into '{}' failed: {message}", destination.display())]
    Isolation {
        fixture: String,
        destination: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The host build tool could not be invoked
    #[error("Build invocation failed: {message}")]
    Invocation {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestKitError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new ambiguous fixture error listing the fixtures that were discovered
    pub fn ambiguous_fixture(message: impl Into<String>, available: Vec<String>) -> Self {
        Self::AmbiguousFixture {
            message: message.into(),
            available,
        }
    }

    /// Create a new isolation error without an underlying I/O cause
    pub fn isolation(
        fixture: impl Into<String>,
        destination: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Isolation {
            fixture: fixture.into(),
            destination: destination.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new isolation error caused by an I/O failure
    pub fn isolation_io(
        fixture: impl Into<String>,
        destination: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Isolation {
            fixture: fixture.into(),
            destination: destination.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new invocation error
    pub fn invocation(message: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::Invocation {
            message: message.into(),
            source,
        }
    }

    /// Short machine-readable kind, recorded on the CLI's failure log
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::AmbiguousFixture { .. } => "ambiguous_fixture",
            Self::Isolation { .. } => "isolation",
            Self::Invocation { .. } => "invocation",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type TestKitResult<T> = Result<T, TestKitError>;

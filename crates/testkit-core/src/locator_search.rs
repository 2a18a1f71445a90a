//! Finding the locator file on disk

use std::path::{Path, PathBuf};
use testkit_config::LocatorConfig;
use testkit_foundation::{TestKitError, TestKitResult};
use tracing::debug;

/// Ordered candidate paths for the locator file; the first existing file wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSearch {
    candidates: Vec<PathBuf>,
}

impl LocatorSearch {
    /// Search exactly one, explicitly injected path
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }

    /// Join `file_name` onto each root, in order
    pub fn from_roots<I, P>(roots: I, file_name: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            candidates: roots
                .into_iter()
                .map(|root| root.as_ref().join(file_name))
                .collect(),
        }
    }

    /// Build the search from configuration; relative paths are resolved against `base`
    pub fn from_config(config: &LocatorConfig, base: &Path) -> Self {
        match &config.path {
            Some(path) => Self::explicit(base.join(path)),
            None => Self::from_roots(
                config.search_roots.iter().map(|root| base.join(root)),
                &config.file_name,
            ),
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Return the first candidate that is an existing file
    pub fn find(&self) -> TestKitResult<PathBuf> {
        for candidate in &self.candidates {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Found locator file");
                return Ok(candidate.clone());
            }
            debug!(path = %candidate.display(), "No locator file at candidate");
        }

        let searched: Vec<String> = self
            .candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect();
        Err(TestKitError::configuration(format!(
            "Could not locate the TestKit locator file (searched: {})",
            searched.join(", ")
        )))
    }
}

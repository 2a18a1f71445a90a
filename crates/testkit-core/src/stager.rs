//! Build-side producer: stages fixture sources and writes the locator record

use crate::isolation::copy_tree;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use testkit_foundation::{LocatorRecord, TestKitError, TestKitResult};
use tracing::{debug, info, warn};

/// Copies every fixture directory found under the source directories into
/// `output_dir` and records where they went
#[derive(Debug, Clone)]
pub struct FixtureStager {
    source_dirs: Vec<PathBuf>,
    output_dir: PathBuf,
    staging_dir: PathBuf,
    locator_path: PathBuf,
    implicit_fixture_name: Option<String>,
}

/// What a staging run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub fixtures: Vec<String>,
    pub locator_path: PathBuf,
    pub record: LocatorRecord,
}

impl FixtureStager {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        locator_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dirs: vec![source_dir.into()],
            output_dir: output_dir.into(),
            staging_dir: staging_dir.into(),
            locator_path: locator_path.into(),
            implicit_fixture_name: None,
        }
    }

    /// Add another directory of fixtures; all sources land in the same output
    pub fn with_source(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dirs.push(source_dir.into());
        self
    }

    /// Record a default fixture; an empty name means none
    pub fn with_implicit_fixture(mut self, name: Option<String>) -> Self {
        self.implicit_fixture_name = name.filter(|n| !n.is_empty());
        self
    }

    pub fn source_dirs(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    /// Replace the output directory with fresh copies and rewrite the locator file
    ///
    /// Every check runs before the output directory is touched, so a
    /// misconfigured stager never deletes anything.
    pub fn stage(&self) -> TestKitResult<StageReport> {
        let output_dir = absolute(&self.output_dir)?;
        let staging_dir = absolute(&self.staging_dir)?;
        let fixtures = self.plan(&output_dir)?;

        if output_dir.exists() {
            debug!(output_dir = %output_dir.display(), "Clearing previously staged fixtures");
            fs::remove_dir_all(&output_dir)?;
        }
        fs::create_dir_all(&output_dir)?;

        for (name, source) in &fixtures {
            copy_tree(source, &output_dir.join(name))?;
        }
        let fixtures: Vec<String> = fixtures.into_keys().collect();

        if let Some(implicit) = &self.implicit_fixture_name {
            if !fixtures.contains(implicit) {
                warn!(implicit = %implicit, "Implicit fixture does not match any staged fixture");
            }
        }

        let record = LocatorRecord::new(
            output_dir,
            staging_dir,
            self.implicit_fixture_name.clone(),
        );
        record.write(&self.locator_path)?;

        info!(
            fixtures = fixtures.len(),
            sources = self.source_dirs.len(),
            locator = %self.locator_path.display(),
            "Staged TestKit fixtures"
        );

        Ok(StageReport {
            fixtures,
            locator_path: self.locator_path.clone(),
            record,
        })
    }

    /// Validate the sources against the output and map fixture name to source directory
    fn plan(&self, output_dir: &Path) -> TestKitResult<BTreeMap<String, PathBuf>> {
        let resolved_output = resolve(output_dir)?;
        let mut fixtures: BTreeMap<String, PathBuf> = BTreeMap::new();

        for source_dir in &self.source_dirs {
            if !source_dir.is_dir() {
                return Err(TestKitError::configuration(format!(
                    "Fixture source directory (`{}`) does not exist or is not a directory",
                    source_dir.display()
                )));
            }

            let resolved_source = resolve(source_dir)?;
            if resolved_source.starts_with(&resolved_output)
                || resolved_output.starts_with(&resolved_source)
            {
                return Err(TestKitError::configuration(format!(
                    "Fixture output directory (`{}`) overlaps fixture source directory (`{}`)",
                    output_dir.display(),
                    source_dir.display()
                )));
            }

            for entry in fs::read_dir(source_dir)? {
                let entry = entry?;
                let path = entry.path();
                if !path.is_dir() {
                    debug!(path = %path.display(), "Skipping non-directory entry in fixture sources");
                    continue;
                }
                let Ok(name) = entry.file_name().into_string() else {
                    warn!(path = %path.display(), "Skipping fixture directory with a non UTF-8 name");
                    continue;
                };

                if let Some(previous) = fixtures.get(&name) {
                    return Err(TestKitError::configuration(format!(
                        "Fixture '{}' is defined in both `{}` and `{}`",
                        name,
                        previous.display(),
                        path.display()
                    )));
                }
                fixtures.insert(name, path);
            }
        }

        Ok(fixtures)
    }
}

fn absolute(path: &Path) -> TestKitResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Absolute path with links and `..` resolved through its deepest existing ancestor
fn resolve(path: &Path) -> TestKitResult<PathBuf> {
    let absolute = absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();

    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }

    let mut resolved = fs::canonicalize(existing)?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

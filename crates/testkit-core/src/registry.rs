//! Fixture discovery and scope creation for one test run

use crate::isolation::{copy_tree, isolation_token, remove_dir_best_effort};
use crate::locator_search::LocatorSearch;
use crate::scope::FixtureScope;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use testkit_config::logging::fixture_span;
use testkit_foundation::{LocatorRecord, TestKitError, TestKitResult};
use tracing::{debug, info, warn};

/// The fixtures available to a test run and the staging area for their copies
///
/// Built once per run. The set of fixture names is read when the registry is
/// created and never re-scanned.
#[derive(Debug)]
pub struct FixtureRegistry {
    record: LocatorRecord,
    fixture_names: BTreeSet<String>,
    implicit_fixture_name: Option<String>,
}

impl FixtureRegistry {
    /// Find the locator file and build the registry from it
    pub fn locate(search: &LocatorSearch) -> TestKitResult<Self> {
        let path = search.find()?;
        Self::from_locator_file(&path)
    }

    /// Like [`FixtureRegistry::locate`] but leaves the staging directory alone
    ///
    /// For listing and cleanup. Scopes resolved from an inspected registry
    /// still create the staging directory on demand.
    pub fn inspect(search: &LocatorSearch) -> TestKitResult<Self> {
        let record = LocatorRecord::read(&search.find()?)?;
        Self::build(record, false)
    }

    pub fn from_locator_file(path: &Path) -> TestKitResult<Self> {
        let record = LocatorRecord::read(path)?;
        Self::from_record(record)
    }

    /// Validate the record and discover fixtures
    ///
    /// The base directory must exist; the staging directory is created if needed.
    pub fn from_record(record: LocatorRecord) -> TestKitResult<Self> {
        Self::build(record, true)
    }

    fn build(record: LocatorRecord, prepare_staging: bool) -> TestKitResult<Self> {
        let base_dir = &record.base_dir;
        if !base_dir.exists() {
            return Err(TestKitError::configuration(format!(
                "TestKit base directory (`{}`) does not exist",
                base_dir.display()
            )));
        }
        if !base_dir.is_dir() {
            return Err(TestKitError::configuration(format!(
                "TestKit base directory (`{}`) is not a directory",
                base_dir.display()
            )));
        }

        if prepare_staging {
            fs::create_dir_all(&record.staging_dir).map_err(|e| {
                TestKitError::configuration(format!(
                    "Unable to create TestKit staging directory (`{}`): {}",
                    record.staging_dir.display(),
                    e
                ))
            })?;
        }

        let fixture_names = discover_fixtures(base_dir)?;

        let implicit_fixture_name = match &record.implicit_fixture_name {
            Some(name) => Some(name.clone()),
            None if fixture_names.len() == 1 => fixture_names.iter().next().cloned(),
            None => None,
        };

        info!(
            base_dir = %base_dir.display(),
            staging_dir = %record.staging_dir.display(),
            fixtures = fixture_names.len(),
            implicit = implicit_fixture_name.as_deref().unwrap_or("<none>"),
            "TestKit fixture registry ready"
        );

        Ok(Self {
            record,
            fixture_names,
            implicit_fixture_name,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.record.base_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.record.staging_dir
    }

    /// Discovered fixture names, sorted
    pub fn fixture_names(&self) -> Vec<String> {
        self.fixture_names.iter().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fixture_names.contains(name)
    }

    /// Fixture used when a request names none
    ///
    /// The locator's explicit value is returned as is, even when no such
    /// fixture was discovered; otherwise the only fixture, if there is exactly one.
    pub fn implicit_fixture_name(&self) -> Option<&str> {
        self.implicit_fixture_name.as_deref()
    }

    /// Copy fixture `name` into a new isolated directory
    ///
    /// The copy goes to `<staging>/<token>/<name>` with a fresh random token,
    /// so concurrent calls never share a directory. On failure the partially
    /// populated destination is left in place and named in the error.
    pub fn resolve_scope(&self, name: &str) -> TestKitResult<FixtureScope> {
        let span = fixture_span(name);
        let _enter = span.enter();

        let token_dir = self.staging_dir().join(isolation_token());
        let destination = token_dir.join(name);

        if !is_plain_name(name) {
            return Err(TestKitError::isolation(
                name,
                destination,
                "fixture names must be a single path component",
            ));
        }

        if !self.contains(name) {
            warn!("Requested fixture was not discovered in the base directory");
        }

        let source = self.base_dir().join(name);
        if !source.is_dir() {
            return Err(TestKitError::isolation(
                name,
                destination,
                format!("fixture source directory `{}` does not exist", source.display()),
            ));
        }

        fs::create_dir_all(&destination).map_err(|e| {
            TestKitError::isolation_io(name, &destination, "unable to create isolated directory", e)
        })?;

        copy_tree(&source, &destination).map_err(|e| {
            TestKitError::isolation_io(
                name,
                &destination,
                format!("copy from `{}` did not complete", source.display()),
                e,
            )
        })?;

        debug!(directory = %destination.display(), "Isolated fixture");

        Ok(FixtureScope::new(name, token_dir, destination))
    }

    /// Remove the staging directory and everything under it
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub fn release(&self) {
        if remove_dir_best_effort(self.staging_dir()) {
            info!(staging_dir = %self.staging_dir().display(), "Released TestKit staging directory");
        }
    }
}

/// Immediate subdirectories of `base_dir`
fn discover_fixtures(base_dir: &Path) -> TestKitResult<BTreeSet<String>> {
    let unlistable = |e: std::io::Error| {
        TestKitError::configuration(format!(
            "Unable to list TestKit base directory (`{}`): {}",
            base_dir.display(),
            e
        ))
    };
    let entries = fs::read_dir(base_dir).map_err(unlistable)?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(unlistable)?;
        let path: PathBuf = entry.path();
        if !path.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => {
                debug!(fixture = %name, "Discovered fixture");
                names.insert(name);
            }
            Err(raw) => warn!(name = ?raw, "Skipping fixture directory with a non UTF-8 name"),
        }
    }
    Ok(names)
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_with(fixtures: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fixtures")).unwrap();
        for fixture in fixtures {
            let root = dir.path().join("fixtures").join(fixture);
            std::fs::create_dir_all(&root).unwrap();
            std::fs::write(root.join("build.cfg"), format!("name={}\n", fixture)).unwrap();
        }
        dir
    }

    fn record_for(dir: &Path, implicit: Option<&str>) -> LocatorRecord {
        LocatorRecord::new(
            dir.join("fixtures"),
            dir.join("stage"),
            implicit.map(str::to_string),
        )
    }

    #[test]
    fn test_discovers_only_directories() {
        let dir = base_with(&["simple", "other"]);
        std::fs::write(dir.path().join("fixtures/README.md"), "not a fixture").unwrap();

        let registry = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap();
        assert_eq!(registry.fixture_names(), vec!["other", "simple"]);
        assert_eq!(registry.base_dir(), dir.path().join("fixtures"));
        assert!(registry.staging_dir().is_dir());
    }

    #[test]
    fn test_single_fixture_becomes_implicit() {
        let dir = base_with(&["simple"]);
        let registry = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap();
        assert_eq!(registry.implicit_fixture_name(), Some("simple"));
    }

    #[test]
    fn test_no_implicit_with_several_fixtures() {
        let dir = base_with(&["simple", "other"]);
        let registry = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap();
        assert_eq!(registry.implicit_fixture_name(), None);
    }

    #[test]
    fn test_explicit_implicit_name_is_not_validated() {
        let dir = base_with(&["simple", "other"]);
        let registry =
            FixtureRegistry::from_record(record_for(dir.path(), Some("demo"))).unwrap();
        assert_eq!(registry.implicit_fixture_name(), Some("demo"));
        assert!(!registry.contains("demo"));
    }

    #[test]
    fn test_missing_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap_err();
        assert!(matches!(err, TestKitError::Configuration { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_base_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fixtures"), "").unwrap();
        let err = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_uncreatable_staging_dir_is_configuration_error() {
        let dir = base_with(&["simple"]);
        std::fs::write(dir.path().join("blocker"), "a regular file").unwrap();
        let record = LocatorRecord::new(
            dir.path().join("fixtures"),
            dir.path().join("blocker/stage"),
            None,
        );

        match FixtureRegistry::from_record(record) {
            Err(TestKitError::Configuration { message }) => {
                assert!(message.contains("Unable to create TestKit staging directory"), "{}", message);
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_inspect_leaves_staging_dir_alone() {
        let dir = base_with(&["simple", "other"]);
        let locator = dir.path().join("locator.properties");
        record_for(dir.path(), Some("simple")).write(&locator).unwrap();

        let registry = FixtureRegistry::inspect(&LocatorSearch::explicit(&locator)).unwrap();
        assert_eq!(registry.fixture_names(), vec!["other", "simple"]);
        assert_eq!(registry.implicit_fixture_name(), Some("simple"));
        assert!(!dir.path().join("stage").exists());

        // Isolating still works and creates it on demand
        let scope = registry.resolve_scope("simple").unwrap();
        assert!(scope.directory().join("build.cfg").is_file());
    }

    #[test]
    fn test_path_like_names_are_rejected() {
        let dir = base_with(&["simple"]);
        let registry = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap();

        for name in ["../simple", "simple/nested", "", "/simple"] {
            let err = registry.resolve_scope(name).unwrap_err();
            assert!(matches!(err, TestKitError::Isolation { .. }), "{}", name);
        }
    }

    #[test]
    fn test_release_removes_staging_and_tolerates_repeat() {
        let dir = base_with(&["simple"]);
        let registry = FixtureRegistry::from_record(record_for(dir.path(), None)).unwrap();
        let scope = registry.resolve_scope("simple").unwrap().persist();
        assert!(scope.exists());

        registry.release();
        registry.release();

        assert!(!registry.staging_dir().exists());
        assert!(registry.base_dir().join("simple/build.cfg").is_file());
    }
}

//! The locator record: hand-off between the staging step and the test run

use crate::error::{TestKitError, TestKitResult};
use crate::properties::{escape_value, Properties};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name the stager writes and the registry searches for
pub const LOCATOR_FILE_NAME: &str = "testkit_locator.properties";

/// Directory containing one subdirectory per fixture
pub const BASE_DIR_KEY: &str = "base-dir";

/// Writable scratch area for isolated copies
pub const STAGING_DIR_KEY: &str = "staging-dir";

/// Fixture used when a test does not name one
pub const IMPLICIT_FIXTURE_KEY: &str = "implicit-project-name";

/// Where fixtures live and where isolated copies go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorRecord {
    pub base_dir: PathBuf,
    pub staging_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_fixture_name: Option<String>,
}

impl LocatorRecord {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        implicit_fixture_name: Option<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            staging_dir: staging_dir.into(),
            implicit_fixture_name: implicit_fixture_name.filter(|name| !name.is_empty()),
        }
    }

    /// Read and parse a locator file
    pub fn read(path: &Path) -> TestKitResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TestKitError::configuration(format!(
                "Unable to read locator file `{}`: {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Read locator file");
        Self::parse(&text)
    }

    /// Parse locator text
    ///
    /// An empty `implicit-project-name` is the same as leaving it out.
    pub fn parse(text: &str) -> TestKitResult<Self> {
        let properties = Properties::parse(text)?;
        Self::from_properties(&properties)
    }

    pub fn from_properties(properties: &Properties) -> TestKitResult<Self> {
        let base_dir = required(properties, BASE_DIR_KEY)?;
        let staging_dir = required(properties, STAGING_DIR_KEY)?;
        let implicit = properties
            .get(IMPLICIT_FIXTURE_KEY)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(Self {
            base_dir: PathBuf::from(base_dir),
            staging_dir: PathBuf::from(staging_dir),
            implicit_fixture_name: implicit,
        })
    }

    /// Render the record as locator file text
    pub fn render(&self, generated_at: DateTime<Utc>) -> String {
        let mut out = String::new();
        out.push_str("## Used by tests to locate the TestKit fixture directories\n");
        out.push_str(&format!(
            "## Generated : {}\n",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!(
            "{}={}\n",
            BASE_DIR_KEY,
            escape_value(&self.base_dir.to_string_lossy())
        ));
        out.push_str(&format!(
            "{}={}\n",
            STAGING_DIR_KEY,
            escape_value(&self.staging_dir.to_string_lossy())
        ));
        out.push_str(&format!(
            "{}={}\n",
            IMPLICIT_FIXTURE_KEY,
            escape_value(self.implicit_fixture_name.as_deref().unwrap_or(""))
        ));
        out
    }

    /// Write the record, replacing any previous file. Parent directories are created.
    pub fn write(&self, path: &Path) -> TestKitResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(Utc::now()))?;
        debug!(path = %path.display(), "Wrote locator file");
        Ok(())
    }
}

fn required<'a>(properties: &'a Properties, key: &str) -> TestKitResult<&'a str> {
    properties
        .get(key)
        .ok_or_else(|| TestKitError::configuration(format!("Could not find `{}` in locator file", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_record() {
        let record = LocatorRecord::parse(
            "# comment\nbase-dir=/tmp/fixtures\nstaging-dir=/tmp/stage\nimplicit-project-name=simple\n",
        )
        .unwrap();
        assert_eq!(
            record,
            LocatorRecord::new("/tmp/fixtures", "/tmp/stage", Some("simple".to_string()))
        );
    }

    #[test]
    fn test_empty_implicit_name_is_absent() {
        let record =
            LocatorRecord::parse("base-dir=/a\nstaging-dir=/b\nimplicit-project-name=\n").unwrap();
        assert_eq!(record.implicit_fixture_name, None);

        let record = LocatorRecord::parse("base-dir=/a\nstaging-dir=/b\n").unwrap();
        assert_eq!(record.implicit_fixture_name, None);
    }

    #[test]
    fn test_missing_required_keys() {
        let err = LocatorRecord::parse("staging-dir=/b\n").unwrap_err();
        assert!(matches!(err, TestKitError::Configuration { .. }));
        assert!(err.to_string().contains("base-dir"));

        let err = LocatorRecord::parse("base-dir=/a\n").unwrap_err();
        assert!(err.to_string().contains("staging-dir"));
    }

    #[test]
    fn test_render_escapes_backslashes() {
        let record = LocatorRecord::new("C:\\fixtures", "C:\\stage", None);
        let generated = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let text = record.render(generated);

        assert!(text.contains("## Generated : 2024-01-02T03:04:05Z\n"));
        assert!(text.contains("base-dir=C:\\\\fixtures\n"));
        assert!(text.contains("staging-dir=C:\\\\stage\n"));
        assert!(text.ends_with("implicit-project-name=\n"));
        assert_eq!(LocatorRecord::parse(&text).unwrap(), record);
    }

    #[test]
    fn test_read_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocatorRecord::read(&dir.path().join(LOCATOR_FILE_NAME)).unwrap_err();
        assert!(matches!(err, TestKitError::Configuration { .. }));
    }

    #[test]
    fn test_write_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(LOCATOR_FILE_NAME);

        LocatorRecord::new("/one", "/stage", Some("a".to_string()))
            .write(&path)
            .unwrap();
        LocatorRecord::new("/two", "/stage", None)
            .write(&path)
            .unwrap();

        let record = LocatorRecord::read(&path).unwrap();
        assert_eq!(record.base_dir, PathBuf::from("/two"));
        assert_eq!(record.implicit_fixture_name, None);
    }
}

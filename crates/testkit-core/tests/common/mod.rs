//! Shared helpers for TestKit integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use testkit_foundation::{LocatorRecord, LOCATOR_FILE_NAME};
use walkdir::WalkDir;

/// A temporary layout with a fixture base directory, a staging directory and
/// a locator file. Cleans up automatically when dropped.
pub struct FixtureWorkspace {
    pub temp_dir: TempDir,
}

impl FixtureWorkspace {
    /// Creates a workspace with an empty `fixtures` base directory
    pub fn new() -> Self {
        let workspace = Self {
            temp_dir: tempdir().expect("Failed to create temp dir"),
        };
        fs::create_dir_all(workspace.base_dir()).expect("Failed to create base dir");
        workspace
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn base_dir(&self) -> PathBuf {
        self.path().join("fixtures")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.path().join("stage")
    }

    pub fn locator_path(&self) -> PathBuf {
        self.path().join("target/testkit").join(LOCATOR_FILE_NAME)
    }

    /// Creates a file inside fixture `fixture`, creating parent directories
    pub fn create_fixture_file(&self, fixture: &str, rel_path: &str, content: &[u8]) {
        let file_path = self.base_dir().join(fixture).join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent dirs for '{}': {}", rel_path, e)
            });
        }
        fs::write(&file_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", file_path.display(), e));
    }

    /// Creates a small but nested fixture project
    pub fn create_sample_fixture(&self, fixture: &str) {
        self.create_fixture_file(fixture, "build.cfg", format!("name = {}\n", fixture).as_bytes());
        self.create_fixture_file(fixture, "settings.cfg", b"include core\n");
        self.create_fixture_file(fixture, "src/main/app.txt", b"hello\n");
        self.create_fixture_file(fixture, "src/main/blob.bin", &[0, 1, 2, 254, 255]);
        fs::create_dir_all(self.base_dir().join(fixture).join("src/empty"))
            .expect("Failed to create empty dir");
    }

    /// Writes the locator file for this workspace
    pub fn write_locator(&self, implicit: Option<&str>) {
        LocatorRecord::new(
            self.base_dir(),
            self.staging_dir(),
            implicit.map(str::to_string),
        )
        .write(&self.locator_path())
        .expect("Failed to write locator");
    }

    /// Entries directly under the staging directory
    pub fn staging_entries(&self) -> usize {
        match fs::read_dir(self.staging_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// Relative path -> file bytes (`None` for directories)
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.expect("walk failed");
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            let content = if entry.file_type().is_dir() {
                None
            } else {
                Some(fs::read(entry.path()).expect("read failed"))
            };
            (relative, content)
        })
        .collect()
}

/// Assert two trees have identical structure and bytes
pub fn assert_same_tree(expected: &Path, actual: &Path) {
    pretty_assertions::assert_eq!(snapshot(expected), snapshot(actual));
}

//! Filesystem helpers behind fixture isolation

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Prefix of every per-scope directory created under the staging directory
pub const TOKEN_PREFIX: &str = "testkit-";

/// Totals for one recursive copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u64,
    pub directories: u64,
    pub bytes: u64,
}

/// A fresh directory name for one isolated copy (122 random bits)
pub fn isolation_token() -> String {
    format!("{}{}", TOKEN_PREFIX, Uuid::new_v4().simple())
}

/// Recursively copy the contents of `source` into `destination`
///
/// `destination` is created if needed. Symlinks are followed, so linked files
/// arrive as regular files with the same bytes. Stops at the first error and
/// leaves whatever was already copied in place.
pub fn copy_tree(source: &Path, destination: &Path) -> io::Result<CopyStats> {
    fs::create_dir_all(destination)?;
    let mut stats = CopyStats::default();

    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            stats.directories += 1;
        } else {
            stats.bytes += fs::copy(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    debug!(
        source = %source.display(),
        destination = %destination.display(),
        files = stats.files,
        directories = stats.directories,
        bytes = stats.bytes,
        "Copied directory tree"
    );

    Ok(stats)
}

/// Remove a directory tree, logging instead of failing
///
/// Returns `true` when the directory is gone afterwards (including when it was
/// never there).
pub fn remove_dir_best_effort(path: &Path) -> bool {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed directory");
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove directory");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokens_are_distinct() {
        let tokens: std::collections::HashSet<String> =
            (0..1000).map(|_| isolation_token()).collect();
        assert_eq!(tokens.len(), 1000);
        assert!(tokens.iter().all(|t| t.starts_with(TOKEN_PREFIX)));
    }

    #[test]
    fn test_copy_tree_preserves_structure_and_bytes() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(source.path().join("src/main")).unwrap();
        std::fs::create_dir_all(source.path().join("empty")).unwrap();
        std::fs::write(source.path().join("build.cfg"), "plugins { id 'x' }\n").unwrap();
        std::fs::write(source.path().join("src/main/data.bin"), [0u8, 159, 146, 150, 255]).unwrap();

        let target = tempfile::tempdir().unwrap();
        let destination = target.path().join("copy");
        let stats = copy_tree(source.path(), &destination).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 3);
        assert_eq!(
            std::fs::read(destination.join("src/main/data.bin")).unwrap(),
            vec![0u8, 159, 146, 150, 255]
        );
        assert_eq!(
            std::fs::read_to_string(destination.join("build.cfg")).unwrap(),
            "plugins { id 'x' }\n"
        );
        assert!(destination.join("empty").is_dir());
    }

    #[test]
    fn test_copy_tree_missing_source_fails() {
        let target = tempfile::tempdir().unwrap();
        let err = copy_tree(&target.path().join("nope"), &target.path().join("copy")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_remove_dir_best_effort_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let victim = dir.path().join("victim");
        std::fs::create_dir_all(victim.join("nested")).unwrap();

        assert!(remove_dir_best_effort(&victim));
        assert!(!victim.exists());
        assert!(remove_dir_best_effort(&victim));
    }
}

//! Locates benchmark and test executables by identifier prefix.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{HarnessError, Result};

/// All regular files directly under `dir` whose name starts with `prefix`,
/// sorted by path.
pub fn find_matching(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| HarnessError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// The exactly-two executables of one comparison run.
///
/// Any other match count is a configuration error; the worker pool never
/// starts on a miscounted pair.
pub fn find_pair(dir: &Path, prefix: &str) -> Result<[PathBuf; 2]> {
    let found = find_matching(dir, prefix)?;
    let count = found.len();
    <[PathBuf; 2]>::try_from(found).map_err(|_| {
        HarnessError::Config(format!(
            "expected exactly 2 executables matching `{prefix}` in {}, found {count}",
            dir.display()
        ))
    })
}

/// Digit-prefixed test executables under `dir`, optionally narrowed to the
/// given identifiers, sorted by path.
pub fn find_tests(dir: &Path, ids: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| HarnessError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let selected = if ids.is_empty() {
            name.chars().next().is_some_and(|c| c.is_ascii_digit())
        } else {
            ids.iter().any(|id| name.starts_with(id.as_str()))
        };
        if selected {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn populated() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["11-uthread", "11-pthread", "21-switch", "README"] {
            touch(dir.path(), name);
        }
        dir
    }

    #[test]
    fn pair_is_sorted_and_exact() {
        let dir = populated();
        let pair = find_pair(dir.path(), "11").unwrap();
        assert_eq!(pair[0].file_name().unwrap(), "11-pthread");
        assert_eq!(pair[1].file_name().unwrap(), "11-uthread");
    }

    #[test]
    fn single_match_is_a_configuration_error() {
        let dir = populated();
        let err = find_pair(dir.path(), "21").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)), "got {err:?}");
    }

    #[test]
    fn too_many_matches_is_a_configuration_error() {
        let dir = populated();
        touch(dir.path(), "11-cthread");
        assert!(find_pair(dir.path(), "11").is_err());
    }

    #[test]
    fn tests_default_to_digit_prefixed_names() {
        let dir = populated();
        let tests = find_tests(dir.path(), &[]).unwrap();
        let names: Vec<_> = tests
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["11-pthread", "11-uthread", "21-switch"]);
    }

    #[test]
    fn tests_narrow_to_requested_identifiers() {
        let dir = populated();
        let tests = find_tests(dir.path(), &["21".to_string()]).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].file_name().unwrap(), "21-switch");
    }

    #[test]
    fn subdirectories_are_not_descended_into() {
        let dir = populated();
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "11-deep");
        let pair = find_pair(dir.path(), "11").unwrap();
        assert!(pair.iter().all(|p| p.parent() == Some(dir.path())));
    }
}

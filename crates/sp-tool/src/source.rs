use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{SpToolError, TestCase, TESTCASE_FILE_NAME, TESTCASE_SCHEMA_V1};

pub fn story_path(story_dir: &Path) -> Result<PathBuf, SpToolError> {
    let path = story_dir.join("story.json");
    if !path.is_file() {
        return Err(SpToolError::StoryMissing {
            path: story_dir.to_path_buf(),
        });
    }
    Ok(path)
}

pub fn read_story_source(story_dir: &Path) -> Result<String, SpToolError> {
    let path = story_path(story_dir)?;
    fs::read_to_string(&path).map_err(|source| SpToolError::ReadFile { path, source })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, SpToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| SpToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| SpToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(SpToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

/// Directories under `root` holding a `testcase.json`, sorted by path.
pub fn find_case_dirs(root: &Path) -> Result<Vec<PathBuf>, SpToolError> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|source| SpToolError::Scan {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE_NAME {
            if let Some(parent) = entry.path().parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    Ok(dirs)
}

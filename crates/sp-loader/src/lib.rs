//! Reads story documents from JSON.
//!
//! Embedded behavior (`compute`, `test`, choice effects) is Rhai source that
//! sees the story variables as the object map `vars`. Scripts are compiled
//! once at load time and wrapped into the story's function slots.

mod document;
mod names;
mod rhai_bridge;

use std::fs;
use std::path::Path;

pub use document::load_story_from_str;
use sp_core::{SceneplayError, Story};

pub const STORY_FILE_SUFFIX: &str = ".story.json";
pub const STORY_FILE_NAME: &str = "story.json";

/// `story.json` or any `*.story.json` file.
pub fn is_story_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == STORY_FILE_NAME || name.ends_with(STORY_FILE_SUFFIX))
}

pub fn load_story_from_path(path: &Path) -> Result<Story, SceneplayError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        SceneplayError::with_location(
            "LOADER_READ",
            error.to_string(),
            path.display().to_string(),
        )
    })?;
    load_story_from_str(&raw).map_err(|mut error| {
        let location = match error.location.take() {
            Some(location) => format!("{}: {}", path.display(), location),
            None => path.display().to_string(),
        };
        error.location = Some(location);
        error
    })
}

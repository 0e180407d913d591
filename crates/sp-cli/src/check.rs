use std::path::{Path, PathBuf};

use serde::Serialize;
use sp_core::SceneplayError;
use sp_lint::{has_errors, has_warnings, report, validate, Diagnostic};
use sp_loader::{is_story_file, load_story_from_path};
use walkdir::WalkDir;

use crate::{map_cli_json, map_cli_source_scan, CheckArgs};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoryReport {
    pub(crate) path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) load_error: Option<String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl StoryReport {
    pub(crate) fn has_errors(&self) -> bool {
        self.load_error.is_some() || has_errors(&self.diagnostics)
    }
}

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, SceneplayError> {
    let files = collect_story_files(Path::new(&args.path))?;
    let reports = files.iter().map(|path| check_file(path)).collect::<Vec<_>>();

    if args.json {
        let payload = serde_json::to_string_pretty(&reports).map_err(map_cli_json)?;
        println!("{}", payload);
    } else {
        for line in render_reports(&reports) {
            println!("{}", line);
        }
    }

    Ok(exit_code(&reports, args.deny_warnings))
}

pub(crate) fn collect_story_files(root: &Path) -> Result<Vec<PathBuf>, SceneplayError> {
    if !root.exists() {
        return Err(SceneplayError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("path does not exist: {}", root.display()),
        ));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(map_cli_source_scan)?;
        if entry.file_type().is_file() && is_story_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(SceneplayError::new(
            "CLI_SOURCE_EMPTY",
            format!("No story.json or *.story.json files under {}", root.display()),
        ));
    }
    Ok(files)
}

pub(crate) fn check_file(path: &Path) -> StoryReport {
    let display = path.display().to_string();
    match load_story_from_path(path) {
        Ok(story) => {
            let diagnostics = validate(&story);
            report(&diagnostics);
            StoryReport {
                path: display,
                load_error: None,
                diagnostics,
            }
        }
        Err(error) => StoryReport {
            path: display,
            load_error: Some(match &error.location {
                Some(location) => format!("{} (at {})", error, location),
                None => error.to_string(),
            }),
            diagnostics: Vec::new(),
        },
    }
}

pub(crate) fn render_reports(reports: &[StoryReport]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut errors = 0usize;
    let mut warnings = 0usize;
    for story in reports {
        lines.push(story.path.clone());
        if let Some(load_error) = &story.load_error {
            errors += 1;
            lines.push(format!("  error: {}", load_error));
        }
        for diagnostic in &story.diagnostics {
            if diagnostic.is_error() {
                errors += 1;
            } else {
                warnings += 1;
            }
            lines.push(format!("  {}", diagnostic));
        }
        if story.load_error.is_none() && story.diagnostics.is_empty() {
            lines.push("  ok".to_string());
        }
    }
    lines.push(format!(
        "checked {} file(s): {} error(s), {} warning(s)",
        reports.len(),
        errors,
        warnings
    ));
    lines
}

pub(crate) fn exit_code(reports: &[StoryReport], deny_warnings: bool) -> i32 {
    let failed = reports.iter().any(|story| {
        story.has_errors() || (deny_warnings && has_warnings(&story.diagnostics))
    });
    i32::from(failed)
}

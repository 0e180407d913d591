use sp_core::SceneplayError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> SceneplayError {
    SceneplayError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: SceneplayError) -> i32 {
    eprintln!("RESULT:ERROR");
    eprintln!("ERROR_CODE:{}", error.code);
    eprintln!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"\"".to_string())
    );
    if let Some(location) = &error.location {
        eprintln!("ERROR_LOCATION:{}", location);
    }
    1
}

pub(crate) fn map_cli_io(error: std::io::Error) -> SceneplayError {
    map_error("CLI_IO", error)
}

pub(crate) fn map_cli_source_scan(error: walkdir::Error) -> SceneplayError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_json(error: serde_json::Error) -> SceneplayError {
    map_error("CLI_JSON", error)
}

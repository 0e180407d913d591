use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct SceneplayError {
    pub code: String,
    pub message: String,
    pub location: Option<String>,
}

impl SceneplayError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: Some(location.into()),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarpeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Namespace '{segment}' does not exist (while resolving '{path}')")]
    MissingNamespace { path: String, segment: String },

    #[error("Cannot resolve '{path}': '{segment}' is not a namespace")]
    PathConflict { path: String, segment: String },

    #[error("No member named '{name}'")]
    UnknownMember { name: String },

    #[error("{type_name} has no getter named '{getter}'")]
    UnknownGetter { type_name: String, getter: String },

    #[error("There is no element associated with selector {selector}")]
    NoElement { selector: String },

    #[error("one template expected, got {found} for {selector}")]
    TemplateCount { selector: String, found: usize },

    #[error("template {selector} must produce one root node, got {found}")]
    TemplateContent { selector: String, found: usize },

    #[error("Cannot insert node: {message}")]
    HierarchyError { message: String },

    #[error("Invalid event binding '{binding}': {reason}")]
    InvalidEvent { binding: String, reason: String },

    #[error("Event '{binding}' refers to unknown handler '{handler}'")]
    UnknownHandler { binding: String, handler: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Argument,
    Resolution,
    View,
    Configuration,
}

impl CarpeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CarpeError::IoError(_) => ErrorCategory::Io,
            CarpeError::SerializationError(_) | CarpeError::InvalidArgument { .. } => {
                ErrorCategory::Argument
            }
            CarpeError::MissingNamespace { .. }
            | CarpeError::PathConflict { .. }
            | CarpeError::UnknownMember { .. }
            | CarpeError::UnknownGetter { .. } => ErrorCategory::Resolution,
            CarpeError::NoElement { .. }
            | CarpeError::TemplateCount { .. }
            | CarpeError::TemplateContent { .. }
            | CarpeError::HierarchyError { .. }
            | CarpeError::InvalidEvent { .. }
            | CarpeError::UnknownHandler { .. } => ErrorCategory::View,
            CarpeError::TomlError(_)
            | CarpeError::ConfigError { .. }
            | CarpeError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        CarpeError::InvalidArgument {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CarpeError>;

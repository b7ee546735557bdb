use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;

pub const HELP_TEXT: &str = "\
Tab / Shift-Tab   focus next / previous filter
+ / ]             next option of the focused filter
- / [             previous option of the focused filter
Backspace         unset the focused filter
r                 reset all filters
Up / Down (k/j)   move the row selection
PageUp / PageDown move by one page
Home / End        first / last row
c                 copy the selected device as csv
?                 toggle this help
q                 quit";

#[derive(Debug)]
pub enum HclError {
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    SchemaViolation {
        field: String,
        value: String,
        reason: String,
    },
    UnknownField(String),
    UnknownFilter(String),
}

impl HclError {
    pub fn schema(field: &str, value: &str, reason: impl Into<String>) -> Self {
        HclError::SchemaViolation {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HclError::IoError(e) => write!(f, "io error: {e}"),
            HclError::PolarsError(e) => write!(f, "failed to read device list: {e}"),
            HclError::JsonError(e) => write!(f, "failed to serialize device data: {e}"),
            HclError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            HclError::FileNotFound => write!(f, "file not found"),
            HclError::PermissionDenied => write!(f, "permission denied"),
            HclError::SchemaViolation {
                field,
                value,
                reason,
            } => write!(f, "invalid value \"{value}\" for field {field}: {reason}"),
            HclError::UnknownField(name) => write!(f, "unknown field {name}"),
            HclError::UnknownFilter(name) => write!(f, "unknown filter {name}"),
        }
    }
}

impl std::error::Error for HclError {}

impl From<Error> for HclError {
    fn from(err: Error) -> Self {
        HclError::IoError(err)
    }
}

impl From<PolarsError> for HclError {
    fn from(err: PolarsError) -> Self {
        HclError::PolarsError(err)
    }
}

impl From<serde_json::Error> for HclError {
    fn from(err: serde_json::Error) -> Self {
        HclError::JsonError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct ViewerConfig {
    pub event_poll_time: u64,
    pub log_file: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            log_file: PathBuf::from("hclview.log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    NextFilter,
    PreviousFilter,
    NextOption,
    PreviousOption,
    ClearFilter,
    ResetFilters,
    CopyRow,
    Resize(usize, usize),
}

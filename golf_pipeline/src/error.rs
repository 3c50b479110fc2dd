use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    Parse,
    Validation,
    IO,
}

impl PipelineErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Parse
            "E1001" => Self::Parse,

            // IO
            "E2001" | "E2002" | "E2101" | "E2102" | "E2103" | "E2104" => Self::IO,

            // Validation
            "E3001" | "E3002" | "E3003" | "E3004" | "E3005" | "E3006" | "E3007" => {
                Self::Validation
            }

            _ => Self::Validation,
        }
    }
}

/// Failure raised while loading records or writing the API tree.
///
/// `message` is the source of truth for humans; the structured fields let
/// callers point at the offending file or record without parsing it.
#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct PipelineError {
    pub code: &'static str,
    pub kind: PipelineErrorKind,
    pub message: String,

    pub path: Option<String>,
    pub record_id: Option<String>,
}

impl PipelineError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: PipelineErrorKind::from_code(code),
            message: message.into(),

            path: None,
            record_id: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }
}

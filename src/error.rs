use thiserror::Error;

use crate::domain::SourceKind;

/// Process-boundary error: a message plus the exit code `enso` should return.
///
/// Exit codes:
/// - `2`: usage, configuration, or local I/O problems
/// - `3`: a source was fetched but could not be parsed (or was empty)
/// - `4`: network or terminal failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the reconciliation pipeline.
///
/// None of these are recoverable at the pipeline layer; they abort the run and
/// surface at the process boundary as an [`AppError`].
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The endpoint was unreachable, timed out, or answered with a non-2xx status.
    #[error("failed to fetch {feed} source from {url}: {message}")]
    Fetch {
        feed: SourceKind,
        url: String,
        message: String,
    },

    /// The text did not match the fixed schema for that source.
    #[error("{feed} source, line {line}: {message}")]
    Parse {
        feed: SourceKind,
        line: usize,
        message: String,
    },

    #[error("{feed} source contained no observations")]
    Empty { feed: SourceKind },
}

impl PipelineError {
    pub fn parse(feed: SourceKind, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            feed,
            line,
            message: message.into(),
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = if err.is_fetch() { 4 } else { 3 };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_exit_codes() {
        let fetch = PipelineError::Fetch {
            feed: SourceKind::Archive,
            url: "https://example.invalid/a".to_string(),
            message: "timed out".to_string(),
        };
        let app: AppError = fetch.into();
        assert_eq!(app.exit_code(), 4);
        assert!(app.to_string().contains("archive"));

        let parse = PipelineError::parse(SourceKind::Operational, 7, "bad token");
        let app: AppError = parse.into();
        assert_eq!(app.exit_code(), 3);
        assert_eq!(app.to_string(), "operational source, line 7: bad token");

        let app: AppError = PipelineError::Empty { feed: SourceKind::Archive }.into();
        assert_eq!(app.exit_code(), 3);
    }
}

//! Domain error types.

/// Top-level error type for longtrader.
#[derive(Debug, thiserror::Error)]
pub enum LongtraderError {
    #[error("missing input: {what}")]
    MissingInput { what: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("average requested on an empty position ledger")]
    EmptyLedger,

    #[error("no bars in {path}")]
    NoData { path: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LongtraderError> for std::process::ExitCode {
    fn from(err: &LongtraderError) -> Self {
        let code: u8 = match err {
            LongtraderError::Io(_) | LongtraderError::Report { .. } => 1,
            LongtraderError::ConfigParse { .. }
            | LongtraderError::ConfigMissing { .. }
            | LongtraderError::ConfigInvalid { .. } => 2,
            LongtraderError::MissingInput { .. } | LongtraderError::InvalidInput { .. } => 3,
            LongtraderError::NoData { .. } | LongtraderError::InsufficientData { .. } => 5,
            LongtraderError::EmptyLedger => 6,
        };
        std::process::ExitCode::from(code)
    }
}

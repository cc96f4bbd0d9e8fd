//! Domain error types.

/// Coarse classification of [`AutoquantError`] for callers that only need to
/// tell bad input from missing data from a degenerate computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DataUnavailable,
    InvalidParameter,
    DegenerateSequence,
    Config,
    Io,
}

/// Top-level error type for autoquant.
#[derive(Debug, thiserror::Error)]
pub enum AutoquantError {
    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("degenerate sequence: {reason}")]
    DegenerateSequence { reason: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AutoquantError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AutoquantError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        AutoquantError::DegenerateSequence {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AutoquantError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            AutoquantError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            AutoquantError::DegenerateSequence { .. } => ErrorKind::DegenerateSequence,
            AutoquantError::ConfigParse { .. }
            | AutoquantError::ConfigMissing { .. }
            | AutoquantError::ConfigInvalid { .. } => ErrorKind::Config,
            AutoquantError::Report { .. } | AutoquantError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Io => 1,
            ErrorKind::Config => 2,
            ErrorKind::InvalidParameter => 4,
            ErrorKind::DataUnavailable => 5,
            ErrorKind::DegenerateSequence => 6,
        }
    }
}

impl From<&AutoquantError> for std::process::ExitCode {
    fn from(err: &AutoquantError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = AutoquantError::DataUnavailable {
            symbol: "AAPL".into(),
            reason: "empty range".into(),
        };
        assert_eq!(err.to_string(), "no data for AAPL: empty range");

        let err = AutoquantError::invalid_parameter("window", "must be at least 1");
        assert_eq!(err.to_string(), "invalid parameter window: must be at least 1");
    }

    #[test]
    fn kind_classification() {
        assert_eq!(
            AutoquantError::degenerate("one bar").kind(),
            ErrorKind::DegenerateSequence
        );
        assert_eq!(
            AutoquantError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            }
            .kind(),
            ErrorKind::Config
        );
        let io = AutoquantError::from(std::io::Error::other("disk"));
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn exit_codes_distinguish_kinds() {
        let bad = AutoquantError::invalid_parameter("x", "y");
        let none = AutoquantError::DataUnavailable {
            symbol: "X".into(),
            reason: "r".into(),
        };
        assert_eq!(bad.exit_code(), 4);
        assert_eq!(none.exit_code(), 5);
        assert_eq!(AutoquantError::degenerate("flat").exit_code(), 6);
    }
}

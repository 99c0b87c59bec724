//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("domain error: {reason}")]
    Domain { reason: String },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data in {path}")]
    NoData { path: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesimError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        TradesimError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        TradesimError::Domain {
            reason: reason.into(),
        }
    }
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        let code: u8 = match err {
            TradesimError::Io(_) | TradesimError::Report { .. } => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Data { .. } => 3,
            TradesimError::Validation { .. } | TradesimError::Domain { .. } => 4,
            TradesimError::NoData { .. } | TradesimError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_field() {
        let err = TradesimError::validation("price", "must be positive");
        assert_eq!(err.to_string(), "invalid price: must be positive");
    }

    #[test]
    fn domain_message() {
        let err = TradesimError::domain("zero variance");
        assert_eq!(err.to_string(), "domain error: zero variance");
    }

    #[test]
    fn exit_codes_by_family() {
        use std::process::ExitCode;

        let cases = [
            (TradesimError::Report { reason: "x".into() }, ExitCode::from(1)),
            (
                TradesimError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                },
                ExitCode::from(2),
            ),
            (TradesimError::Data { reason: "x".into() }, ExitCode::from(3)),
            (TradesimError::domain("x"), ExitCode::from(4)),
            (
                TradesimError::InsufficientData {
                    bars: 1,
                    minimum: 2,
                },
                ExitCode::from(5),
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ExitCode::from(&err), expected);
        }
    }
}

use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InputReadFailed,
    MalformedInput,
    ShapeMismatch,
    ProcessOutOfRange,
    ArithmeticOverflow,
    InvalidSequence,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InputReadFailed => "E1002",
            Self::MalformedInput => "E2001",
            Self::ShapeMismatch => "E2002",
            Self::ProcessOutOfRange => "E2003",
            Self::ArithmeticOverflow => "E2004",
            Self::InvalidSequence => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InputReadFailed => "Input could not be read",
            Self::MalformedInput => "Malformed input",
            Self::ShapeMismatch => "Vector/matrix lengths do not line up",
            Self::ProcessOutOfRange => "Requesting process index out of range",
            Self::ArithmeticOverflow => "Resource count overflow",
            Self::InvalidSequence => "Completion sequence does not replay",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some(
                "Fix syntax in .contend/config.toml or the user config (<config dir>/contend/config.toml) and retry.",
            ),
            Self::InputReadFailed => Some("Check the --file path, or pipe the JSON body on stdin."),
            Self::MalformedInput => {
                Some("Send a JSON object; all resource counts must be non-negative integers.")
            }
            Self::ShapeMismatch => Some(
                "available, request and every max/allocation row need one entry per resource type.",
            ),
            Self::ProcessOutOfRange => Some("Use a zero-based process index below the row count."),
            Self::ArithmeticOverflow => Some("Resource counts must fit in 64 bits after the grant."),
            Self::InvalidSequence => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Malformed-input failures raised before any analysis runs.
///
/// Denied requests and deadlocks are verdicts, not errors; this type only
/// covers inputs the analyzers refuse to compute on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// A resource vector does not have one entry per resource type.
    #[error("{field} has {actual} entries but there are {expected} resource types")]
    ResourceCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// `max` and `allocation` disagree on the number of processes.
    #[error("max has {max_rows} rows but allocation has {allocation_rows}")]
    ProcessCountMismatch {
        max_rows: usize,
        allocation_rows: usize,
    },

    /// One matrix row has the wrong number of resource entries.
    #[error("{matrix} row {process} has {actual} entries but there are {expected} resource types")]
    RowLengthMismatch {
        matrix: &'static str,
        process: usize,
        expected: usize,
        actual: usize,
    },

    /// The requesting process index does not name a row.
    #[error("process index {process} is out of range for {processes} processes")]
    ProcessOutOfRange { process: usize, processes: usize },

    /// Granting the request would overflow a resource count.
    #[error("granting resource {resource} to process {process} overflows the allocation")]
    Overflow { process: usize, resource: usize },

    /// The input could not be decoded at all (non-numeric values, wrong types).
    #[error("malformed input: {0}")]
    Malformed(String),
}

impl AnalysisError {
    /// Stable machine code for this failure.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ResourceCountMismatch { .. }
            | Self::ProcessCountMismatch { .. }
            | Self::RowLengthMismatch { .. } => ErrorCode::ShapeMismatch,
            Self::ProcessOutOfRange { .. } => ErrorCode::ProcessOutOfRange,
            Self::Overflow { .. } => ErrorCode::ArithmeticOverflow,
            Self::Malformed(_) => ErrorCode::MalformedInput,
        }
    }

    /// Remediation text, falling back to the generic message.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or(code.message()).to_string()
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InputReadFailed,
            ErrorCode::MalformedInput,
            ErrorCode::ShapeMismatch,
            ErrorCode::ProcessOutOfRange,
            ErrorCode::ArithmeticOverflow,
            ErrorCode::InvalidSequence,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::ShapeMismatch.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn config_hint_names_both_config_files() {
        let hint = ErrorCode::ConfigParseError.hint().expect("hint");
        assert!(hint.contains(".contend/config.toml"));
        assert!(hint.contains("contend/config.toml)"));
        assert!(hint.contains("user config"));
    }

    #[test]
    fn shape_errors_share_a_code() {
        let row = AnalysisError::RowLengthMismatch {
            matrix: "max",
            process: 2,
            expected: 3,
            actual: 2,
        };
        let count = AnalysisError::ProcessCountMismatch {
            max_rows: 3,
            allocation_rows: 2,
        };
        assert_eq!(row.error_code(), ErrorCode::ShapeMismatch);
        assert_eq!(count.error_code(), ErrorCode::ShapeMismatch);
        assert_eq!(row.to_string(), "max row 2 has 2 entries but there are 3 resource types");
    }

    #[test]
    fn decode_errors_become_malformed() {
        let err: AnalysisError = serde_json::from_str::<Vec<u64>>("[1, \"two\"]")
            .expect_err("non-numeric entry must fail")
            .into();
        assert_eq!(err.error_code(), ErrorCode::MalformedInput);
        assert!(err.to_string().starts_with("malformed input:"));
    }
}

//! Scene parse errors

use thiserror::Error;

use crate::format::SyntaxError;

/// Reasons a scene could not be parsed or built
///
/// `record` is the 0-based position of the offending top-level record in the
/// source document (or of the node, for trees assembled with the builder,
/// whose errors report line 0).
/// No partial tree is ever returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Structural mismatch: unbalanced braces, a scalar where a block belongs,
    /// a missing or repeated field, or a misplaced root record
    #[error("record {record}, line {line}: malformed block: {reason}")]
    MalformedBlock {
        /// Record index
        record: usize,
        /// Source line
        line: usize,
        /// What went wrong
        reason: String,
    },

    /// Position, rotation or scale that is not finite, or a rotation that is
    /// not a unit quaternion
    #[error("record {record}, field `{field}`: invalid transform: {reason}")]
    InvalidTransform {
        /// Record index
        record: usize,
        /// Offending field, e.g. `rotation` or `position.x`
        field: String,
        /// What went wrong
        reason: String,
    },

    /// Two nodes share an id
    #[error("record {record}: duplicate id \"{id}\"")]
    DuplicateId {
        /// Record index of the second occurrence
        record: usize,
        /// The repeated id
        id: String,
    },

    /// Field or record name this crate does not know, while strict mode is on
    #[error("record {record}, line {line}: unknown field `{field}`")]
    UnknownFieldInStrictMode {
        /// Record index
        record: usize,
        /// Source line
        line: usize,
        /// Field path, e.g. `scale3` or `data.size_mode`
        field: String,
    },
}

impl ParseError {
    /// Record index the error refers to
    pub fn record(&self) -> usize {
        match self {
            Self::MalformedBlock { record, .. }
            | Self::InvalidTransform { record, .. }
            | Self::DuplicateId { record, .. }
            | Self::UnknownFieldInStrictMode { record, .. } => *record,
        }
    }
}

impl From<SyntaxError> for ParseError {
    fn from(e: SyntaxError) -> Self {
        Self::MalformedBlock {
            record: e.record,
            line: e.line,
            reason: e.reason,
        }
    }
}

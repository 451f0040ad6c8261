use thiserror::Error;

/// Classification of a [`TypeError`], stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotImplemented,
    CannotParseText,
    CannotReadAllData,
    TypeMismatch,
    IllegalColumn,
    TooLargeSize,
    ArgumentOutOfBound,
    UnknownType,
    NotEnoughStreams,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotImplemented => write!(f, "NOT_IMPLEMENTED"),
            Self::CannotParseText => write!(f, "CANNOT_PARSE_TEXT"),
            Self::CannotReadAllData => write!(f, "CANNOT_READ_ALL_DATA"),
            Self::TypeMismatch => write!(f, "TYPE_MISMATCH"),
            Self::IllegalColumn => write!(f, "ILLEGAL_COLUMN"),
            Self::TooLargeSize => write!(f, "TOO_LARGE_SIZE"),
            Self::ArgumentOutOfBound => write!(f, "ARGUMENT_OUT_OF_BOUND"),
            Self::UnknownType => write!(f, "UNKNOWN_TYPE"),
            Self::NotEnoughStreams => write!(f, "NOT_ENOUGH_STREAMS"),
        }
    }
}

/// The one error raised by type descriptors and their codecs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("{method} is not implemented for data type {type_name}")]
    NotImplemented {
        method: &'static str,
        type_name: String,
    },
    #[error("cannot parse {type_name}: {reason}")]
    CannotParse { type_name: String, reason: String },
    #[error("cannot read all data: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },
    #[error("cannot read all data: expected {expected} values of {type_name} but got {got}")]
    ShortRead {
        type_name: String,
        expected: usize,
        got: usize,
    },
    #[error(transparent)]
    BadLeb128(#[from] Leb128Error),
    #[error("invalid json: {0}")]
    Json(String),
    #[error("invalid type of value, expected `{expected}` but received `{received}`")]
    TypeMismatch { expected: String, received: String },
    #[error("illegal column {column} for data type {type_name}")]
    IllegalColumn {
        column: &'static str,
        type_name: String,
    },
    #[error("attempted to allocate {attempted} which is larger than the maximum of {maximum}")]
    OverlargeAllocation { attempted: u64, maximum: u64 },
    #[error("offset {offset} is out of bounds for column of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("FixedString needs a size of at least one byte")]
    EmptyFixedString,
    #[error("unknown data type `{0}`")]
    UnknownType(String),
    #[error("data type {type_name} needs {expected} streams but {got} were supplied")]
    NotEnoughStreams {
        type_name: String,
        expected: usize,
        got: usize,
    },
}

impl TypeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotImplemented { .. } => ErrorCode::NotImplemented,
            Self::CannotParse { .. } | Self::Json(_) => ErrorCode::CannotParseText,
            Self::UnexpectedEof { .. } | Self::ShortRead { .. } | Self::BadLeb128(_) => {
                ErrorCode::CannotReadAllData
            }
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::IllegalColumn { .. } => ErrorCode::IllegalColumn,
            Self::OverlargeAllocation { .. } => ErrorCode::TooLargeSize,
            Self::OffsetOutOfBounds { .. } | Self::EmptyFixedString => {
                ErrorCode::ArgumentOutOfBound
            }
            Self::UnknownType(_) => ErrorCode::UnknownType,
            Self::NotEnoughStreams { .. } => ErrorCode::NotEnoughStreams,
        }
    }

    pub(crate) fn not_implemented<S: AsRef<str>>(method: &'static str, type_name: S) -> Self {
        Self::NotImplemented {
            method,
            type_name: type_name.as_ref().to_string(),
        }
    }

    pub(crate) fn cannot_parse<S: AsRef<str>, R: AsRef<str>>(type_name: S, reason: R) -> Self {
        Self::CannotParse {
            type_name: type_name.as_ref().to_string(),
            reason: reason.as_ref().to_string(),
        }
    }

    pub(crate) fn type_mismatch<S: AsRef<str>, R: AsRef<str>>(expected: S, received: R) -> Self {
        Self::TypeMismatch {
            expected: expected.as_ref().to_string(),
            received: received.as_ref().to_string(),
        }
    }

    pub(crate) fn illegal_column<S: AsRef<str>>(column: &'static str, type_name: S) -> Self {
        Self::IllegalColumn {
            column,
            type_name: type_name.as_ref().to_string(),
        }
    }
}

impl From<serde_json::Error> for TypeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Leb128Error {
    #[error("leb128 was too large for the destination type")]
    Leb128TooLarge,
    #[error("leb128 was improperly encoded")]
    Leb128Overlong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_errors_share_a_code() {
        let eof = TypeError::UnexpectedEof {
            needed: 8,
            available: 3,
        };
        let leb = TypeError::from(Leb128Error::Leb128TooLarge);
        assert_eq!(eof.code(), ErrorCode::CannotReadAllData);
        assert_eq!(leb.code(), ErrorCode::CannotReadAllData);
    }

    #[test]
    fn message_names_the_type() {
        let err = TypeError::not_implemented("size_of_field", "String");
        assert_eq!(
            err.to_string(),
            "size_of_field is not implemented for data type String"
        );
        assert_eq!(err.code().to_string(), "NOT_IMPLEMENTED");
    }
}

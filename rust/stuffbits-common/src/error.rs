use thiserror::Error;

/// Error returned by the packed-storage structures.
///
/// The kinds fall into two groups. Precondition violations
/// ([`ErrorKind::OutOfBounds`], [`ErrorKind::PreconditionViolation`],
/// [`ErrorKind::InvalidArgument`]) mean the caller misused the object; the
/// object must not be used further after one is returned. The remaining kinds
/// ([`ErrorKind::MalformedStream`], [`ErrorKind::Io`]) describe bad input or a
/// failing environment.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` when the error reports a caller bug rather than a
    /// recoverable condition.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::OutOfBounds { .. }
                | ErrorKind::PreconditionViolation { .. }
                | ErrorKind::InvalidArgument { .. }
        )
    }

    pub fn out_of_bounds(element: impl Into<String>, index: u64, limit: u64) -> Error {
        Error(
            ErrorKind::OutOfBounds {
                element: element.into(),
                index,
                limit,
            }
            .into(),
        )
    }

    pub fn precondition(operation: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::PreconditionViolation {
                operation: operation.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn malformed_stream(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::MalformedStream {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{element}: index {index} out of bounds (limit {limit})")]
    OutOfBounds {
        element: String,
        index: u64,
        limit: u64,
    },

    #[error("precondition violated in {operation}: {message}")]
    PreconditionViolation { operation: String, message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("malformed stream data for '{element}': {message}")]
    MalformedStream { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

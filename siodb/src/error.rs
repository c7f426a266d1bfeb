//! `siodb` error types.
use std::{backtrace::Backtrace, fmt, io};

use crate::{
    auth::{AuthError, KeyError},
    command::ServerError,
    connection::ParseError,
    protocol::ProtocolError,
    row::{DecodeError, RowNotFound},
};

/// A specialized [`Result`] type for `siodb` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible error from `siodb` library.
pub struct Error {
    context: String,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Prefix the error message with `context`.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Returns `true` if the connection that produced this error can no longer be used.
    ///
    /// Io and protocol errors leave the stream at an unknown position. An authentication
    /// error ends the handshake, so there is no connection to reuse either.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Io(_) | ErrorKind::Protocol(_) | ErrorKind::Auth(_)
        )
    }
}

/// All possible error kind from `siodb` library.
pub enum ErrorKind {
    Config(ParseError),
    Key(KeyError),
    Protocol(ProtocolError),
    Io(io::Error),
    Auth(AuthError),
    Database(ServerError),
    RowNotFound(RowNotFound),
    Decode(DecodeError),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { context: String::new(), backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ParseError>e => ErrorKind::Config(e));
from!(<KeyError>e => ErrorKind::Key(e));
from!(<ProtocolError>e => ErrorKind::Protocol(e));
from!(<std::io::Error>e => ErrorKind::Io(e));
from!(<AuthError>e => ErrorKind::Auth(e));
from!(<ServerError>e => ErrorKind::Database(e));
from!(<RowNotFound>e => ErrorKind::RowNotFound(e));
from!(<DecodeError>e => ErrorKind::Decode(e));

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            ErrorKind::Protocol(e) => e.source(),
            ErrorKind::Key(e) => e.source(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }

        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl std::error::Error for ErrorKind { }

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => e.fmt(f),
            Self::Key(e) => e.fmt(f),
            Self::Protocol(e) => e.fmt(f),
            Self::Io(e) => e.fmt(f),
            Self::Auth(e) => e.fmt(f),
            Self::Database(e) => e.fmt(f),
            Self::RowNotFound(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fatal_classification() {
        let io: Error = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(io.is_fatal());

        let protocol: Error = ProtocolError::MalformedVarint.into();
        assert!(protocol.is_fatal());

        let not_found: Error = RowNotFound.into();
        assert!(!not_found.is_fatal());
    }

    #[test]
    fn context_prefix() {
        let err = Error::from(ProtocolError::Poisoned).context("query");
        assert!(err.to_string().starts_with("query: Connection is unusable"));
    }
}

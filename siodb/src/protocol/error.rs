//! Protocol error
use std::fmt;

use super::message::message_name;

/// An error when the byte stream does not follow the protocol.
///
/// Protocol errors leave the stream at an unknown position, the connection
/// is unusable afterwards.
pub enum ProtocolError {
    /// Received message type id is not the one expected.
    UnexpectedMessage {
        expect: u64,
        found: u64,
    },
    /// Varint longer than 10 bytes or overflowing 64 bits.
    MalformedVarint,
    /// Message payload cannot be deserialized.
    MalformedPayload {
        type_id: u64,
        source: prost::DecodeError,
    },
    /// Response correlation id is not the one of the request.
    RequestIdMismatch {
        expect: u64,
        found: u64,
    },
    /// Connection previously observed a fatal error.
    Poisoned,
}

impl ProtocolError {
    pub(crate) fn unexpected(expect: u64, found: u64) -> ProtocolError {
        Self::UnexpectedMessage { expect, found }
    }

    pub(crate) fn malformed(type_id: u64, source: prost::DecodeError) -> ProtocolError {
        Self::MalformedPayload { type_id, source }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedPayload { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedMessage { expect, found } => write!(
                f,
                "Expected message `{}` found `{}` (type id {found})",
                message_name(*expect),
                message_name(*found),
            ),
            Self::MalformedVarint => f.write_str("Malformed varint in stream"),
            Self::MalformedPayload { type_id, source } => write!(
                f,
                "Malformed `{}` payload: {source}",
                message_name(*type_id),
            ),
            Self::RequestIdMismatch { expect, found } => write!(
                f,
                "Wrong request id in the server response, expected {expect} found {found}"
            ),
            Self::Poisoned => f.write_str("Connection is unusable after a previous fatal error"),
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

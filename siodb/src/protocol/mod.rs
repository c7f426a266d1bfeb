//! Siodb Client Protocol
//!
//! ## Messaging Overview
//!
//! All communication is through a stream of messages. A message starts with a varint type id,
//! followed by a varint payload length, followed by the payload itself. The payload is a
//! protobuf encoded structure which type is determined by the type id.
//!
//! ```text
//! ┏━━━━━━━━┳━━━━━━━━┳━━━━━━━━━┓
//! ┃ TypeId ┃ Length ┃ Payload ┃
//! ┣━━━━━━━━╋━━━━━━━━╋━━━━━━━━━┫
//! ┃ varint ┃ varint ┃   [u8]  ┃
//! ┣━━━━━━━━╋━━━━━━━━╋━━━━━━━━━┫
//! ┃   01   ┃   0c   ┃   ..    ┃
//! ┗━━━━━━━━┻━━━━━━━━┻━━━━━━━━━┛
//! ```
//!
//! Type ids sent by the client and by the server are disjoint:
//!
//! | direction | message | type id |
//! |-----------|---------|---------|
//! | client | [`Command`] | 1 |
//! | server | [`ServerResponse`] | 2 |
//! | client | [`BeginSessionRequest`] | 5 |
//! | server | [`BeginSessionResponse`] | 6 |
//! | client | [`ClientAuthenticationRequest`] | 7 |
//! | server | [`ClientAuthenticationResponse`] | 8 |
//!
//! ## Row Data
//!
//! When a [`ServerResponse`] carries column descriptions, it is followed by row frames which
//! are *not* message envelopes:
//!
//! ```text
//! ┏━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━┓
//! ┃ RowLength ┃ Null Bitmask (if any)    ┃ Non null fields  ┃
//! ┣━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━┫
//! ┃  varint   ┃ ceil(columns / 8) bytes  ┃ column order     ┃
//! ┗━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━┛
//! ```
//!
//! A `RowLength` of zero terminates the result set.

pub mod varint;
pub mod framing;
pub mod message;

mod error;

pub use framing::{ClientMessage, ServerMessage};
pub use message::{
    AttributeDescription, BeginSessionRequest, BeginSessionResponse, ClientAuthenticationRequest,
    ClientAuthenticationResponse, ColumnDescription, ColumnType, Command, ServerResponse,
    StatusMessage,
};
pub use error::ProtocolError;

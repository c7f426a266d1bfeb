//! Message envelope framing.
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};

use super::{ProtocolError, varint};
use crate::{Result, common::verbose, ext::LenExt};

/// Initial capacity when reading a frame of a given length, larger frames grow
/// as bytes actually arrive.
const READ_CHUNK: usize = 8 * 1024;

/// A message that is sent by the client.
pub trait ClientMessage: prost::Message {
    /// Protocol wide message type id.
    const TYPE_ID: u64;
}

/// A message that is sent by the server.
pub trait ServerMessage: prost::Message + Default {
    /// Protocol wide message type id.
    const TYPE_ID: u64;
}

/// Write a message envelope into `buf`.
///
/// `[type-id: varint][payload-length: varint][payload]`
pub fn encode<M: prost::Message>(type_id: u64, message: &M, buf: &mut BytesMut) {
    let len = message.encoded_len();
    buf.reserve(varint::encoded_len(type_id) + varint::encoded_len(len as u64) + len);
    varint::encode(type_id, buf);
    varint::encode(len as u64, buf);
    message.encode_raw(buf);
}

/// Send a message to the server.
///
/// The whole envelope is assembled in `buf` first, then written and flushed.
pub fn send_message<W, M>(writer: &mut W, buf: &mut BytesMut, message: &M) -> Result<()>
where
    W: Write + ?Sized,
    M: ClientMessage,
{
    buf.clear();
    encode(M::TYPE_ID, message, buf);
    verbose!(type_id = M::TYPE_ID, len = buf.len(), "send message");
    writer.write_all(buf)?;
    writer.flush()?;
    Ok(())
}

/// Read exactly `len` bytes.
///
/// Stream closing before `len` bytes are read is an error.
pub fn read_exact<R: Read + ?Sized>(reader: &mut R, len: u64) -> Result<Bytes> {
    let mut buf = Vec::with_capacity(len.to_len().min(READ_CHUNK));
    let read = reader.take(len).read_to_end(&mut buf)?;
    if (read as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream closed after {read} of {len} bytes"),
        ).into());
    }
    Ok(Bytes::from(buf))
}

/// Read a varint which must be present, end of stream is an error.
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    match varint::read(reader)? {
        Some(value) => Ok(value),
        None => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed by server",
        ).into()),
    }
}

/// Read a message envelope payload, checking its type id.
///
/// On type id mismatch nothing past the type id is read, and the stream
/// should be considered desynchronized.
pub fn recv_frame<R: Read + ?Sized>(reader: &mut R, expect: u64) -> Result<Bytes> {
    let type_id = read_varint(reader)?;
    if type_id != expect {
        return Err(ProtocolError::unexpected(expect, type_id).into());
    }

    let len = read_varint(reader)?;
    verbose!(type_id, len, "recv message");
    read_exact(reader, len)
}

/// Receive a message, deserializing the payload with `deserialize`.
pub fn recv_message_with<R, T, F>(reader: &mut R, expect: u64, deserialize: F) -> Result<T>
where
    R: Read + ?Sized,
    F: FnOnce(Bytes) -> Result<T, prost::DecodeError>,
{
    let payload = recv_frame(reader, expect)?;
    deserialize(payload).map_err(|err| ProtocolError::malformed(expect, err).into())
}

/// Receive a message from the server.
pub fn recv_message<R, M>(reader: &mut R) -> Result<M>
where
    R: Read + ?Sized,
    M: ServerMessage,
{
    recv_message_with(reader, M::TYPE_ID, M::decode)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ErrorKind,
        protocol::{BeginSessionResponse, Command, ServerResponse, StatusMessage},
    };

    #[test]
    fn envelope_layout() {
        let command = Command { request_id: 1, text: "select 1".into() };
        let mut wire: Vec<u8> = vec![];
        send_message(&mut wire, &mut BytesMut::new(), &command).unwrap();

        let payload = prost::Message::encode_to_vec(&command);
        assert_eq!(wire[0], 1);
        assert_eq!(wire[1] as usize, payload.len());
        assert_eq!(&wire[2..], &payload[..]);
    }

    #[test]
    fn receive_expected_message() {
        let response = ServerResponse {
            request_id: 7,
            message: vec![StatusMessage { status_code: 3, text: "warn".into() }],
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        encode(ServerResponse::TYPE_ID, &response, &mut buf);
        buf.extend_from_slice(b"next");

        let mut reader = &buf[..];
        let decoded: ServerResponse = recv_message(&mut reader).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(reader, b"next");
    }

    #[test]
    fn type_id_mismatch_skips_deserializer() {
        let mut buf = BytesMut::new();
        encode(BeginSessionResponse::TYPE_ID, &BeginSessionResponse::default(), &mut buf);

        let mut called = false;
        let result = recv_message_with(&mut &buf[..], ServerResponse::TYPE_ID, |_| {
            called = true;
            Ok(())
        });

        assert!(!called);
        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Protocol(ProtocolError::UnexpectedMessage { expect: 2, found: 6 })
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn short_payload() {
        // type id 2, length 5, only 2 bytes
        let mut reader: &[u8] = &[2, 5, 0, 0];
        let err = recv_frame(&mut reader, 2).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn malformed_payload() {
        // field 1 as length delimited with a length past the end
        let mut reader: &[u8] = &[2, 2, 0x0a, 0x05];
        let err = recv_message::<_, ServerResponse>(&mut reader).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Protocol(ProtocolError::MalformedPayload { .. })));
    }
}

#![allow(dead_code)]
use bytes::{BufMut, Bytes, BytesMut};
use std::io::{self, Cursor, Read, Write};

use siodb::{
    Connection, PrivateKey,
    codec::RawTimestamp,
    protocol::{
        BeginSessionResponse, ClientAuthenticationResponse, ColumnDescription, ColumnType,
        ServerMessage, ServerResponse, StatusMessage, framing, varint,
    },
};

pub const CHALLENGE: &[u8] = b"siodb challenge 0123456789abcdef";

pub fn key() -> PrivateKey {
    PrivateKey::from_pem(include_bytes!("../fixtures/id_rsa.pem"), None).unwrap()
}

/// In memory stream replaying scripted server bytes and capturing client bytes.
#[derive(Debug, Default)]
pub struct MockStream {
    pub input: Cursor<Vec<u8>>,
    pub output: Vec<u8>,
}

impl MockStream {
    pub fn new(script: Script) -> Self {
        Self { input: Cursor::new(script.buf.to_vec()), output: vec![] }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builder of the bytes a server would send.
#[derive(Debug, Default)]
pub struct Script {
    pub buf: BytesMut,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message<M: ServerMessage>(mut self, message: &M) -> Self {
        framing::encode(M::TYPE_ID, message, &mut self.buf);
        self
    }

    pub fn handshake(self, session_id: &str) -> Self {
        self.message(&BeginSessionResponse {
            session_started: true,
            message: None,
            challenge: CHALLENGE.to_vec(),
        })
        .message(&ClientAuthenticationResponse {
            authenticated: true,
            message: None,
            session_id: session_id.into(),
        })
    }

    pub fn response(self, request_id: u64, columns: &[(&str, ColumnType, bool)]) -> Self {
        self.message(&ServerResponse {
            request_id,
            column_description: describe(columns),
            ..Default::default()
        })
    }

    pub fn affected(self, request_id: u64, count: u64) -> Self {
        self.message(&ServerResponse {
            request_id,
            has_affected_row_count: true,
            affected_row_count: count,
            ..Default::default()
        })
    }

    pub fn error(self, request_id: u64, columns: &[(&str, ColumnType, bool)], code: i32, text: &str) -> Self {
        self.message(&ServerResponse {
            request_id,
            message: vec![StatusMessage { status_code: code, text: text.into() }],
            column_description: describe(columns),
            ..Default::default()
        })
    }

    /// Append a row frame with the given payload.
    pub fn row(mut self, payload: &[u8]) -> Self {
        varint::encode(payload.len() as u64, &mut self.buf);
        self.buf.put_slice(payload);
        self
    }

    /// Append raw bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Append the end of result set marker.
    pub fn end(mut self) -> Self {
        self.buf.put_u8(0);
        self
    }
}

fn describe(columns: &[(&str, ColumnType, bool)]) -> Vec<ColumnDescription> {
    columns
        .iter()
        .map(|&(name, ty, is_null)| ColumnDescription {
            name: name.into(),
            r#type: ty as i32,
            is_null,
            attribute: vec![],
        })
        .collect()
}

/// Builder of a row payload.
#[derive(Debug, Default)]
pub struct RowPayload {
    pub buf: BytesMut,
}

impl RowPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn var(mut self, value: u64) -> Self {
        varint::encode(value, &mut self.buf);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        varint::encode(text.len() as u64, &mut self.buf);
        self.buf.put_slice(text.as_bytes());
        self
    }

    pub fn timestamp(mut self, ts: &RawTimestamp) -> Self {
        ts.encode(&mut self.buf);
        self
    }

    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Authenticated connection over a mock stream, with the handshake prepended to `script`.
pub fn connect(script: Script) -> Connection<MockStream> {
    let mut full = Script::new().handshake("session-1");
    full.buf.extend_from_slice(&script.buf);
    Connection::handshake(MockStream::new(full), "root", &key()).unwrap()
}

/// Decode every message the client sent, as `(type_id, payload)`.
pub fn sent_frames(output: &[u8]) -> Vec<(u64, Bytes)> {
    let mut buf = Bytes::copy_from_slice(output);
    let mut frames = vec![];
    while !buf.is_empty() {
        let type_id = varint::decode(&mut buf).unwrap().unwrap();
        let len = varint::decode(&mut buf).unwrap().unwrap() as usize;
        frames.push((type_id, buf.split_to(len)));
    }
    frames
}

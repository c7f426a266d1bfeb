//! Unsigned base-128 variable length integer.
//!
//! Each byte carries 7 bits of the value, least significant group first, the most significant
//! bit of a byte is set when more bytes follow. A 64-bit value takes at most 10 bytes.
use bytes::{Buf, BufMut};
use std::io::{self, Read};

use super::ProtocolError;
use crate::Result;

/// Maximum encoded length of a 64-bit value.
pub const MAX_LEN: usize = 10;

/// Accumulate varint bytes one by one.
#[derive(Debug, Default)]
struct Accumulator {
    value: u64,
    len: usize,
}

impl Accumulator {
    /// Returns `Some` once the last byte of the varint is pushed.
    fn push(&mut self, byte: u8) -> Result<Option<u64>, ProtocolError> {
        if self.len == MAX_LEN {
            return Err(ProtocolError::MalformedVarint);
        }
        // the 10th byte only have room for the last bit of a u64
        if self.len == MAX_LEN - 1 && byte > 1 {
            return Err(ProtocolError::MalformedVarint);
        }

        self.value |= u64::from(byte & 0x7f) << (7 * self.len);
        self.len += 1;

        match byte & 0x80 {
            0 => Ok(Some(self.value)),
            _ => Ok(None),
        }
    }
}

/// Returns the number of bytes `value` takes when encoded.
pub const fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Encode `value` into `buf`.
pub fn encode(mut value: u64, buf: &mut impl BufMut) {
    while value >= 0x80 {
        buf.put_u8(value as u8 | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Decode a varint from an in memory buffer.
///
/// Returns `Ok(None)` if the buffer is exhausted before the varint completes.
pub fn decode(buf: &mut impl Buf) -> Result<Option<u64>, ProtocolError> {
    let mut acc = Accumulator::default();
    while buf.has_remaining() {
        if let Some(value) = acc.push(buf.get_u8())? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Read a varint from `reader`, one byte at a time so nothing past the varint is consumed.
///
/// Returns `Ok(None)` if the stream ends before any byte is read. End of stream in the middle
/// of a varint is an [`UnexpectedEof`][io::ErrorKind::UnexpectedEof] error.
pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Option<u64>> {
    let mut acc = Accumulator::default();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) if acc.len == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed in the middle of a varint",
                ).into());
            }
            Ok(_) => {
                if let Some(value) = acc.push(byte[0])? {
                    return Ok(Some(value));
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn round_trip_consumes_exact_length() {
        for value in [0, 1, 127, 128, u32::MAX as u64, u64::MAX] {
            let mut wire: Vec<u8> = vec![];
            encode(value, &mut wire);
            assert_eq!(wire.len(), encoded_len(value));

            // trailing byte must be left untouched
            wire.push(0xAA);
            let mut reader = &wire[..];
            assert_eq!(read(&mut reader).unwrap(), Some(value));
            assert_eq!(reader, &[0xAA]);
        }
    }

    #[test]
    fn known_encodings() {
        let mut buf: Vec<u8> = vec![];
        encode(300, &mut buf);
        assert_eq!(buf, [0xAC, 0x02]);
        assert_eq!(encoded_len(u64::MAX), 10);
        assert_eq!(encoded_len(0), 1);
    }

    #[test]
    fn end_of_stream() {
        let mut empty: &[u8] = &[];
        assert_eq!(read(&mut empty).unwrap(), None);

        let mut partial: &[u8] = &[0x80, 0x80];
        let err = read(&mut partial).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn overlong_varint() {
        let mut wire: &[u8] = &[0xFF; 11];
        let err = read(&mut wire).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Protocol(ProtocolError::MalformedVarint)));

        // 10th byte overflowing 64 bits
        let mut buf = &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02][..];
        assert!(decode(&mut buf).is_err());
    }

    #[test]
    fn decode_incomplete() {
        let mut buf = &[0x80][..];
        assert_eq!(decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn interrupted_read_is_retried() {
        struct Flaky<'a> {
            interrupted: bool,
            inner: &'a [u8],
        }

        impl Read for Flaky<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::ErrorKind::Interrupted.into());
                }
                self.inner.read(buf)
            }
        }

        let mut flaky = Flaky { interrupted: false, inner: &[0xAC, 0x02] };
        assert_eq!(read(&mut flaky).unwrap(), Some(300));
    }
}

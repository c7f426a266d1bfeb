//! Field codec.
//!
//! | type                            | wire                                   |
//! |---------------------------------|----------------------------------------|
//! | bool, int8, uint8               | 1 byte                                 |
//! | int16, uint16                   | 2 bytes little endian                  |
//! | float, double                   | 4 / 8 bytes little endian IEEE-754     |
//! | int32, uint32, int64, uint64    | varint                                 |
//! | text, binary                    | varint length + bytes                  |
//! | timestamp                       | see [`timestamp`]                      |
//!
//! Any other declared type is rejected with [`DecodeError::UnsupportedType`].
use bytes::Bytes;

use crate::{
    common::verbose,
    ext::{BytesExt, LenExt},
    protocol::{ColumnType, varint},
    row::DecodeError,
    types::Value,
};

pub mod timestamp;

pub use timestamp::RawTimestamp;

/// Decode one non null field of type `ty` from the front of `buf`.
pub fn decode_field(ty: ColumnType, buf: &mut Bytes) -> Result<Value, DecodeError> {
    verbose!(%ty, remaining = buf.len(), "decode field");

    let value = match ty {
        ColumnType::Bool => Value::Bool(u8::from_le_bytes(fixed(ty, buf)?) != 0),
        ColumnType::Int8 => Value::Int8(i8::from_le_bytes(fixed(ty, buf)?)),
        ColumnType::UInt8 => Value::UInt8(u8::from_le_bytes(fixed(ty, buf)?)),
        ColumnType::Int16 => Value::Int16(i16::from_le_bytes(fixed(ty, buf)?)),
        ColumnType::UInt16 => Value::UInt16(u16::from_le_bytes(fixed(ty, buf)?)),
        ColumnType::Float => Value::Float(f32::from_le_bytes(fixed(ty, buf)?)),
        ColumnType::Double => Value::Double(f64::from_le_bytes(fixed(ty, buf)?)),
        ColumnType::Int32 => Value::Int32(var(ty, buf)? as i32),
        ColumnType::UInt32 => Value::UInt32(var(ty, buf)? as u32),
        ColumnType::Int64 => Value::Int64(var(ty, buf)? as i64),
        ColumnType::UInt64 => Value::UInt64(var(ty, buf)?),
        ColumnType::Text => {
            let text = length_prefixed(ty, buf)?;
            Value::Text(String::from_utf8_lossy(&text).into_owned())
        }
        ColumnType::Binary => Value::Binary(length_prefixed(ty, buf)?),
        ColumnType::Timestamp => Value::Timestamp(RawTimestamp::decode(buf)?.to_local()?),
        ColumnType::NText
        | ColumnType::Date
        | ColumnType::Time
        | ColumnType::TimeWithTz
        | ColumnType::TimestampWithTz
        | ColumnType::DateInterval
        | ColumnType::TimeInterval
        | ColumnType::Struct
        | ColumnType::Xml
        | ColumnType::Json
        | ColumnType::Uuid
        | ColumnType::Max
        | ColumnType::Unknown => return Err(DecodeError::UnsupportedType(ty)),
    };

    Ok(value)
}

fn fixed<const N: usize>(ty: ColumnType, buf: &mut Bytes) -> Result<[u8; N], DecodeError> {
    buf.try_get_array().ok_or(DecodeError::Truncated(ty))
}

fn var(ty: ColumnType, buf: &mut Bytes) -> Result<u64, DecodeError> {
    match varint::decode(buf) {
        Ok(Some(value)) => Ok(value),
        Ok(None) | Err(_) => Err(DecodeError::Truncated(ty)),
    }
}

fn length_prefixed(ty: ColumnType, buf: &mut Bytes) -> Result<Bytes, DecodeError> {
    let len = var(ty, buf)?.to_len();
    buf.try_split_to(len).ok_or(DecodeError::Truncated(ty))
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn decode(ty: ColumnType, bytes: &[u8]) -> (Result<Value, DecodeError>, usize) {
        let mut buf = Bytes::copy_from_slice(bytes);
        let value = decode_field(ty, &mut buf);
        (value, buf.len())
    }

    #[test]
    fn fixed_width() {
        assert_eq!(decode(ColumnType::Bool, &[1]).0.unwrap(), Value::Bool(true));
        assert_eq!(decode(ColumnType::Int8, &[0xff]).0.unwrap(), Value::Int8(-1));
        assert_eq!(decode(ColumnType::UInt16, &[0x34, 0x12]).0.unwrap(), Value::UInt16(0x1234));
        assert_eq!(decode(ColumnType::Int16, &[0xfe, 0xff]).0.unwrap(), Value::Int16(-2));
        assert_eq!(
            decode(ColumnType::Double, &1.5f64.to_le_bytes()).0.unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            decode(ColumnType::Float, &(-0.25f32).to_le_bytes()).0.unwrap(),
            Value::Float(-0.25)
        );
    }

    #[test]
    fn varint_reinterpreted() {
        let mut buf = BytesMut::new();
        varint::encode(-5i32 as u32 as u64, &mut buf);
        assert_eq!(decode(ColumnType::Int32, &buf).0.unwrap(), Value::Int32(-5));

        buf.clear();
        varint::encode(-5i64 as u64, &mut buf);
        assert_eq!(decode(ColumnType::Int64, &buf).0.unwrap(), Value::Int64(-5));
        assert_eq!(decode(ColumnType::UInt64, &buf).0.unwrap(), Value::UInt64(-5i64 as u64));
    }

    #[test]
    fn length_prefixed_consumes_exactly() {
        let mut buf = BytesMut::new();
        buf.put_u8(3);
        buf.put_slice(&[0, 1, 2]);
        buf.put_u8(0xAA);

        let (value, remaining) = decode(ColumnType::Binary, &buf);
        assert_eq!(value.unwrap(), Value::Binary(Bytes::from_static(&[0, 1, 2])));
        assert_eq!(remaining, 1);

        let (value, _) = decode(ColumnType::Text, &[3, b'a', 0xce, 0xbb]);
        assert_eq!(value.unwrap(), Value::Text("aλ".into()));
    }

    #[test]
    fn truncated_field() {
        let (value, _) = decode(ColumnType::Text, &[4, b'a']);
        assert!(matches!(value, Err(DecodeError::Truncated(ColumnType::Text))));

        let (value, _) = decode(ColumnType::Int64, &[0x80]);
        assert!(matches!(value, Err(DecodeError::Truncated(ColumnType::Int64))));

        let (value, _) = decode(ColumnType::UInt16, &[1]);
        assert!(matches!(value, Err(DecodeError::Truncated(ColumnType::UInt16))));
    }

    #[test]
    fn unsupported_type_consumes_nothing() {
        for ty in [ColumnType::Date, ColumnType::Json, ColumnType::Uuid, ColumnType::Unknown] {
            let (value, remaining) = decode(ty, &[1, 2, 3]);
            assert!(matches!(value, Err(DecodeError::UnsupportedType(t)) if t == ty));
            assert_eq!(remaining, 3);
        }
    }

    #[test]
    fn timestamp_field() {
        let (value, remaining) = decode(ColumnType::Timestamp, &[201, 3, 253, 0, 42, 154, 183, 14, 175, 109]);
        let Value::Timestamp(ts) = value.unwrap() else {
            panic!("expected timestamp");
        };
        assert_eq!(remaining, 0);
        assert_eq!((ts.year(), ts.day(), ts.hour(), ts.minute()), (2024, 29, 13, 45));
    }
}

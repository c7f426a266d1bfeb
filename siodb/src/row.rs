//! Siodb row operation.
//!
//! - [`Row`]
//! - [`Field`]
//! - [`FromRow`]
//! - [`Decode`]
//!
//! - [`Index`]
//! - [`DecodeError`]
use bytes::Bytes;
use std::{borrow::Cow, fmt, sync::Arc};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
    common::unit_error,
    protocol::ColumnType,
    types::{Column, Value},
};

/// Siodb row.
#[derive(Clone)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<Option<Value>>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[Column]>, values: Vec<Option<Value>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of fields/column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the result set columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the fields, `None` is `NULL`.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Consume self into the fields.
    pub fn into_values(self) -> Vec<Option<Value>> {
        self.values
    }

    /// Get a field by position.
    ///
    /// Returns `None` if index is out of bounds or the value is `NULL`.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)?.as_ref()
    }

    /// Try get and decode field.
    pub fn try_get<I: Index, R: Decode>(&self, idx: I) -> Result<R, DecodeError> {
        let nth = idx.position(&self.columns)?;
        R::decode(Field {
            column: &self.columns[nth],
            value: self.values[nth].as_ref(),
        })
    }

    /// Try decode type using [`FromRow`] implementation.
    pub fn decode<D: FromRow>(self) -> Result<D, DecodeError> {
        D::from_row(self)
    }

    /// Iterate over the fields along with their column.
    pub fn iter(&self) -> impl Iterator<Item = Field<'_>> {
        self.columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| Field { column, value: value.as_ref() })
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for field in self.iter() {
            dbg.key(&field.column.name());
            match field.value {
                Some(value) => dbg.value(&format_args!("{value}")),
                None => dbg.value(&format_args!("NULL")),
            };
        }
        dbg.finish()
    }
}

/// A single field in a row.
#[derive(Debug, Clone, Copy)]
pub struct Field<'r> {
    column: &'r Column,
    value: Option<&'r Value>,
}

impl<'r> Field<'r> {
    /// Returns the field column.
    pub fn column(&self) -> &'r Column {
        self.column
    }

    /// Return `true` if value is NULL.
    pub const fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the value, [`None`] if value is `NULL`.
    pub fn value(&self) -> Option<&'r Value> {
        self.value
    }

    /// Return [`DecodeError::Null`] if value is `NULL`.
    pub fn try_value(&self) -> Result<&'r Value, DecodeError> {
        self.value.ok_or(DecodeError::Null)
    }

    /// Try decode type using [`Decode`] implementation.
    pub fn decode<D: Decode>(self) -> Result<D, DecodeError> {
        D::decode(self)
    }
}

/// Query result with its rows affected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowResult {
    /// Rows affected, if the server reported it.
    pub rows_affected: Option<u64>,
}

// ===== Traits =====

/// Type that can be constructed from a row.
pub trait FromRow: Sized {
    /// Construct self from row.
    fn from_row(row: Row) -> Result<Self, DecodeError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, DecodeError> {
        Ok(row)
    }
}

impl FromRow for () {
    fn from_row(_: Row) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! from_row_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRow for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_row(row: Row) -> Result<Self, DecodeError> {
                Ok((
                    $(row.try_get($i)?),*,
                ))
            }
        }
    };
}

from_row_tuple!(T0 0);
from_row_tuple!(T0 0, T1 1);
from_row_tuple!(T0 0, T1 1, T2 2);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4, T5 5);

/// A type that can be constructed from [`Field`].
pub trait Decode: Sized {
    /// Try decode self from field.
    fn decode(field: Field<'_>) -> Result<Self, DecodeError>;
}

impl<T: Decode> Decode for Option<T> {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        match field.is_null() {
            true => Ok(None),
            false => field.decode().map(Some),
        }
    }
}

impl Decode for () {
    fn decode(_: Field<'_>) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl Decode for Value {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.try_value().cloned()
    }
}

macro_rules! decode {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl Decode for $ty {
                fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
                    match field.try_value()? {
                        Value::$variant(v) => Ok(v.clone()),
                        v => Err(DecodeError::TypeMismatch {
                            expect: ColumnType::$variant,
                            found: v.ty(),
                        }),
                    }
                }
            }
        )*
    };
}

decode! {
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => Text,
    Bytes => Binary,
    OffsetDateTime => Timestamp,
}

impl Decode for Vec<u8> {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        Bytes::decode(field).map(Into::into)
    }
}

impl Decode for PrimitiveDateTime {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        let ts = OffsetDateTime::decode(field)?;
        Ok(PrimitiveDateTime::new(ts.date(), ts.time()))
    }
}

/// Type that can be used for indexing column.
pub trait Index: Sized + sealed::Sealed {
    /// Returns the column position.
    fn position(self, columns: &[Column]) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, columns: &[Column]) -> Result<usize, DecodeError> {
        match self < columns.len() {
            true => Ok(self),
            false => Err(DecodeError::IndexOutOfBounds(self)),
        }
    }
}

/// Exact name match first, then ignoring ASCII case.
impl Index for &str {
    fn position(self, columns: &[Column]) -> Result<usize, DecodeError> {
        columns
            .iter()
            .position(|col| col.name() == self)
            .or_else(|| columns.iter().position(|col| col.name().eq_ignore_ascii_case(self)))
            .ok_or_else(|| DecodeError::ColumnNotFound(String::from(self).into()))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}

unit_error! {
    /// An error when try to [`fetch_one`][crate::query::Query::fetch_one] and not returns any row.
    pub struct RowNotFound("row not found");
}

/// An error when decoding row value.
pub enum DecodeError {
    /// Column type has no decoder.
    ///
    /// The field length is unknown, so the rest of the row is lost.
    UnsupportedType(ColumnType),
    /// Row frame ended in the middle of a field.
    Truncated(ColumnType),
    /// Row frame ended before the null bitmask.
    MissingBitmask,
    /// Row frame have bytes left after the last field.
    TrailingBytes(usize),
    /// Timestamp fields do not form a valid date time.
    InvalidTimestamp(time::error::ComponentRange),
    /// Column requested not found.
    ColumnNotFound(Cow<'static,str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Destination slot count differ from the column count.
    ColumnCount { expect: usize, found: usize },
    /// Requested type differ from the column type.
    TypeMismatch { expect: ColumnType, found: ColumnType },
    /// Value is null.
    Null,
}

impl From<time::error::ComponentRange> for DecodeError {
    fn from(e: time::error::ComponentRange) -> Self {
        Self::InvalidTimestamp(e)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::UnsupportedType(ty) => write!(f, "unsupported column data type: {ty}"),
            Self::Truncated(ty) => write!(f, "row ended in the middle of {ty} field"),
            Self::MissingBitmask => write!(f, "row ended before the null bitmask"),
            Self::TrailingBytes(n) => write!(f, "{n} unexpected bytes after the last field"),
            Self::InvalidTimestamp(e) => write!(f, "invalid timestamp: {e}"),
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            Self::ColumnCount { expect, found } => write!(
                f,
                "expected {expect} destination slots, found {found}"
            ),
            Self::TypeMismatch { expect, found } => write!(
                f,
                "data type missmatch, expected {expect} found {found}"
            ),
            Self::Null => write!(f, "unexpected NULL value"),
        }
    }
}

impl std::error::Error for DecodeError { }

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

//! Result set decoding.
//!
//! ```text
//! [row-length: varint]                       row-length == 0 ends the result set
//! [null bitmask: ceil(columns / 8) bytes]    present if any column is nullable
//! [field]*                                   non null fields in column order
//! ```
use bytes::Bytes;
use std::{
    io::{self, Read, Write},
    sync::Arc,
};

use crate::{
    Result,
    codec::decode_field,
    common::{debug, verbose, warning},
    connection::Connection,
    ext::BytesExt,
    net::Socket,
    protocol::{ProtocolError, framing},
    row::{DecodeError, Row},
    types::{Column, Value},
};

/// Decode state of the in flight result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecodeState {
    /// Any column is nullable, so every row starts with a null bitmask.
    pub(crate) nullable: bool,
    pub(crate) bitmask_len: usize,
    /// End of result set reached, or there is no result set.
    pub(crate) completed: bool,
}

impl DecodeState {
    pub(crate) const IDLE: DecodeState = DecodeState {
        nullable: false,
        bitmask_len: 0,
        completed: true,
    };

    pub(crate) fn start(columns: &[Column]) -> DecodeState {
        let nullable = columns.iter().any(Column::is_nullable);
        DecodeState {
            nullable,
            bitmask_len: match nullable {
                true => NullBitmask::width(columns.len()),
                false => 0,
            },
            completed: false,
        }
    }
}

/// Null flag per column, a set bit means the field is `NULL` and absent from the row.
#[derive(Debug, Clone, Copy)]
pub struct NullBitmask<'a>(&'a [u8]);

impl<'a> NullBitmask<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Bitmask width in bytes for `columns` columns.
    pub const fn width(columns: usize) -> usize {
        columns.div_ceil(8)
    }

    /// Returns `true` if column `i` is `NULL`.
    ///
    /// Bits past the bitmask are treated as not null.
    pub fn is_null(&self, i: usize) -> bool {
        match self.0.get(i / 8) {
            Some(byte) => (byte >> (i % 8)) & 1 == 1,
            None => false,
        }
    }
}

/// Decode a row frame into one slot per column.
///
/// The whole frame is already read, so an error here leaves the stream aligned at the next frame.
pub(crate) fn decode_row(
    columns: &[Column],
    state: &DecodeState,
    mut frame: Bytes,
    slots: &mut [Option<Value>],
) -> Result<(), DecodeError> {
    if slots.len() != columns.len() {
        return Err(DecodeError::ColumnCount { expect: columns.len(), found: slots.len() });
    }

    let bitmask = match state.nullable {
        true => frame.try_split_to(state.bitmask_len).ok_or(DecodeError::MissingBitmask)?,
        false => Bytes::new(),
    };
    let bitmask = NullBitmask::new(&bitmask);
    verbose!(bitmask = ?bitmask.0, "decode row");

    for (i, (column, slot)) in columns.iter().zip(slots.iter_mut()).enumerate() {
        *slot = match bitmask.is_null(i) {
            true => None,
            false => Some(decode_field(column.ty(), &mut frame)?),
        };
    }

    if !frame.is_empty() {
        return Err(DecodeError::TrailingBytes(frame.len()));
    }

    Ok(())
}

impl<S: Read + Write> Connection<S> {
    /// Read the next row frame, `None` at the end of result set.
    ///
    /// A poisoned connection never reports the end of result set.
    pub(crate) fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.poisoned {
            return Err(ProtocolError::Poisoned.into());
        }
        if self.state.completed {
            return Ok(None);
        }

        let result = framing::read_varint(&mut self.stream).and_then(|len| match len {
            0 => Ok(None),
            len => framing::read_exact(&mut self.stream, len).map(Some),
        });

        match self.guard(result)? {
            Some(frame) => {
                verbose!(len = frame.len(), "row frame");
                Ok(Some(frame))
            }
            None => {
                verbose!("end of result set");
                self.state = DecodeState::IDLE;
                Ok(None)
            }
        }
    }

    /// Discard remaining row frames without decoding them.
    ///
    /// Returns the number of frames discarded.
    pub(crate) fn drain(&mut self) -> Result<u64> {
        let mut count = 0;

        while !self.state.completed {
            let result = framing::read_varint(&mut self.stream).and_then(|len| {
                if len == 0 {
                    return Ok(true);
                }
                let skipped = io::copy(&mut (&mut self.stream).take(len), &mut io::sink())?;
                if skipped < len {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream closed while draining result set",
                    ).into());
                }
                Ok(false)
            });

            match self.guard(result)? {
                true => self.state = DecodeState::IDLE,
                false => count += 1,
            }
        }

        debug!(self.trace, "result set drained, {count} rows discarded");
        Ok(count)
    }
}

/// An open result set.
///
/// Rows must be read until the end, or the result set closed, before the connection can be used
/// again. Dropping an unfinished result set drains it.
pub struct Rows<'c, S: Read + Write = Socket> {
    conn: &'c mut Connection<S>,
    columns: Arc<[Column]>,
    rows_affected: Option<u64>,
}

impl<'c, S: Read + Write> Rows<'c, S> {
    pub(crate) fn new(conn: &'c mut Connection<S>, columns: Vec<Column>, rows_affected: Option<u64>) -> Self {
        Self { conn, columns: columns.into(), rows_affected }
    }

    /// Returns the result set columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Rows affected, if the server reported it.
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    /// Returns `true` once the end of result set is reached.
    pub fn is_completed(&self) -> bool {
        self.conn.state.completed
    }

    /// Read the next row, `None` at the end of result set.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(frame) = self.conn.next_frame()? else {
            return Ok(None);
        };
        let mut values = vec![None; self.columns.len()];
        decode_row(&self.columns, &self.conn.state, frame, &mut values)?;
        Ok(Some(Row::new(self.columns.clone(), values)))
    }

    /// Read the next row into `slots`, one per column.
    ///
    /// Returns `false` at the end of result set, `slots` is untouched.
    pub fn read_into(&mut self, slots: &mut [Option<Value>]) -> Result<bool> {
        let Some(frame) = self.conn.next_frame()? else {
            return Ok(false);
        };
        decode_row(&self.columns, &self.conn.state, frame, slots)?;
        Ok(true)
    }

    /// Discard the remaining rows.
    ///
    /// Returns the number of rows discarded.
    pub fn close(mut self) -> Result<u64> {
        self.finish()
    }

    fn finish(&mut self) -> Result<u64> {
        match self.conn.state.completed {
            true => Ok(0),
            false => self.conn.drain(),
        }
    }
}

impl<S: Read + Write> Iterator for Rows<'_, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<S: Read + Write> Drop for Rows<'_, S> {
    fn drop(&mut self) {
        if let Err(_err) = self.finish() {
            warning!("failed to drain result set: {_err}");
        }
    }
}

impl<S: Read + Write> std::fmt::Debug for Rows<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("columns", &self.columns)
            .field("completed", &self.conn.state.completed)
            .finish()
    }
}

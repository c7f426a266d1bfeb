//! Command and response correlation.
use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    Result,
    common::{debug, span, verbose, warning},
    connection::Connection,
    fetch::DecodeState,
    protocol::{Command, ProtocolError, ServerResponse, StatusMessage},
    types::Column,
};

/// Classified server response of a command.
#[derive(Debug)]
pub(crate) struct Response {
    /// Non empty when a result set follows.
    pub(crate) columns: Vec<Column>,
    pub(crate) rows_affected: Option<u64>,
}

impl<S: Read + Write> Connection<S> {
    /// Send sql text and read the correlated response.
    ///
    /// When columns are returned the result set is left open for the caller.
    pub(crate) fn command(&mut self, sql: &str) -> Result<Response> {
        if self.poisoned {
            return Err(ProtocolError::Poisoned.into());
        }
        let result = self.correlate(sql);
        self.guard(result)
    }

    fn correlate(&mut self, sql: &str) -> Result<Response> {
        if !self.state.completed {
            let _n = self.drain()?;
            warning!("previous result set was not consumed, {_n} rows discarded");
        }

        self.request_id += 1;
        let request_id = self.request_id;
        span!("command", request_id);
        verbose!(sql, "send command");
        debug!(self.trace, "command {request_id}: {sql}");

        self.send(&Command { request_id, text: sql.into() })?;
        let response: ServerResponse = self.recv()?;

        if response.request_id != request_id {
            return Err(ProtocolError::RequestIdMismatch {
                expect: request_id,
                found: response.request_id,
            }.into());
        }

        let columns = response
            .column_description
            .into_iter()
            .map(Column::from)
            .collect::<Vec<_>>();

        if !columns.is_empty() {
            self.state = DecodeState::start(&columns);
            verbose!(columns = columns.len(), nullable = self.state.nullable, "result set");
        }

        if !response.message.is_empty() {
            // columns of a failed command still have their rows on the wire
            if !columns.is_empty() {
                self.drain()?;
            }
            let err = ServerError::new(response.message);
            debug!(self.trace, "command {request_id} failed: {err}");
            return Err(err.into());
        }

        Ok(Response {
            columns,
            rows_affected: response
                .has_affected_row_count
                .then_some(response.affected_row_count),
        })
    }
}

/// An error reported by the server.
///
/// Not fatal, the connection can still be used.
pub struct ServerError {
    /// Never empty.
    messages: Vec<StatusMessage>,
}

impl ServerError {
    pub(crate) fn new(messages: Vec<StatusMessage>) -> Self {
        debug_assert!(!messages.is_empty());
        Self { messages }
    }

    /// Status code of the first message.
    pub fn code(&self) -> i32 {
        self.messages.first().map(|m| m.status_code).unwrap_or_default()
    }

    /// Text of the first message.
    pub fn message(&self) -> &str {
        self.messages.first().map(|m| m.text.as_str()).unwrap_or_default()
    }

    /// Messages after the first.
    pub fn others(&self) -> &[StatusMessage] {
        self.messages.get(1..).unwrap_or_default()
    }

    /// All messages in order.
    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }
}

impl std::error::Error for ServerError { }

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Siodb server error {}: {}", self.code(), self.message())?;
        for other in self.others() {
            write!(f, "; {}: {}", other.status_code, other.text)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn status(status_code: i32, text: &str) -> StatusMessage {
        StatusMessage { status_code, text: text.into() }
    }

    #[test]
    fn server_error_messages() {
        let err = ServerError::new(vec![
            status(2018, "Table not found"),
            status(1, "Hint: check the database name"),
        ]);
        assert_eq!(err.code(), 2018);
        assert_eq!(err.message(), "Table not found");
        assert_eq!(err.others().len(), 1);
        assert_eq!(
            err.to_string(),
            "Siodb server error 2018: Table not found; 1: Hint: check the database name"
        );

        let single = ServerError::new(vec![status(7, "oops")]);
        assert!(single.others().is_empty());
    }
}

//! Siodb connection.
use bytes::BytesMut;
use std::io::{BufReader, Read, Write};

use crate::{
    Result,
    auth::PrivateKey,
    common::{debug, span},
    fetch::{DecodeState, Rows},
    net::Socket,
    protocol::{ClientMessage, ServerMessage, framing},
    row::RowResult,
};

mod config;

pub use config::{Config, ParseError, Transport};

const DEFAULT_BUF_CAPACITY: usize = 1024;

/// A single authenticated session.
///
/// At most one command is in flight, an open [`Rows`] borrows the connection until it is
/// consumed or dropped.
pub struct Connection<S: Read + Write = Socket> {
    pub(crate) stream: BufReader<S>,
    pub(crate) write_buf: BytesMut,
    pub(crate) session_id: String,
    pub(crate) request_id: u64,
    pub(crate) state: DecodeState,
    pub(crate) poisoned: bool,
    pub(crate) trace: bool,
}

impl Connection<Socket> {
    /// Connect using url.
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_with(&Config::parse(url)?)
    }

    /// Connect using config from environment variable.
    pub fn connect_env() -> Result<Self> {
        Self::connect_with(&Config::from_env()?)
    }

    /// Connect using config.
    pub fn connect_with(config: &Config) -> Result<Self> {
        span!("connect");
        let key = PrivateKey::from_file(
            &config.identity_file,
            config.identity_file_password.as_deref(),
        )?;
        let socket = Socket::connect(config)?;

        let mut conn = Connection::new(socket);
        conn.trace = config.trace;
        debug!(conn.trace, "connecting with {config:?}");
        conn.authenticate(&config.user, &key)?;
        Ok(conn)
    }

    /// Shut down the socket, draining any open result set first.
    pub fn close(mut self) -> Result<()> {
        let drained = match self.poisoned || self.state.completed {
            true => Ok(0),
            false => self.drain(),
        };
        self.stream.get_mut().shutdown()?;
        drained.map(|_| ())
    }
}

impl<S: Read + Write> Connection<S> {
    fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            write_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
            session_id: String::new(),
            request_id: 0,
            state: DecodeState::IDLE,
            poisoned: false,
            trace: false,
        }
    }

    /// Authenticate over an already established stream.
    pub fn handshake(stream: S, user: &str, key: &PrivateKey) -> Result<Self> {
        let mut conn = Connection::new(stream);
        conn.authenticate(user, key)?;
        Ok(conn)
    }

    /// Returns the session id given by the server.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns `true` if a previous fatal error made the connection unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Enable or disable connection level debug output.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Send sql text, returning the result set.
    ///
    /// Statements without result set returns an empty, completed [`Rows`].
    pub fn query(&mut self, sql: &str) -> Result<Rows<'_, S>> {
        let response = self.command(sql)?;
        Ok(Rows::new(self, response.columns, response.rows_affected))
    }

    /// Send sql text, discarding any result set.
    pub fn execute(&mut self, sql: &str) -> Result<RowResult> {
        let response = self.command(sql)?;
        if !response.columns.is_empty() {
            self.drain()?;
        }
        Ok(RowResult { rows_affected: response.rows_affected })
    }

    /// Unwrap the underlying stream.
    ///
    /// Buffered bytes that were not read yet are lost.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    pub(crate) fn send<M: ClientMessage>(&mut self, message: &M) -> Result<()> {
        framing::send_message(self.stream.get_mut(), &mut self.write_buf, message)
    }

    pub(crate) fn recv<M: ServerMessage>(&mut self) -> Result<M> {
        framing::recv_message(&mut self.stream)
    }

    /// Poison the connection on fatal error.
    pub(crate) fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_fatal() && !self.poisoned {
                debug!(self.trace, "connection poisoned: {err}");
                self.poisoned = true;
                self.state = DecodeState::IDLE;
            }
        }
        result
    }
}

impl<S: Read + Write> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("request_id", &self.request_id)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

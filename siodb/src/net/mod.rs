//! Blocking byte stream to the server.
use std::{
    io::{self, IoSlice, Read, Write},
    net::TcpStream,
};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::{
    Result,
    common::verbose,
    connection::{Config, Transport},
};

#[cfg(feature = "tls")]
mod tls;

/// Either tcp, tls, or unix socket.
#[derive(Debug)]
pub struct Socket {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Tcp(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<tls::TlsStream>),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Socket {
    /// Dial the server described by `config`.
    pub fn connect(config: &Config) -> Result<Socket> {
        match config.transport() {
            Transport::Tcp { host, port } => Self::connect_tcp(host, *port),
            Transport::Tls { host, port } => Self::connect_tls(host, *port),
            Transport::Unix { path } => Self::connect_socket(path),
        }
    }

    pub fn connect_tcp(host: &str, port: u16) -> Result<Socket> {
        verbose!(host, port, "dial tcp");
        let socket = TcpStream::connect((host, port))?;
        socket.set_nodelay(true)?;
        Ok(Socket { kind: Kind::Tcp(socket) })
    }

    /// Dial TLS, the server certificate is not verified.
    #[cfg(feature = "tls")]
    pub fn connect_tls(host: &str, port: u16) -> Result<Socket> {
        verbose!(host, port, "dial tls");
        let socket = TcpStream::connect((host, port))?;
        socket.set_nodelay(true)?;
        let stream = tls::connect(host, socket)?;
        Ok(Socket { kind: Kind::Tls(Box::new(stream)) })
    }

    #[cfg(not(feature = "tls"))]
    pub fn connect_tls(_: &str, _: u16) -> Result<Socket> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "`siodbs` scheme requires the `tls` feature",
        ).into())
    }

    #[cfg(unix)]
    pub fn connect_socket(path: impl AsRef<std::path::Path>) -> Result<Socket> {
        verbose!(path = %path.as_ref().display(), "dial unix");
        let socket = UnixStream::connect(path)?;
        Ok(Socket { kind: Kind::Unix(socket) })
    }

    #[cfg(not(unix))]
    pub fn connect_socket(_: impl AsRef<std::path::Path>) -> Result<Socket> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix socket is only available in unix platform",
        ).into())
    }

    /// Shut down both halves of the underlying socket.
    pub fn shutdown(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::Tcp(t) => t.shutdown(std::net::Shutdown::Both),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => {
                t.conn.send_close_notify();
                // best effort, the peer may already be gone
                let _ = t.flush();
                t.sock.shutdown(std::net::Shutdown::Both)
            }
            #[cfg(unix)]
            Kind::Unix(u) => u.shutdown(std::net::Shutdown::Both),
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(t) => t.read(buf),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.read(buf),
            #[cfg(unix)]
            Kind::Unix(u) => u.read(buf),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(t) => t.write(buf),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.write(buf),
            #[cfg(unix)]
            Kind::Unix(u) => u.write(buf),
        }
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(t) => t.write_vectored(bufs),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.write_vectored(bufs),
            #[cfg(unix)]
            Kind::Unix(u) => u.write_vectored(bufs),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::Tcp(t) => t.flush(),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.flush(),
            #[cfg(unix)]
            Kind::Unix(u) => u.flush(),
        }
    }
}

//! Siodb configuration.
use std::{borrow::Cow, env::var, fmt, path::PathBuf};

/// Default server port.
pub const DEFAULT_PORT: u16 = 50000;

/// Default unix socket path.
pub const DEFAULT_SOCKET: &str = "/run/siodb/siodb.socket";

/// Default private key path, `~` is the home directory.
pub const DEFAULT_IDENTITY_FILE: &str = "~/.ssh/id_rsa";

/// How to reach the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transport {
    /// `siodbs://`, TLS over TCP.
    Tls { host: String, port: u16 },
    /// `siodb://`, plain TCP.
    Tcp { host: String, port: u16 },
    /// `siodbu://`, unix domain socket.
    Unix { path: PathBuf },
}

/// Siodb connection config.
#[derive(Clone)]
pub struct Config {
    pub(crate) transport: Transport,
    pub(crate) user: String,
    pub(crate) identity_file: PathBuf,
    pub(crate) identity_file_password: Option<String>,
    pub(crate) trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: Transport::Tls { host: "localhost".into(), port: DEFAULT_PORT },
            user: var("USER").unwrap_or_default(),
            identity_file: expand_home(DEFAULT_IDENTITY_FILE),
            identity_file_password: None,
            trace: false,
        }
    }
}

impl Config {
    /// Retrieve configuration from environment variable.
    ///
    /// It reads `SIODB_URL` first, then override each value with:
    /// - `SIODB_USER`
    /// - `SIODB_HOST`
    /// - `SIODB_PORT`
    /// - `SIODB_IDENTITY_FILE`
    /// - `SIODB_IDENTITY_FILE_PASSWORD`
    ///
    /// Missing value fallback to default.
    pub fn from_env() -> Result<Config, ParseError> {
        let mut config = match var("SIODB_URL") {
            Ok(url) => Config::parse(&url)?,
            Err(_) => Config::default(),
        };

        if let Ok(user) = var("SIODB_USER") {
            config.user = user;
        }
        if let Ok(file) = var("SIODB_IDENTITY_FILE") {
            config.identity_file = expand_home(&file);
        }
        if let Ok(password) = var("SIODB_IDENTITY_FILE_PASSWORD") {
            config.identity_file_password = Some(password);
        }

        if let Transport::Tls { host, port } | Transport::Tcp { host, port } = &mut config.transport {
            if let Ok(h) = var("SIODB_HOST") {
                *host = h;
            }
            if let Ok(p) = var("SIODB_PORT") {
                *port = p.parse().map_err(|_| ParseError::new("invalid port"))?;
            }
        }

        Ok(config)
    }

    /// Parse config from url.
    ///
    /// ```text
    /// siodbs://user@host:port?identity_file=PATH&identity_file_password=PASS&trace=true
    /// siodb://user@host:port
    /// siodbu://user@/run/siodb/siodb.socket
    /// ```
    pub fn parse(url: &str) -> Result<Config, ParseError> {
        let mut config = Config::default();

        let Some((scheme, mut read)) = url.split_once("://") else {
            return Err(ParseError::new("scheme missing"));
        };

        let query = match read.split_once('?') {
            Some((rest, query)) => {
                read = rest;
                query
            }
            None => "",
        };

        if let Some((user, rest)) = read.split_once('@') {
            if !user.is_empty() {
                config.user = percent_decode(user)?;
            }
            read = rest;
        }

        config.transport = match scheme {
            "siodbs" => {
                let (host, port) = host_port(read)?;
                Transport::Tls { host, port }
            }
            "siodb" => {
                let (host, port) = host_port(read)?;
                Transport::Tcp { host, port }
            }
            "siodbu" => Transport::Unix {
                path: match read {
                    "" | "/" => PathBuf::from(DEFAULT_SOCKET),
                    path => PathBuf::from(percent_decode(path)?),
                },
            },
            _ => return Err(ParseError::new(format!("unknown scheme '{scheme}'"))),
        };

        for pair in query.split('&').filter(|e| !e.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value)?;
            match key {
                "identity_file" if !value.is_empty() => config.identity_file = expand_home(&value),
                "identity_file_password" if !value.is_empty() => {
                    config.identity_file_password = Some(value)
                }
                "trace" if !value.is_empty() => config.trace = parse_bool(&value)?,
                _ => {}
            }
        }

        Ok(config)
    }

    /// Returns how to reach the server.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the private key file path.
    pub fn identity_file(&self) -> &PathBuf {
        &self.identity_file
    }

    /// Returns whether connection level debug output is enabled.
    pub fn trace(&self) -> bool {
        self.trace
    }

    /// Set the user name.
    pub fn set_user(&mut self, user: impl Into<String>) -> &mut Self {
        self.user = user.into();
        self
    }

    /// Set the private key file and its password.
    pub fn set_identity_file(&mut self, path: impl Into<PathBuf>, password: Option<String>) -> &mut Self {
        self.identity_file = path.into();
        self.identity_file_password = password;
        self
    }

    /// Set connection level debug output.
    pub fn set_trace(&mut self, trace: bool) -> &mut Self {
        self.trace = trace;
        self
    }
}

impl std::str::FromStr for Config {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("transport", &self.transport)
            .field("user", &self.user)
            .field("identity_file", &self.identity_file)
            .field("identity_file_password", &self.identity_file_password.as_ref().map(|_| "***"))
            .field("trace", &self.trace)
            .finish()
    }
}

fn host_port(authority: &str) -> Result<(String, u16), ParseError> {
    let authority = authority.trim_end_matches('/');

    // [::1]:50000
    let (host, port) = match authority.strip_prefix('[') {
        Some(rest) => {
            let Some((host, rest)) = rest.split_once(']') else {
                return Err(ParseError::new("unclosed ipv6 host"));
            };
            (host, rest.strip_prefix(':'))
        }
        None => match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        },
    };

    let host = match host {
        "" => "localhost".into(),
        host => percent_decode(host)?,
    };

    let port = match port {
        None | Some("") => DEFAULT_PORT,
        Some(port) => port.parse().map_err(|_| ParseError::new("invalid port"))?,
    };

    Ok((host, port))
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ParseError::new("option 'trace' can be 'true' or 'false'")),
    }
}

fn percent_decode(input: &str) -> Result<String, ParseError> {
    if !input.contains('%') {
        return Ok(input.into());
    }

    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let hex = [
            bytes.next().ok_or_else(|| ParseError::new("truncated percent encoding"))?,
            bytes.next().ok_or_else(|| ParseError::new("truncated percent encoding"))?,
        ];
        let mut byte = [0u8];
        hex::decode_to_slice(hex, &mut byte)
            .map_err(|_| ParseError::new("invalid percent encoding"))?;
        out.push(byte[0]);
    }

    String::from_utf8(out).map_err(|_| ParseError::new("percent encoding is not utf8"))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Error when parsing url.
pub struct ParseError {
    reason: Cow<'static,str>,
}

impl ParseError {
    fn new(reason: impl Into<Cow<'static,str>>) -> Self {
        Self { reason: reason.into() }
    }
}

impl std::error::Error for ParseError { }

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to parse url: {}", self.reason)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_tls() {
        let config = Config::parse(
            "siodbs://root@db.local:50001?identity_file=/keys/id_rsa&identity_file_password=p%40ss&trace=true",
        )
        .unwrap();
        assert_eq!(config.transport, Transport::Tls { host: "db.local".into(), port: 50001 });
        assert_eq!(config.user, "root");
        assert_eq!(config.identity_file, PathBuf::from("/keys/id_rsa"));
        assert_eq!(config.identity_file_password.as_deref(), Some("p@ss"));
        assert!(config.trace);
    }

    #[test]
    fn parse_defaults() {
        let config = Config::parse("siodb://root@").unwrap();
        assert_eq!(config.transport, Transport::Tcp { host: "localhost".into(), port: DEFAULT_PORT });
        assert!(!config.trace);
        assert!(config.identity_file_password.is_none());

        let config = Config::parse("siodb://root@[::1]").unwrap();
        assert_eq!(config.transport, Transport::Tcp { host: "::1".into(), port: DEFAULT_PORT });
    }

    #[test]
    fn parse_unix() {
        let config = Config::parse("siodbu://root@/tmp/siodb.sock?trace=0").unwrap();
        assert_eq!(config.transport, Transport::Unix { path: "/tmp/siodb.sock".into() });
        assert!(!config.trace);

        let config = Config::parse("siodbu://root@").unwrap();
        assert_eq!(config.transport, Transport::Unix { path: DEFAULT_SOCKET.into() });
    }

    #[test]
    fn parse_error() {
        assert!(Config::parse("postgres://root@localhost").is_err());
        assert!(Config::parse("localhost:50000").is_err());
        assert!(Config::parse("siodb://root@localhost:port").is_err());
        assert!(Config::parse("siodb://root@localhost?trace=maybe").is_err());
        assert!(Config::parse("siodb://root@localhost?identity_file=%4").is_err());
    }

    #[test]
    fn password_hidden() {
        let config = Config::parse("siodb://root@localhost?identity_file_password=secret").unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}

//! Siodb Driver
//!
//! Blocking client for the Siodb wire protocol.
//!
//! # Examples
//!
//! Single connection:
//!
//! ```no_run
//! use siodb::Connection;
//!
//! # fn app() -> siodb::Result<()> {
//! let mut conn = Connection::connect("siodbs://root@localhost:50000?identity_file=/home/root/.ssh/id_rsa")?;
//!
//! let res = siodb::query::<_, _, (u64, String)>("SELECT TRID, NAME FROM SYS.SYS_DATABASES", &mut conn)
//!     .fetch_all()?;
//!
//! for (trid, name) in res {
//!     println!("{trid}: {name}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Row by row:
//!
//! ```no_run
//! use siodb::Connection;
//!
//! # fn app() -> siodb::Result<()> {
//! let mut conn = Connection::connect_env()?;
//!
//! siodb::execute("CREATE TABLE db1.foo (id INT32, name TEXT)", &mut conn).execute()?;
//!
//! let mut rows = conn.query("SELECT * FROM db1.foo")?;
//! println!("{:?}", rows.column_names());
//!
//! while let Some(row) = rows.next_row()? {
//!     let name: Option<String> = row.try_get("NAME")?;
//!     println!("{name:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod common;
mod ext;

// Protocol
pub mod protocol;
pub mod codec;

// Component
pub mod types;
pub mod row;
pub mod auth;
pub mod net;

// Operation
mod command;
pub mod fetch;
pub mod query;

// Connection
pub mod connection;

mod error;


pub use protocol::ColumnType;
pub use types::{Column, Attribute, Value};
pub use row::{Row, Field, FromRow, Decode, DecodeError, RowResult};
pub use auth::{PrivateKey, KeyError, AuthError};
pub use command::ServerError;
pub use fetch::Rows;
pub use net::Socket;

pub use connection::{Connection, Config};
#[doc(inline)]
pub use query::{query, query_row, execute};
pub use error::{Error, ErrorKind, Result};

#[cfg(feature = "macros")]
pub use siodb_macros::FromRow;

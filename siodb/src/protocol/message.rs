//! Protocol message payloads.
//!
//! Payloads are protobuf structures, these types only hold data, encoding is
//! delegated to [`prost`].
use super::framing::{ClientMessage, ServerMessage};

macro_rules! type_id {
    ($(<$dir:ident>$name:ident = $id:literal,)*) => {
        $(
            impl $dir for $name {
                const TYPE_ID: u64 = $id;
            }
        )*

        /// Get message name from type id.
        ///
        /// Returns `"Unknown"` for unknown type id.
        pub fn message_name(type_id: u64) -> &'static str {
            match type_id {
                $($id => stringify!($name),)*
                _ => "Unknown",
            }
        }
    };
}

type_id! {
    <ClientMessage>Command = 1,
    <ServerMessage>ServerResponse = 2,
    <ClientMessage>BeginSessionRequest = 5,
    <ServerMessage>BeginSessionResponse = 6,
    <ClientMessage>ClientAuthenticationRequest = 7,
    <ServerMessage>ClientAuthenticationResponse = 8,
}

/// Single message from server or IO manager.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StatusMessage {
    /// Message status code.
    #[prost(int32, tag = "1")]
    pub status_code: i32,
    /// Message text.
    #[prost(string, tag = "2")]
    pub text: String,
}

/// Structured column data type attribute description.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AttributeDescription {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "ColumnType", tag = "2")]
    pub r#type: i32,
    #[prost(bool, tag = "3")]
    pub is_null: bool,
    /// Attributes of a structured data type.
    #[prost(message, repeated, tag = "4")]
    pub attribute: Vec<AttributeDescription>,
}

/// Result set column description.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ColumnDescription {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "ColumnType", tag = "2")]
    pub r#type: i32,
    /// Column can have null values.
    #[prost(bool, tag = "3")]
    pub is_null: bool,
    /// Attributes of a structured data type.
    #[prost(message, repeated, tag = "4")]
    pub attribute: Vec<AttributeDescription>,
}

/// Opens a session for a user.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BeginSessionRequest {
    #[prost(string, tag = "1")]
    pub user_name: String,
}

/// Server answer to [`BeginSessionRequest`], carries the challenge to sign.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BeginSessionResponse {
    #[prost(bool, tag = "1")]
    pub session_started: bool,
    #[prost(message, optional, tag = "2")]
    pub message: Option<StatusMessage>,
    #[prost(bytes = "vec", tag = "3")]
    pub challenge: Vec<u8>,
}

/// Signed challenge.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClientAuthenticationRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub signature: Vec<u8>,
}

/// Server answer to [`ClientAuthenticationRequest`].
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClientAuthenticationResponse {
    #[prost(bool, tag = "1")]
    pub authenticated: bool,
    #[prost(message, optional, tag = "2")]
    pub message: Option<StatusMessage>,
    #[prost(string, tag = "3")]
    pub session_id: String,
}

/// SQL text to execute.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Command {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(string, tag = "2")]
    pub text: String,
}

/// Server answer to [`Command`].
///
/// Non empty `column_description` means row frames follow.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerResponse {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(message, repeated, tag = "2")]
    pub message: Vec<StatusMessage>,
    #[prost(message, repeated, tag = "3")]
    pub column_description: Vec<ColumnDescription>,
    #[prost(bool, tag = "4")]
    pub has_affected_row_count: bool,
    #[prost(uint64, tag = "5")]
    pub affected_row_count: u64,
}

/// Column data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ColumnType {
    Bool = 0,
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,
    Float = 9,
    Double = 10,
    Text = 11,
    NText = 12,
    Binary = 13,
    Date = 14,
    Time = 15,
    TimeWithTz = 16,
    Timestamp = 17,
    TimestampWithTz = 18,
    DateInterval = 19,
    TimeInterval = 20,
    Struct = 21,
    Xml = 22,
    Json = 23,
    Uuid = 24,
    Max = 25,
    Unknown = 26,
}

impl ColumnType {
    /// Wire value to type, values outside the enumeration are [`ColumnType::Unknown`].
    pub fn from_wire(value: i32) -> ColumnType {
        ColumnType::try_from(value).unwrap_or(ColumnType::Unknown)
    }

    /// Type name as declared in the protocol.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int8 => "INT8",
            Self::UInt8 => "UINT8",
            Self::Int16 => "INT16",
            Self::UInt16 => "UINT16",
            Self::Int32 => "INT32",
            Self::UInt32 => "UINT32",
            Self::Int64 => "INT64",
            Self::UInt64 => "UINT64",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Text => "TEXT",
            Self::NText => "NTEXT",
            Self::Binary => "BINARY",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::TimeWithTz => "TIME_WITH_TZ",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampWithTz => "TIMESTAMP_WITH_TZ",
            Self::DateInterval => "DATE_INTERVAL",
            Self::TimeInterval => "TIME_INTERVAL",
            Self::Struct => "STRUCT",
            Self::Xml => "XML",
            Self::Json => "JSON",
            Self::Uuid => "UUID",
            Self::Max => "MAX",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(message_name(Command::TYPE_ID), "Command");
        assert_eq!(message_name(ClientAuthenticationResponse::TYPE_ID), "ClientAuthenticationResponse");
        assert_eq!(message_name(3), "Unknown");
    }

    #[test]
    fn column_type_from_wire() {
        assert_eq!(ColumnType::from_wire(17), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_wire(0), ColumnType::Bool);
        assert_eq!(ColumnType::from_wire(99), ColumnType::Unknown);
        assert_eq!(ColumnType::from_wire(-1), ColumnType::Unknown);
    }
}

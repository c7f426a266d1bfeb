//! Result set description and decoded values.
//!
//! - [`Column`]
//! - [`Attribute`]
//! - [`Value`]
use bytes::Bytes;
use std::fmt;
use time::OffsetDateTime;

use crate::{
    ext::FmtExt,
    protocol::{AttributeDescription, ColumnDescription, ColumnType},
};

/// Result set column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ty: ColumnType,
    nullable: bool,
    attributes: Vec<Attribute>,
}

impl Column {
    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns column declared type.
    pub const fn ty(&self) -> ColumnType {
        self.ty
    }

    /// Returns `true` if the column can contain `NULL`.
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Attributes of a structured type, empty for scalar types.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl From<ColumnDescription> for Column {
    fn from(desc: ColumnDescription) -> Self {
        Self {
            ty: ColumnType::from_wire(desc.r#type),
            name: desc.name,
            nullable: desc.is_null,
            attributes: desc.attribute.into_iter().map(Into::into).collect(),
        }
    }
}

/// Member of a structured column type, may itself be structured.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    ty: ColumnType,
    nullable: bool,
    attributes: Vec<Attribute>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn ty(&self) -> ColumnType {
        self.ty
    }

    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl From<AttributeDescription> for Attribute {
    fn from(desc: AttributeDescription) -> Self {
        Self {
            ty: ColumnType::from_wire(desc.r#type),
            name: desc.name,
            nullable: desc.is_null,
            attributes: desc.attribute.into_iter().map(Into::into).collect(),
        }
    }
}

/// A decoded non null field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Text(String),
    Binary(Bytes),
    /// Timestamp in the local time zone.
    Timestamp(OffsetDateTime),
}

impl Value {
    /// Returns the column type this value is decoded from.
    pub const fn ty(&self) -> ColumnType {
        match self {
            Self::Bool(_) => ColumnType::Bool,
            Self::Int8(_) => ColumnType::Int8,
            Self::UInt8(_) => ColumnType::UInt8,
            Self::Int16(_) => ColumnType::Int16,
            Self::UInt16(_) => ColumnType::UInt16,
            Self::Int32(_) => ColumnType::Int32,
            Self::UInt32(_) => ColumnType::UInt32,
            Self::Int64(_) => ColumnType::Int64,
            Self::UInt64(_) => ColumnType::UInt64,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::Text(_) => ColumnType::Text,
            Self::Binary(_) => ColumnType::Binary,
            Self::Timestamp(_) => ColumnType::Timestamp,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => v.fmt(f),
            Self::Int8(v) => v.fmt(f),
            Self::UInt8(v) => v.fmt(f),
            Self::Int16(v) => v.fmt(f),
            Self::UInt16(v) => v.fmt(f),
            Self::Int32(v) => v.fmt(f),
            Self::UInt32(v) => v.fmt(f),
            Self::Int64(v) => v.fmt(f),
            Self::UInt64(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::Double(v) => v.fmt(f),
            Self::Text(v) => v.fmt(f),
            Self::Binary(v) => v.lossy().fmt(f),
            Self::Timestamp(v) => v.fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_attributes() {
        let desc = ColumnDescription {
            name: "address".into(),
            r#type: ColumnType::Struct as i32,
            is_null: true,
            attribute: vec![AttributeDescription {
                name: "geo".into(),
                r#type: ColumnType::Struct as i32,
                is_null: false,
                attribute: vec![AttributeDescription {
                    name: "lat".into(),
                    r#type: ColumnType::Double as i32,
                    ..Default::default()
                }],
            }],
        };

        let column = Column::from(desc);
        assert_eq!(column.ty(), ColumnType::Struct);
        assert!(column.is_nullable());
        let geo = &column.attributes()[0];
        assert_eq!(geo.name(), "geo");
        assert_eq!(geo.attributes()[0].ty(), ColumnType::Double);
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Int32(-4).to_string(), "-4");
        assert_eq!(Value::Binary(Bytes::from_static(b"a\x00")).to_string(), "a\\x0");
    }
}

//! Column values and decoded rows
//!
//! Values cross the storage boundary in two directions:
//! - bound as statement parameters (`ToSql`)
//! - decoded from a result set into an owned [`Row`]

use rusqlite::types::{ToSql, ToSqlOutput, Type, ValueRef};
use crate::storage::quote_literal;
use crate::{Error, Result};

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    /// Name of the value's kind, as used in validation messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render as a SQL literal, quotes doubled. Only used for logs and previews.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Text(s) => quote_literal(s),
        }
    }

    fn sql_type(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Integer(_) => Type::Integer,
            Value::Text(_) => Type::Text,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// One fetched row: the values of the bound columns, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Split off the first value (the primary key in entity rows)
    pub fn split_first(mut self) -> Option<(Value, Row)> {
        if self.values.is_empty() {
            return None;
        }
        let first = self.values.remove(0);
        Some((first, self))
    }

    pub fn get(&self, idx: usize) -> Result<&Value> {
        self.values
            .get(idx)
            .ok_or(Error::Storage(rusqlite::Error::InvalidColumnIndex(idx)))
    }

    pub fn get_integer(&self, idx: usize) -> Result<i64> {
        let value = self.get(idx)?;
        value.as_integer().ok_or_else(|| {
            Error::Storage(rusqlite::Error::InvalidColumnType(idx, "integer".into(), value.sql_type()))
        })
    }

    pub fn get_text(&self, idx: usize) -> Result<String> {
        let value = self.get(idx)?;
        value.as_text().map(str::to_string).ok_or_else(|| {
            Error::Storage(rusqlite::Error::InvalidColumnType(idx, "text".into(), value.sql_type()))
        })
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Value::from(10).to_literal(), "10");
        assert_eq!(Value::from("O'Brien").to_literal(), "'O''Brien'");
        assert_eq!(Value::Null.to_literal(), "NULL");
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::new(vec![Value::from(7), Value::from("Ann")]);
        assert_eq!(row.get_integer(0).unwrap(), 7);
        assert_eq!(row.get_text(1).unwrap(), "Ann");
        assert!(row.get_text(0).is_err());
        assert!(matches!(
            row.get(5),
            Err(Error::Storage(rusqlite::Error::InvalidColumnIndex(5)))
        ));
    }

    #[test]
    fn test_split_first() {
        let row = Row::new(vec![Value::from(1), Value::from("a"), Value::from(2)]);
        let (id, rest) = row.split_first().unwrap();
        assert_eq!(id, Value::Integer(1));
        assert_eq!(rest.len(), 2);
        assert!(Row::default().split_first().is_none());
    }
}

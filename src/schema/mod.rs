//! Entity schema definitions
//!
//! An [`EntitySchema`] is the immutable shape of one table:
//! - table name and primary-key column (auto-incrementing integer)
//! - ordered fields, each bounded-length text or plain integer
//! - optional foreign keys from integer fields into other tables
//!
//! It renders every statement the entity manager issues.

pub mod registry;

use crate::storage::{ColumnKind, Statement, quote_ident};
use crate::value::Value;
use crate::{Error, Result};

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text limited to `max_len` characters
    Text { max_len: usize },
    /// Plain integer
    Integer,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Integer => "integer",
        }
    }

    pub fn column_kind(&self) -> ColumnKind {
        match self {
            FieldKind::Text { .. } => ColumnKind::Text,
            FieldKind::Integer => ColumnKind::Integer,
        }
    }

    fn sql_type(&self) -> String {
        match self {
            FieldKind::Text { max_len } => format!("TEXT({})", max_len),
            FieldKind::Integer => "INTEGER".to_string(),
        }
    }
}

/// Foreign key from an integer field into another table's primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// One declared field of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub references: Option<ForeignKey>,
}

impl FieldDef {
    pub fn max_len(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Text { max_len } => Some(max_len),
            FieldKind::Integer => None,
        }
    }

    /// Check `value` against this field's kind and length limit. No I/O.
    pub fn validate(&self, table: &str, value: &Value) -> Result<()> {
        let invalid = |reason: String| Error::Validation {
            table: table.to_string(),
            field: self.name.clone(),
            reason,
        };

        match (&self.kind, value) {
            (FieldKind::Text { max_len }, Value::Text(s)) => {
                let len = s.chars().count();
                if len > *max_len {
                    return Err(invalid(format!(
                        "exceeds maximum length of {} characters (got {})",
                        max_len, len
                    )));
                }
                Ok(())
            }
            (FieldKind::Integer, Value::Integer(_)) => Ok(()),
            (kind, value) => Err(invalid(format!(
                "expected {} value, got {}",
                kind.as_str(),
                value.kind_name()
            ))),
        }
    }

    fn column_sql(&self) -> String {
        let mut sql = format!("{} {} NOT NULL", quote_ident(&self.name), self.kind.sql_type());
        if let Some(fk) = &self.references {
            sql.push_str(&format!(
                " REFERENCES {}({})",
                quote_ident(&fk.table),
                quote_ident(&fk.column)
            ));
        }
        sql
    }
}

/// Immutable description of one entity table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    table: String,
    primary_key: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Start a schema for `table` with an `id` primary key and no fields
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: "id".to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Add a bounded-length text field
    pub fn text(mut self, name: impl Into<String>, max_len: usize) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind: FieldKind::Text { max_len },
            references: None,
        });
        self
    }

    /// Add a plain integer field
    pub fn integer(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind: FieldKind::Integer,
            references: None,
        });
        self
    }

    /// Add an integer field holding a foreign key into `table`'s `id`
    pub fn references(mut self, name: impl Into<String>, table: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind: FieldKind::Integer,
            references: Some(ForeignKey {
                table: table.into(),
                column: "id".to_string(),
            }),
        });
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, failing with a validation error if it isn't declared
    pub fn require_field(&self, name: &str) -> Result<&FieldDef> {
        self.field(name).ok_or_else(|| Error::Validation {
            table: self.table.clone(),
            field: name.to_string(),
            reason: "no such field".to_string(),
        })
    }

    /// Tables this one references; they must be initialized first
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for fk in self.fields.iter().filter_map(|f| f.references.as_ref()) {
            if fk.table != self.table && !deps.contains(&fk.table.as_str()) {
                deps.push(&fk.table);
            }
        }
        deps
    }

    /// Validate a full row of field values (schema order, primary key excluded)
    pub fn validate_row(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(Error::Validation {
                table: self.table.clone(),
                field: "*".to_string(),
                reason: format!("expected {} values, got {}", self.fields.len(), values.len()),
            });
        }
        for (field, value) in self.fields.iter().zip(values) {
            field.validate(&self.table, value)?;
        }
        Ok(())
    }

    // ========== Statement Templates ==========

    pub fn create_table(&self) -> Statement {
        let mut columns = vec![format!(
            "{} INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
            quote_ident(&self.primary_key)
        )];
        columns.extend(self.fields.iter().map(FieldDef::column_sql));
        Statement::new(format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.table),
            columns.join(", ")
        ))
    }

    pub fn select_all(&self) -> Statement {
        Statement::new(format!("SELECT * FROM {}", quote_ident(&self.table)))
    }

    pub fn select_by_id(&self, id: i64) -> Statement {
        Statement::new(format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(&self.table),
            quote_ident(&self.primary_key)
        ))
        .bind(id)
    }

    pub fn select_where(&self, field: &str, value: Value) -> Statement {
        Statement::new(format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(&self.table),
            quote_ident(field)
        ))
        .bind(value)
    }

    pub fn count(&self) -> Statement {
        Statement::new(format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table)))
    }

    pub fn insert(&self, values: Vec<Value>) -> Statement {
        let names: Vec<String> = self.fields.iter().map(|f| quote_ident(&f.name)).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        Statement::new(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            names.join(", "),
            placeholders.join(", ")
        ))
        .with_params(values)
    }

    pub fn update(&self, field: &str, value: Value, id: i64) -> Statement {
        Statement::new(format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            quote_ident(&self.table),
            quote_ident(field),
            quote_ident(&self.primary_key)
        ))
        .bind(value)
        .bind(id)
    }

    pub fn delete(&self, id: i64) -> Statement {
        Statement::new(format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(&self.table),
            quote_ident(&self.primary_key)
        ))
        .bind(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers() -> EntitySchema {
        EntitySchema::new("Customers")
            .text("fname", 50)
            .text("lname", 50)
            .text("email", 50)
            .integer("points")
    }

    #[test]
    fn test_create_table_sql() {
        let sql = customers().create_table().render();
        assert_eq!(
            sql,
            "CREATE TABLE \"Customers\" (\"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, \
             \"fname\" TEXT(50) NOT NULL, \"lname\" TEXT(50) NOT NULL, \
             \"email\" TEXT(50) NOT NULL, \"points\" INTEGER NOT NULL)"
        );
    }

    #[test]
    fn test_foreign_key_column() {
        let schema = EntitySchema::new("Supplier_Names")
            .references("supplier_id", "Suppliers")
            .text("name", 50);
        let sql = schema.create_table().render();
        assert!(sql.contains("\"supplier_id\" INTEGER NOT NULL REFERENCES \"Suppliers\"(\"id\")"));
        assert_eq!(schema.dependencies(), vec!["Suppliers"]);
    }

    #[test]
    fn test_insert_renders_escaped_literals() {
        let stmt = customers().insert(vec![
            Value::from("O'Brien"),
            Value::from("Smith"),
            Value::from("o@x.com"),
            Value::from(0),
        ]);
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"Customers\" (\"fname\", \"lname\", \"email\", \"points\") VALUES (?1, ?2, ?3, ?4)"
        );
        assert!(stmt.render().contains("'O''Brien'"));
        // The bound value itself is never escaped
        assert_eq!(stmt.params()[0], Value::from("O'Brien"));
    }

    #[test]
    fn test_update_and_delete_templates() {
        let schema = customers();
        assert_eq!(
            schema.update("email", Value::from("a@b.c"), 4).render(),
            "UPDATE \"Customers\" SET \"email\" = 'a@b.c' WHERE \"id\" = 4"
        );
        assert_eq!(
            schema.delete(9).render(),
            "DELETE FROM \"Customers\" WHERE \"id\" = 9"
        );
        assert_eq!(
            schema.with_primary_key("customer_id").select_by_id(2).render(),
            "SELECT * FROM \"Customers\" WHERE \"customer_id\" = 2"
        );
    }

    #[test]
    fn test_validate_length_limit() {
        let schema = customers();
        let fname = schema.field("fname").unwrap();
        assert!(fname.validate("Customers", &Value::from("a".repeat(50))).is_ok());

        let err = fname.validate("Customers", &Value::from("a".repeat(51))).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "fname"));
        assert!(err.to_string().contains("maximum length of 50"));
    }

    #[test]
    fn test_validate_counts_characters() {
        let schema = EntitySchema::new("t").text("name", 3);
        let name = schema.field("name").unwrap();
        assert!(name.validate("t", &Value::from("äöü")).is_ok());
    }

    #[test]
    fn test_validate_kind_mismatch_and_null() {
        let schema = customers();
        let points = schema.field("points").unwrap();
        assert!(points.validate("Customers", &Value::from("ten")).is_err());
        assert!(points.validate("Customers", &Value::Null).is_err());
        assert!(schema.require_field("nickname").is_err());
    }

    #[test]
    fn test_validate_row_arity() {
        let schema = customers();
        assert!(schema.validate_row(&[Value::from("Ann")]).is_err());
    }
}

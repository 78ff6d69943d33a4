//! Generic entity manager
//!
//! One [`EntityManager`] per table. It is parametrized by an [`EntitySchema`]
//! value and by an entity type implementing [`Entity`], and translates CRUD
//! intent into statements against that table:
//! - every text field is validated before any statement is built
//! - values are bound as parameters, never interpolated
//! - every read goes through [`EntityManager::fetch_entities`], which always
//!   closes its cursor

use std::marker::PhantomData;
use crate::schema::{EntitySchema, registry};
use crate::storage::{ColumnKind, Connection, Cursor, Statement};
use crate::value::{Row, Value};
use crate::{Error, Result};

/// Capability interface an entity type provides to its manager.
pub trait Entity: Sized {
    /// Store-assigned primary key; `0` for an entity that was never stored
    fn id(&self) -> i64;

    /// Field values in schema order, primary key excluded
    fn to_row(&self) -> Vec<Value>;

    /// Rebuild an entity from its primary key and field values in schema order
    fn from_row(id: i64, row: &Row) -> Result<Self>;

    /// The null-object check: true when this isn't a real, stored entity
    fn is_null(&self) -> bool {
        self.id() == 0
    }
}

/// CRUD controller for one table, bound to one connection.
pub struct EntityManager<'c, E> {
    conn: &'c Connection,
    schema: EntitySchema,
    _entity: PhantomData<fn() -> E>,
}

impl<'c, E: Entity> EntityManager<'c, E> {
    pub fn new(conn: &'c Connection, schema: EntitySchema) -> Self {
        Self {
            conn,
            schema,
            _entity: PhantomData,
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    // ========== Table Operations ==========

    /// Create the table. Referenced tables must already exist.
    pub fn init_table(&self) -> Result<()> {
        registry::init_table(self.conn, &self.schema)
    }

    /// Create the table unless it exists; returns whether it was created
    pub fn ensure_table(&self) -> Result<bool> {
        if self.conn.table_exists(self.table())? {
            return Ok(false);
        }
        self.init_table()?;
        Ok(true)
    }

    // ========== Validation ==========

    /// Check one value against its field's declared kind and maximum length
    pub fn validate_field(&self, field: &str, value: &Value) -> Result<()> {
        self.schema.require_field(field)?.validate(self.table(), value)
    }

    /// Check a full row of field values
    pub fn validate(&self, values: &[Value]) -> Result<()> {
        self.schema.validate_row(values)
    }

    // ========== Reads ==========

    /// Run `query` and materialize one entity per row.
    ///
    /// Expects `SELECT *` column order: primary key first, then the schema's
    /// fields. The cursor is closed on success and on every error path.
    pub fn fetch_entities(&self, query: &Statement) -> Result<Vec<E>> {
        let table = self.table();
        let fetch_error = |e: Error| Error::Fetch {
            table: table.to_string(),
            reason: e.to_string(),
        };

        let mut cursor = self
            .conn
            .query(query)
            .map_err(|e| Error::execution("query rows", table, e))?;

        cursor.bind_column(1, ColumnKind::Integer).map_err(fetch_error)?;
        for (i, field) in self.schema.fields().iter().enumerate() {
            cursor
                .bind_column(i + 2, field.kind.column_kind())
                .map_err(fetch_error)?;
        }

        match Self::drain(&mut cursor) {
            Ok(entities) => {
                cursor.close().map_err(fetch_error)?;
                Ok(entities)
            }
            Err(e) => {
                tracing::warn!("Fetch from '{}' aborted: {}", table, e);
                if let Err(close_err) = cursor.close() {
                    tracing::debug!("closing cursor after fetch error: {}", close_err);
                }
                Err(fetch_error(e))
            }
        }
    }

    fn drain(cursor: &mut Cursor<'_>) -> Result<Vec<E>> {
        let mut rows = cursor.rows()?;
        let mut entities = Vec::new();
        while let Some(row) = rows.fetch_next()? {
            let (id, fields) = row
                .split_first()
                .ok_or(Error::Storage(rusqlite::Error::InvalidColumnIndex(0)))?;
            let id = Row::new(vec![id]).get_integer(0)?;
            entities.push(E::from_row(id, &fields)?);
        }
        Ok(entities)
    }

    /// Every row, in the store's default order
    pub fn get_all(&self) -> Result<Vec<E>> {
        self.fetch_entities(&self.schema.select_all())
    }

    /// The row with primary key `id`
    pub fn get_by_id(&self, id: i64) -> Result<E> {
        self.fetch_entities(&self.schema.select_by_id(id))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                table: self.table().to_string(),
                id,
            })
    }

    /// Rows whose `field` equals `value`
    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> Result<Vec<E>> {
        self.schema.require_field(field)?;
        self.fetch_entities(&self.schema.select_where(field, value.into()))
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_integer(&self.schema.count())
            .map_err(|e| Error::execution("count rows", self.table(), e))
    }

    // ========== Writes ==========

    /// Insert `entity`'s fields and return it with its new primary key.
    ///
    /// The returned entity carries the caller's values exactly as given.
    pub fn create(&self, entity: &E) -> Result<E> {
        let values = entity.to_row();
        self.schema.validate_row(&values)?;

        let stmt = self.schema.insert(values.clone());
        self.conn
            .execute(&stmt)
            .map_err(|e| Error::execution("insert row", self.table(), e))?;

        let id = self.conn.last_inserted_id();
        E::from_row(id, &Row::new(values))
    }

    /// Set one field of the row with primary key `id`.
    ///
    /// Fails with [`Error::Execution`] if no row matched.
    pub fn update_field(&self, id: i64, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.validate_field(field, &value)?;

        let operation = format!("update {} of id {}", field, id);
        let changed = self
            .conn
            .execute(&self.schema.update(field, value, id))
            .map_err(|e| Error::execution(operation.as_str(), self.table(), e))?;
        if changed == 0 {
            return Err(Error::execution(operation, self.table(), "no row matched"));
        }
        Ok(())
    }

    /// Delete the row with primary key `id`.
    ///
    /// Fails with [`Error::Execution`] if no row matched.
    pub fn delete(&self, id: i64) -> Result<()> {
        let operation = format!("delete id {}", id);
        let changed = self
            .conn
            .execute(&self.schema.delete(id))
            .map_err(|e| Error::execution(operation.as_str(), self.table(), e))?;
        if changed == 0 {
            return Err(Error::execution(operation, self.table(), "no row matched"));
        }
        Ok(())
    }
}

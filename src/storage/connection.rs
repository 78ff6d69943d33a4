//! SQLite connection implementation

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use rusqlite::{OptionalExtension, params_from_iter};
use rusqlite::types::ValueRef;
use super::statement::Statement;
use crate::value::{Row, Value};
use crate::{Error, Result};

/// Decoder applied to one output column of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Text => "text",
        }
    }

    /// Decode column `idx` (0-based) of the current native row.
    fn decode(self, row: &rusqlite::Row<'_>, idx: usize) -> Result<Value> {
        let raw = row.get_ref(idx)?;
        match (self, raw) {
            (_, ValueRef::Null) => Ok(Value::Null),
            (ColumnKind::Integer, ValueRef::Integer(i)) => Ok(Value::Integer(i)),
            (ColumnKind::Text, ValueRef::Text(bytes)) => {
                Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned()))
            }
            (ColumnKind::Text, ValueRef::Integer(i)) => Ok(Value::Text(i.to_string())),
            (ColumnKind::Text, ValueRef::Real(f)) => Ok(Value::Text(f.to_string())),
            (kind, other) => Err(Error::Storage(rusqlite::Error::InvalidColumnType(
                idx,
                kind.as_str().to_string(),
                other.data_type(),
            ))),
        }
    }
}

/// Connection to the store: one native handle plus the data directory its
/// databases live in.
pub struct Connection {
    conn: rusqlite::Connection,
    data_dir: Option<PathBuf>,
    database: Option<String>,
    open_cursors: Cell<usize>,
}

impl Connection {
    /// Open a database file directly (creates it if missing)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = native_open(path)?;
        Ok(Self {
            conn,
            data_dir: path.parent().map(Path::to_path_buf),
            database: path.file_stem().map(|s| s.to_string_lossy().to_string()),
            open_cursors: Cell::new(0),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| Error::Connection(format!("in-memory database: {}", e)))?;
        Ok(Self {
            conn: configure(conn)?,
            data_dir: None,
            database: None,
            open_cursors: Cell::new(0),
        })
    }

    /// Open a session on `data_dir` that is not yet positioned on a database.
    ///
    /// Use [`Connection::use_database`] to select one.
    pub fn connect(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            Error::Connection(format!("data directory {}: {}", data_dir.display(), e))
        })?;
        let mut conn = Self::open_in_memory()?;
        conn.data_dir = Some(data_dir.to_path_buf());
        Ok(conn)
    }

    /// Execute one DDL/DML statement, returning the number of affected rows
    pub fn execute(&self, stmt: &Statement) -> Result<usize> {
        tracing::debug!("execute: {}", stmt);
        let changed = self.conn.execute(stmt.sql(), params_from_iter(stmt.params().iter()))?;
        Ok(changed)
    }

    /// Prepare a row-returning statement and open a cursor on it
    pub fn query(&self, stmt: &Statement) -> Result<Cursor<'_>> {
        tracing::debug!("query: {}", stmt);
        let prepared = self.conn.prepare(stmt.sql())?;
        self.open_cursors.set(self.open_cursors.get() + 1);
        Ok(Cursor {
            stmt: prepared,
            params: stmt.params().to_vec(),
            bindings: BTreeMap::new(),
            slot: CursorSlot(&self.open_cursors),
        })
    }

    /// Run a query that yields a single integer (e.g. `COUNT(*)`)
    pub fn query_integer(&self, stmt: &Statement) -> Result<i64> {
        tracing::debug!("query: {}", stmt);
        let value = self.conn.query_row(
            stmt.sql(),
            params_from_iter(stmt.params().iter()),
            |row| row.get(0),
        )?;
        Ok(value)
    }

    /// Row id of the most recent successful insert on this connection.
    ///
    /// Only meaningful immediately after that insert.
    pub fn last_inserted_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Number of cursors currently open on this connection
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.get()
    }

    // ========== Catalog & Session Operations ==========

    /// Check whether a table exists in the current database
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Check whether a database file exists in the data directory
    pub fn database_exists(&self, name: &str) -> Result<bool> {
        Ok(self.database_path(name)?.exists())
    }

    /// Create an empty database file in the data directory
    pub fn create_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;
        if path.exists() {
            return Err(Error::execution("create database", name, "database already exists"));
        }

        let conn = native_open(&path)?;
        // Writes the header page so the file is materialized on disk
        conn.execute_batch("PRAGMA user_version = 1")?;
        conn.close().map_err(|(_, e)| Error::Storage(e))?;

        tracing::info!("Created database '{}' at {}", name, path.display());
        Ok(())
    }

    /// Re-position this session onto an existing database.
    ///
    /// Takes `&mut self`, so no cursor or manager can be alive across the switch.
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;
        if !path.exists() {
            return Err(Error::execution("use database", name, "database does not exist"));
        }

        self.conn = native_open(&path)?;
        self.database = Some(name.to_string());
        tracing::info!("Using database '{}'", name);
        Ok(())
    }

    /// Name of the database this session is positioned on
    pub fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn database_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Connection(format!("invalid database name '{}'", name)));
        }
        let dir = self
            .data_dir
            .as_ref()
            .ok_or_else(|| Error::Connection("connection has no data directory".to_string()))?;
        Ok(dir.join(format!("{}.db", name)))
    }
}

fn native_open(path: &Path) -> Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)
        .map_err(|e| Error::Connection(format!("{}: {}", path.display(), e)))?;
    configure(conn)
}

fn configure(conn: rusqlite::Connection) -> Result<rusqlite::Connection> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(|e| Error::Connection(format!("enabling foreign keys: {}", e)))?;
    Ok(conn)
}

/// Keeps the connection's open-cursor count honest on every exit path.
struct CursorSlot<'c>(&'c Cell<usize>);

impl Drop for CursorSlot<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
        tracing::debug!("cursor closed");
    }
}

/// An open result cursor over one prepared query.
///
/// Bind output columns with [`Cursor::bind_column`], then iterate with
/// [`Cursor::rows`]. Closing consumes the cursor; dropping it closes it too.
pub struct Cursor<'c> {
    stmt: rusqlite::Statement<'c>,
    params: Vec<Value>,
    bindings: BTreeMap<usize, ColumnKind>,
    slot: CursorSlot<'c>,
}

impl<'c> Cursor<'c> {
    /// Number of columns in the result set
    pub fn column_count(&self) -> usize {
        self.stmt.column_count()
    }

    /// Associate a decoder with a 1-based column position. Rebinding replaces.
    pub fn bind_column(&mut self, index: usize, kind: ColumnKind) -> Result<()> {
        if index == 0 || index > self.column_count() {
            return Err(Error::Storage(rusqlite::Error::InvalidColumnIndex(index)));
        }
        self.bindings.insert(index, kind);
        Ok(())
    }

    /// Run the query; rows yield the bound columns in ascending position order.
    pub fn rows(&mut self) -> Result<ResultSet<'_>> {
        let Self { stmt, params, bindings, .. } = self;
        let rows = stmt.query(params_from_iter(params.iter()))?;
        Ok(ResultSet { rows, bindings: &*bindings })
    }

    /// Release the cursor's resources
    pub fn close(self) -> Result<()> {
        let Self { stmt, slot, .. } = self;
        let result = stmt.finalize();
        drop(slot);
        result.map_err(Into::into)
    }
}

/// Row-by-row view over an executing cursor.
pub struct ResultSet<'s> {
    rows: rusqlite::Rows<'s>,
    bindings: &'s BTreeMap<usize, ColumnKind>,
}

impl ResultSet<'_> {
    /// Advance by one row.
    ///
    /// `Ok(Some(_))` is a row, `Ok(None)` means no more rows, `Err(_)` is a fetch error.
    pub fn fetch_next(&mut self) -> Result<Option<Row>> {
        let Some(row) = self.rows.next()? else {
            return Ok(None);
        };

        let mut values = Vec::with_capacity(self.bindings.len());
        for (&index, kind) in self.bindings {
            values.push(kind.decode(row, index - 1)?);
        }
        Ok(Some(Row::new(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(conn: &Connection) {
        conn.execute(&Statement::new(
            "CREATE TABLE people (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, age INTEGER NOT NULL)",
        ))
        .unwrap();
        for (name, age) in [("Ann", 30), ("O'Brien", 41)] {
            conn.execute(
                &Statement::new("INSERT INTO people (name, age) VALUES (?1, ?2)")
                    .bind(name)
                    .bind(age),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_execute_and_last_inserted_id() {
        let conn = Connection::open_in_memory().unwrap();
        people(&conn);
        assert_eq!(conn.last_inserted_id(), 2);

        let changed = conn
            .execute(&Statement::new("UPDATE people SET age = age + 1"))
            .unwrap();
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_cursor_fetch_loop() {
        let conn = Connection::open_in_memory().unwrap();
        people(&conn);

        let mut cursor = conn.query(&Statement::new("SELECT * FROM people ORDER BY id")).unwrap();
        assert_eq!(cursor.column_count(), 3);
        assert_eq!(conn.open_cursors(), 1);
        cursor.bind_column(1, ColumnKind::Integer).unwrap();
        cursor.bind_column(2, ColumnKind::Text).unwrap();
        cursor.bind_column(3, ColumnKind::Integer).unwrap();

        let mut fetched = Vec::new();
        {
            let mut rows = cursor.rows().unwrap();
            while let Some(row) = rows.fetch_next().unwrap() {
                fetched.push(row);
            }
        }
        cursor.close().unwrap();

        assert_eq!(conn.open_cursors(), 0);
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[1].get_text(1).unwrap(), "O'Brien");
        assert_eq!(fetched[1].get_integer(2).unwrap(), 41);
    }

    #[test]
    fn test_bind_column_out_of_range() {
        let conn = Connection::open_in_memory().unwrap();
        people(&conn);

        let mut cursor = conn.query(&Statement::new("SELECT name FROM people")).unwrap();
        assert!(cursor.bind_column(0, ColumnKind::Text).is_err());
        assert!(cursor.bind_column(2, ColumnKind::Text).is_err());
        assert!(cursor.bind_column(1, ColumnKind::Text).is_ok());
    }

    #[test]
    fn test_text_binding_over_integer_column() {
        let conn = Connection::open_in_memory().unwrap();
        people(&conn);

        let mut cursor = conn
            .query(&Statement::new("SELECT age FROM people WHERE id = ?1").bind(1))
            .unwrap();
        cursor.bind_column(1, ColumnKind::Text).unwrap();
        let mut rows = cursor.rows().unwrap();
        let row = rows.fetch_next().unwrap().unwrap();
        assert_eq!(row.get_text(0).unwrap(), "30");
        assert!(rows.fetch_next().unwrap().is_none());
    }

    #[test]
    fn test_integer_binding_over_text_is_fetch_error() {
        let conn = Connection::open_in_memory().unwrap();
        people(&conn);

        let mut cursor = conn.query(&Statement::new("SELECT name FROM people")).unwrap();
        cursor.bind_column(1, ColumnKind::Integer).unwrap();
        let mut rows = cursor.rows().unwrap();
        assert!(rows.fetch_next().is_err());
    }

    #[test]
    fn test_dropped_cursor_is_closed() {
        let conn = Connection::open_in_memory().unwrap();
        people(&conn);
        {
            let _a = conn.query(&Statement::new("SELECT * FROM people")).unwrap();
            let _b = conn.query(&Statement::new("SELECT * FROM people")).unwrap();
            assert_eq!(conn.open_cursors(), 2);
        }
        assert_eq!(conn.open_cursors(), 0);
    }

    #[test]
    fn test_open_file_positions_on_database() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(&dir.path().join("shop.db")).unwrap();
        assert_eq!(conn.current_database(), Some("shop"));
        assert!(conn.database_exists("shop").unwrap());
    }

    #[test]
    fn test_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!conn.table_exists("people").unwrap());
        people(&conn);
        assert!(conn.table_exists("people").unwrap());
    }

    #[test]
    fn test_database_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = Connection::connect(dir.path()).unwrap();
        assert!(conn.current_database().is_none());
        assert!(!conn.database_exists("sample_store").unwrap());

        conn.create_database("sample_store").unwrap();
        assert!(conn.database_exists("sample_store").unwrap());
        assert!(matches!(
            conn.create_database("sample_store"),
            Err(Error::Execution { .. })
        ));

        conn.use_database("sample_store").unwrap();
        assert_eq!(conn.current_database(), Some("sample_store"));
        people(&conn);

        // A fresh session on the same data dir sees the table
        let mut other = Connection::connect(dir.path()).unwrap();
        other.use_database("sample_store").unwrap();
        assert!(other.table_exists("people").unwrap());
    }

    #[test]
    fn test_database_name_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = Connection::connect(dir.path()).unwrap();
        assert!(matches!(conn.database_exists("../x"), Err(Error::Connection(_))));
        assert!(matches!(conn.use_database("missing"), Err(Error::Execution { .. })));

        let memory = Connection::open_in_memory().unwrap();
        assert!(matches!(memory.database_exists("x"), Err(Error::Connection(_))));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(&Statement::new("CREATE TABLE a (id INTEGER PRIMARY KEY)")).unwrap();
        conn.execute(&Statement::new(
            "CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER NOT NULL REFERENCES a(id))",
        ))
        .unwrap();
        let result = conn.execute(&Statement::new("INSERT INTO b (a_id) VALUES (?1)").bind(99));
        assert!(result.is_err());
    }
}

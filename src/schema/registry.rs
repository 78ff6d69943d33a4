//! Table dependency registry
//!
//! A referencing table can only be created once the table it references exists.
//! The graph records "A must precede B" pairs (one per foreign key, plus any
//! registered by hand) and yields a deterministic creation order.

use std::collections::{HashMap, HashSet};
use super::EntitySchema;
use crate::storage::Connection;
use crate::{Error, Result};

/// Directed "must precede" pairs between tables.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Tables in registration order (used to break ties)
    tables: Vec<String>,
    /// table -> tables that must exist before it
    depends_on: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every schema's table and one edge per declared foreign key
    pub fn from_schemas(schemas: &[&EntitySchema]) -> Self {
        let mut graph = Self::new();
        for schema in schemas {
            graph.add_table(schema.table());
        }
        for schema in schemas {
            for dep in schema.dependencies() {
                graph.must_precede(dep, schema.table());
            }
        }
        graph
    }

    pub fn add_table(&mut self, table: &str) {
        if !self.tables.iter().any(|t| t == table) {
            self.tables.push(table.to_string());
        }
    }

    /// Record that `before` must be initialized before `after`
    pub fn must_precede(&mut self, before: &str, after: &str) {
        let deps = self.depends_on.entry(after.to_string()).or_default();
        if !deps.iter().any(|d| d == before) {
            deps.push(before.to_string());
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// All (before, after) pairs
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges = Vec::new();
        for table in &self.tables {
            if let Some(deps) = self.depends_on.get(table) {
                for dep in deps {
                    edges.push((dep.as_str(), table.as_str()));
                }
            }
        }
        edges
    }

    /// Dependencies of `table` that are registered in this graph
    fn known_deps(&self, table: &str) -> Vec<&str> {
        self.depends_on
            .get(table)
            .map(|deps| {
                deps.iter()
                    .filter(|d| self.tables.contains(*d))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fail with [`Error::DependencyCycle`] if the registered tables form a cycle.
    pub fn check_cycles(&self) -> Result<()> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for table in &self.tables {
            if !visited.contains(table.as_str())
                && self.detect_cycle_dfs(table, &mut visited, &mut rec_stack, &mut path)
            {
                return Err(Error::DependencyCycle(
                    path.into_iter().map(str::to_string).collect(),
                ));
            }
        }
        Ok(())
    }

    fn detect_cycle_dfs<'a>(
        &'a self,
        table: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> bool {
        visited.insert(table);
        rec_stack.insert(table);
        path.push(table);

        for dep in self.known_deps(table) {
            if !visited.contains(dep) {
                if self.detect_cycle_dfs(dep, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(dep) {
                // Only the tables on the cycle itself, not the ones leading into it
                if let Some(start) = path.iter().position(|t| *t == dep) {
                    path.drain(..start);
                }
                path.push(dep);
                return true;
            }
        }

        rec_stack.remove(table);
        path.pop();
        false
    }

    /// Topological creation order. Ties keep registration order.
    ///
    /// Edges to unregistered tables are ignored here; those tables are expected
    /// to exist already.
    pub fn init_order(&self) -> Result<Vec<String>> {
        self.check_cycles()?;

        let mut done: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.tables.len());

        while order.len() < self.tables.len() {
            let next = self
                .tables
                .iter()
                .find(|t| {
                    !done.contains(t.as_str())
                        && self.known_deps(t).iter().all(|d| done.contains(d))
                })
                .ok_or_else(|| Error::DependencyCycle(self.tables.clone()))?;
            done.insert(next);
            order.push(next.clone());
        }
        Ok(order)
    }
}

/// Create `schema`'s table, refusing if any referenced table is missing.
pub fn init_table(conn: &Connection, schema: &EntitySchema) -> Result<()> {
    let table = schema.table();
    for dep in schema.dependencies() {
        let exists = conn.table_exists(dep).map_err(|e| Error::Schema {
            table: table.to_string(),
            reason: e.to_string(),
        })?;
        if !exists {
            return Err(Error::Schema {
                table: table.to_string(),
                reason: format!("referenced table '{}' does not exist", dep),
            });
        }
    }

    conn.execute(&schema.create_table()).map_err(|e| Error::Schema {
        table: table.to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!("Initialized table '{}'", table);
    Ok(())
}

/// Create every missing table among `schemas`, in dependency order.
///
/// Returns the names of the tables that were created.
pub fn bootstrap(conn: &Connection, schemas: &[&EntitySchema]) -> Result<Vec<String>> {
    let graph = DependencyGraph::from_schemas(schemas);
    let by_name: HashMap<&str, &EntitySchema> =
        schemas.iter().map(|s| (s.table(), *s)).collect();

    let mut created = Vec::new();
    for table in graph.init_order()? {
        if conn.table_exists(&table)? {
            tracing::debug!("Table '{}' already exists", table);
            continue;
        }
        if let Some(schema) = by_name.get(table.as_str()) {
            init_table(conn, schema)?;
            created.push(table);
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suppliers() -> EntitySchema {
        EntitySchema::new("Suppliers").text("company", 50)
    }

    fn supplier_names() -> EntitySchema {
        EntitySchema::new("Supplier_Names")
            .references("supplier_id", "Suppliers")
            .text("name", 50)
    }

    #[test]
    fn test_init_order_follows_foreign_keys() {
        let names = supplier_names();
        let sups = suppliers();
        let graph = DependencyGraph::from_schemas(&[&names, &sups]);
        assert_eq!(graph.edges(), vec![("Suppliers", "Supplier_Names")]);
        assert_eq!(graph.init_order().unwrap(), vec!["Suppliers", "Supplier_Names"]);
    }

    #[test]
    fn test_init_order_keeps_registration_order_for_independent_tables() {
        let mut graph = DependencyGraph::new();
        for t in ["c", "a", "b"] {
            graph.add_table(t);
        }
        graph.must_precede("b", "c");
        assert_eq!(graph.init_order().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = DependencyGraph::new();
        graph.add_table("a");
        graph.add_table("b");
        graph.must_precede("a", "b");
        graph.must_precede("b", "a");

        let err = graph.init_order().unwrap_err();
        match err {
            Error::DependencyCycle(path) => {
                assert_eq!(path.first(), path.last());
                assert!(path.len() >= 3);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_cycle_path_excludes_tables_leading_into_it() {
        let mut graph = DependencyGraph::new();
        graph.add_table("c");
        graph.add_table("a");
        graph.add_table("b");
        graph.must_precede("a", "c");
        graph.must_precede("b", "a");
        graph.must_precede("a", "b");

        let err = graph.init_order().unwrap_err();
        match err {
            Error::DependencyCycle(path) => {
                assert!(!path.contains(&"c".to_string()), "path was {path:?}");
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 3);
            }
            other => panic!("expected cycle, got {other}"),
        }
        assert_eq!(
            graph.check_cycles().unwrap_err().to_string(),
            "Table dependency cycle: a -> b -> a"
        );
    }

    #[test]
    fn test_unregistered_dependency_ignored_for_ordering() {
        let names = supplier_names();
        let graph = DependencyGraph::from_schemas(&[&names]);
        assert_eq!(graph.init_order().unwrap(), vec!["Supplier_Names"]);
    }

    #[test]
    fn test_init_table_requires_referenced_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = init_table(&conn, &supplier_names()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(!conn.table_exists("Supplier_Names").unwrap());

        init_table(&conn, &suppliers()).unwrap();
        init_table(&conn, &supplier_names()).unwrap();
        assert!(conn.table_exists("Supplier_Names").unwrap());
    }

    #[test]
    fn test_init_table_twice_is_schema_error() {
        let conn = Connection::open_in_memory().unwrap();
        init_table(&conn, &suppliers()).unwrap();
        assert!(matches!(
            init_table(&conn, &suppliers()),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_bootstrap_creates_missing_tables_in_order() {
        let conn = Connection::open_in_memory().unwrap();
        let names = supplier_names();
        let sups = suppliers();

        let created = bootstrap(&conn, &[&names, &sups]).unwrap();
        assert_eq!(created, vec!["Suppliers", "Supplier_Names"]);

        // Second run finds everything in place
        assert!(bootstrap(&conn, &[&names, &sups]).unwrap().is_empty());
    }
}

//! Retail-store entities
//!
//! - `Customer`: customers with loyalty points
//! - `Supplier`: companies the store buys from
//! - `SupplierName`: contact names, each referencing a supplier
//!
//! `Supplier_Names` references `Suppliers`, so suppliers must be initialized first.

pub mod customer;
pub mod supplier;

pub use customer::{Customer, CustomerManager};
pub use supplier::{Supplier, SupplierManager, SupplierName, SupplierNameManager};

use crate::schema::EntitySchema;

/// Table names for the retail-store entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTables {
    pub customers: String,
    pub suppliers: String,
    pub supplier_names: String,
}

impl Default for StoreTables {
    fn default() -> Self {
        Self {
            customers: "Customers".to_string(),
            suppliers: "Suppliers".to_string(),
            supplier_names: "Supplier_Names".to_string(),
        }
    }
}

impl StoreTables {
    /// All schemas, in no particular order; bootstrap sorts them
    pub fn schemas(&self) -> Vec<EntitySchema> {
        vec![
            Customer::schema(&self.customers),
            SupplierName::schema(&self.supplier_names, &self.suppliers),
            Supplier::schema(&self.suppliers),
        ]
    }
}

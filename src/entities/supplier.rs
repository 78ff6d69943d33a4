//! Supplier and supplier-name entities
//!
//! Each supplier can have any number of contact names. Names reference their
//! supplier's id, so the supplier table must exist first and a supplier's names
//! must be removed before the supplier itself.

use serde::{Deserialize, Serialize};
use crate::manager::{Entity, EntityManager};
use crate::schema::EntitySchema;
use crate::value::{Row, Value};
use crate::Result;

pub const MAX_COMPANY_LENGTH: usize = 50;
pub const MAX_SUPPLIER_EMAIL_LENGTH: usize = 50;
pub const MAX_CONTACT_NAME_LENGTH: usize = 50;

/// A company the store buys from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub company: String,
    pub email: String,
}

impl Supplier {
    pub fn new(company: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            company: company.into(),
            email: email.into(),
        }
    }

    pub fn schema(table: &str) -> EntitySchema {
        EntitySchema::new(table)
            .text("company", MAX_COMPANY_LENGTH)
            .text("email", MAX_SUPPLIER_EMAIL_LENGTH)
    }
}

impl Entity for Supplier {
    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![Value::from(self.company.as_str()), Value::from(self.email.as_str())]
    }

    fn from_row(id: i64, row: &Row) -> Result<Self> {
        Ok(Self {
            id,
            company: row.get_text(0)?,
            email: row.get_text(1)?,
        })
    }
}

impl std::fmt::Display for Supplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Supplier ID({}), company({}), email({})/>",
            self.id, self.company, self.email
        )
    }
}

/// A contact name belonging to one supplier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierName {
    pub id: i64,
    pub supplier_id: i64,
    pub name: String,
}

impl SupplierName {
    pub fn new(supplier_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            supplier_id,
            name: name.into(),
        }
    }

    /// Schema for the names table, referencing `suppliers_table`
    pub fn schema(table: &str, suppliers_table: &str) -> EntitySchema {
        EntitySchema::new(table)
            .references("supplier_id", suppliers_table)
            .text("name", MAX_CONTACT_NAME_LENGTH)
    }
}

impl Entity for SupplierName {
    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![Value::from(self.supplier_id), Value::from(self.name.as_str())]
    }

    fn from_row(id: i64, row: &Row) -> Result<Self> {
        Ok(Self {
            id,
            supplier_id: row.get_integer(0)?,
            name: row.get_text(1)?,
        })
    }
}

impl std::fmt::Display for SupplierName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<SupplierName ID({}), supplier({}), name({})/>",
            self.id, self.supplier_id, self.name
        )
    }
}

pub type SupplierManager<'c> = EntityManager<'c, Supplier>;
pub type SupplierNameManager<'c> = EntityManager<'c, SupplierName>;

impl EntityManager<'_, Supplier> {
    pub fn update_company(&self, id: i64, company: &str) -> Result<()> {
        self.update_field(id, "company", company)
    }

    pub fn update_email(&self, id: i64, email: &str) -> Result<()> {
        self.update_field(id, "email", email)
    }

    /// Create a supplier together with its contact names.
    ///
    /// Names are validated up front so an over-long name never leaves a
    /// supplier behind.
    pub fn create_with_names(
        &self,
        names: &SupplierNameManager<'_>,
        supplier: &Supplier,
        contact_names: &[&str],
    ) -> Result<(Supplier, Vec<SupplierName>)> {
        for name in contact_names {
            names.validate_field("name", &Value::from(*name))?;
        }

        let supplier = self.create(supplier)?;
        let mut created = Vec::with_capacity(contact_names.len());
        for name in contact_names {
            created.push(names.create(&SupplierName::new(supplier.id, *name))?);
        }
        Ok((supplier, created))
    }

    /// Delete a supplier after removing its contact names; returns how many
    /// names were removed.
    pub fn delete_with_names(&self, names: &SupplierNameManager<'_>, id: i64) -> Result<usize> {
        let owned = names.names_of(id)?;
        for name in &owned {
            names.delete(name.id)?;
        }
        self.delete(id)?;
        Ok(owned.len())
    }
}

impl EntityManager<'_, SupplierName> {
    /// Contact names belonging to `supplier_id`
    pub fn names_of(&self, supplier_id: i64) -> Result<Vec<SupplierName>> {
        self.find_by("supplier_id", supplier_id)
    }

    pub fn update_name(&self, id: i64, name: &str) -> Result<()> {
        self.update_field(id, "name", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Connection;
    use crate::Error;

    fn managers(conn: &Connection) -> (SupplierManager<'_>, SupplierNameManager<'_>) {
        let suppliers = SupplierManager::new(conn, Supplier::schema("Suppliers"));
        let names = SupplierNameManager::new(conn, SupplierName::schema("Supplier_Names", "Suppliers"));
        (suppliers, names)
    }

    #[test]
    fn test_names_table_requires_suppliers_first() {
        let conn = Connection::open_in_memory().unwrap();
        let (suppliers, names) = managers(&conn);

        assert!(matches!(names.init_table(), Err(Error::Schema { .. })));
        suppliers.init_table().unwrap();
        names.init_table().unwrap();
    }

    #[test]
    fn test_create_with_names() {
        let conn = Connection::open_in_memory().unwrap();
        let (suppliers, names) = managers(&conn);
        suppliers.init_table().unwrap();
        names.init_table().unwrap();

        let (acme, contacts) = suppliers
            .create_with_names(&names, &Supplier::new("Acme", "sales@acme.com"), &["Wile", "Road Runner"])
            .unwrap();
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|c| c.supplier_id == acme.id));
        assert_eq!(names.names_of(acme.id).unwrap(), contacts);

        let long = "n".repeat(MAX_CONTACT_NAME_LENGTH + 1);
        let err = suppliers
            .create_with_names(&names, &Supplier::new("Globex", "g@globex.com"), &[long.as_str()])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(suppliers.count().unwrap(), 1);
    }

    #[test]
    fn test_name_with_unknown_supplier_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let (suppliers, names) = managers(&conn);
        suppliers.init_table().unwrap();
        names.init_table().unwrap();

        let err = names.create(&SupplierName::new(42, "Nobody")).unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
        assert!(names.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_delete_with_names() {
        let conn = Connection::open_in_memory().unwrap();
        let (suppliers, names) = managers(&conn);
        suppliers.init_table().unwrap();
        names.init_table().unwrap();

        let (acme, _) = suppliers
            .create_with_names(&names, &Supplier::new("Acme", "sales@acme.com"), &["Wile"])
            .unwrap();

        // Referenced rows block a plain delete
        assert!(matches!(suppliers.delete(acme.id), Err(Error::Execution { .. })));

        assert_eq!(suppliers.delete_with_names(&names, acme.id).unwrap(), 1);
        assert!(suppliers.get_all().unwrap().is_empty());
        assert!(names.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_supplier_fields() {
        let conn = Connection::open_in_memory().unwrap();
        let (suppliers, names) = managers(&conn);
        suppliers.init_table().unwrap();
        names.init_table().unwrap();

        let (acme, contacts) = suppliers
            .create_with_names(&names, &Supplier::new("Acme", "sales@acme.com"), &["Wile"])
            .unwrap();
        suppliers.update_company(acme.id, "Acme Corp").unwrap();
        suppliers.update_email(acme.id, "hello@acme.com").unwrap();
        names.update_name(contacts[0].id, "Wile E.").unwrap();

        let acme = suppliers.get_by_id(acme.id).unwrap();
        assert_eq!(acme.to_string(), format!("<Supplier ID({}), company(Acme Corp), email(hello@acme.com)/>", acme.id));
        assert_eq!(names.get_by_id(contacts[0].id).unwrap().name, "Wile E.");
    }
}

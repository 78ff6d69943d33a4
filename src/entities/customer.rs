//! Customer entity and its manager

use serde::{Deserialize, Serialize};
use crate::manager::{Entity, EntityManager};
use crate::schema::EntitySchema;
use crate::value::{Row, Value};
use crate::Result;

/// Maximum lengths of the customer text columns.
///
/// Changing these only affects tables created afterwards.
pub const MAX_FNAME_LENGTH: usize = 50;
pub const MAX_LNAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 50;

/// A store customer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub fname: String,
    pub lname: String,
    pub email: String,
    pub points: i64,
}

impl Customer {
    /// A customer not yet stored (id 0)
    pub fn new(
        fname: impl Into<String>,
        lname: impl Into<String>,
        email: impl Into<String>,
        points: i64,
    ) -> Self {
        Self {
            id: 0,
            fname: fname.into(),
            lname: lname.into(),
            email: email.into(),
            points,
        }
    }

    pub fn schema(table: &str) -> EntitySchema {
        EntitySchema::new(table)
            .text("fname", MAX_FNAME_LENGTH)
            .text("lname", MAX_LNAME_LENGTH)
            .text("email", MAX_EMAIL_LENGTH)
            .integer("points")
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.fname, self.lname)
    }
}

impl Entity for Customer {
    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.fname.as_str()),
            Value::from(self.lname.as_str()),
            Value::from(self.email.as_str()),
            Value::from(self.points),
        ]
    }

    fn from_row(id: i64, row: &Row) -> Result<Self> {
        Ok(Self {
            id,
            fname: row.get_text(0)?,
            lname: row.get_text(1)?,
            email: row.get_text(2)?,
            points: row.get_integer(3)?,
        })
    }
}

impl std::fmt::Display for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Customer ID({}), fname({}), lname({}), email({}), points({})/>",
            self.id, self.fname, self.lname, self.email, self.points
        )
    }
}

pub type CustomerManager<'c> = EntityManager<'c, Customer>;

impl EntityManager<'_, Customer> {
    pub fn create_customer(&self, fname: &str, lname: &str, email: &str, points: i64) -> Result<Customer> {
        self.create(&Customer::new(fname, lname, email, points))
    }

    pub fn update_first_name(&self, id: i64, fname: &str) -> Result<()> {
        self.update_field(id, "fname", fname)
    }

    pub fn update_last_name(&self, id: i64, lname: &str) -> Result<()> {
        self.update_field(id, "lname", lname)
    }

    pub fn update_email(&self, id: i64, email: &str) -> Result<()> {
        self.update_field(id, "email", email)
    }

    pub fn update_points(&self, id: i64, points: i64) -> Result<()> {
        self.update_field(id, "points", points)
    }
}

use tabled::{settings::Style, Table, Tabled};
use crate::entities::{Customer, Supplier, SupplierName};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub metric: String,
    #[tabled(rename = "Rows")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "First name")]
    fname: String,
    #[tabled(rename = "Last name")]
    lname: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Points")]
    points: i64,
}

pub fn customers_table(customers: &[Customer]) -> String {
    let rows: Vec<CustomerRow> = customers
        .iter()
        .map(|c| CustomerRow {
            id: c.id,
            fname: c.fname.clone(),
            lname: c.lname.clone(),
            email: c.email.clone(),
            points: c.points,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct SupplierRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Contacts")]
    contacts: String,
}

pub fn suppliers_table(suppliers: &[(Supplier, Vec<SupplierName>)]) -> String {
    let rows: Vec<SupplierRow> = suppliers
        .iter()
        .map(|(s, names)| SupplierRow {
            id: s.id,
            company: s.company.clone(),
            email: s.email.clone(),
            contacts: names
                .iter()
                .map(|n| n.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

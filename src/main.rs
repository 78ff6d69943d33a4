//! Rowkeeper CLI - retail-store records over SQLite

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use rowkeeper::config::{self, RowkeeperConfig};
use rowkeeper::entities::{
    Customer, CustomerManager, StoreTables, Supplier, SupplierManager, SupplierName,
    SupplierNameManager,
};
use rowkeeper::schema::EntitySchema;
use rowkeeper::ui::{self, Icons};
use rowkeeper::{Connection, bootstrap};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rowkeeper")]
#[command(version)]
#[command(about = "Manage retail-store customers and suppliers stored in SQLite")]
#[command(long_about = r#"
Rowkeeper keeps customers, suppliers and supplier contact names in a SQLite
database. Missing tables are created on every run, suppliers before their names.

Example usage:
  rowkeeper init
  rowkeeper customers add Ann Lee ann@x.com 10
  rowkeeper customers set 1 points 25
  rowkeeper suppliers add Acme sales@acme.com --name Wile --name "Road Runner"
"#)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the database files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Database name
    #[arg(long, global = true)]
    database: Option<String>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default rowkeeper.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Create the database and any missing tables
    Setup,

    /// Manage customers
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },

    /// Manage suppliers and their contact names
    Suppliers {
        #[command(subcommand)]
        action: SupplierAction,
    },

    /// Show row counts per table
    Stats,
}

#[derive(Subcommand)]
enum CustomerAction {
    /// List all customers
    List,
    /// Show one customer
    Get { id: i64 },
    /// Add a customer
    Add {
        fname: String,
        lname: String,
        email: String,
        #[arg(default_value = "0")]
        points: i64,
    },
    /// Change one field of a customer
    Set {
        id: i64,
        field: CustomerField,
        value: String,
    },
    /// Delete a customer
    Delete { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum CustomerField {
    Fname,
    Lname,
    Email,
    Points,
}

#[derive(Subcommand)]
enum SupplierAction {
    /// List all suppliers with their contact names
    List,
    /// Show one supplier
    Get { id: i64 },
    /// Add a supplier
    Add {
        company: String,
        email: String,
        /// Contact name (repeatable)
        #[arg(short, long = "name")]
        names: Vec<String>,
    },
    /// Change one field of a supplier
    Set {
        id: i64,
        field: SupplierField,
        value: String,
    },
    /// Add a contact name to a supplier
    AddName { supplier_id: i64, name: String },
    /// Delete a supplier and its contact names
    Delete { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum SupplierField {
    Company,
    Email,
}

/// Effective settings: CLI flags over config file over defaults
struct Settings {
    data_dir: PathBuf,
    database: String,
    tables: StoreTables,
    json: bool,
}

impl Settings {
    fn resolve(args: &GlobalArgs) -> anyhow::Result<Self> {
        let file = config::load_config(args.config.as_deref())?.unwrap_or_default();
        Ok(Self {
            data_dir: args.data_dir.clone().unwrap_or_else(|| file.data_dir()),
            database: args.database.clone().unwrap_or_else(|| file.database().to_string()),
            tables: file.store_tables(),
            json: args.json,
        })
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.global.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<rowkeeper::Error>() {
            Some(err) if !err.is_fatal() => ui::warn(&format!("{:#}", e)),
            _ => ui::error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let path = cli.global.config.clone().unwrap_or_else(config::default_config_path);
            config::write_config(&path, &RowkeeperConfig::with_defaults(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
        Commands::Setup => {
            let (settings, _conn) = open_store(&cli.global)?;
            ui::info("Database", &settings.database);
            ui::info("Data dir", &settings.data_dir.display().to_string());
            ui::success("Store is ready");
        }
        Commands::Customers { action } => {
            let (settings, conn) = open_store(&cli.global)?;
            let customers =
                CustomerManager::new(&conn, Customer::schema(&settings.tables.customers));
            run_customers(&customers, action, settings.json)?;
        }
        Commands::Suppliers { action } => {
            let (settings, conn) = open_store(&cli.global)?;
            let suppliers =
                SupplierManager::new(&conn, Supplier::schema(&settings.tables.suppliers));
            let names = SupplierNameManager::new(
                &conn,
                SupplierName::schema(&settings.tables.supplier_names, &settings.tables.suppliers),
            );
            run_suppliers(&suppliers, &names, action, settings.json)?;
        }
        Commands::Stats => {
            let (settings, conn) = open_store(&cli.global)?;
            let tables = settings.tables.schemas();
            let mut counts = Vec::new();
            for schema in &tables {
                let count = conn.query_integer(&schema.count())?;
                counts.push((schema.table().to_string(), count.to_string()));
            }

            if settings.json {
                let data: serde_json::Map<String, serde_json::Value> = counts
                    .into_iter()
                    .map(|(t, c)| (t, serde_json::Value::String(c)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                ui::header(&format!("{} Rowkeeper Statistics ({})", Icons::STATS, settings.database));
                let rows: Vec<(&str, &str)> =
                    counts.iter().map(|(t, c)| (t.as_str(), c.as_str())).collect();
                println!("{}", ui::stats_table(&rows));
            }
        }
    }

    Ok(())
}

/// Bootstrap: data dir, database, then missing tables in dependency order
fn open_store(args: &GlobalArgs) -> anyhow::Result<(Settings, Connection)> {
    let settings = Settings::resolve(args)?;
    config::ensure_data_dir(&settings.data_dir)?;
    let mut conn = Connection::connect(&settings.data_dir)?;

    if !conn.database_exists(&settings.database)? {
        conn.create_database(&settings.database)?;
    }
    conn.use_database(&settings.database)?;

    let schemas = settings.tables.schemas();
    let refs: Vec<&EntitySchema> = schemas.iter().collect();
    let created = bootstrap(&conn, &refs).context("failed to initialize tables")?;
    for table in created {
        tracing::info!("Created table '{}'", table);
    }
    Ok((settings, conn))
}

fn run_customers(customers: &CustomerManager<'_>, action: CustomerAction, json: bool) -> anyhow::Result<()> {
    match action {
        CustomerAction::List => {
            let all = customers.get_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("∅ No customers found.");
            } else {
                println!("{}", ui::customers_table(&all));
            }
        }
        CustomerAction::Get { id } => {
            let customer = customers.get_by_id(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&customer)?);
            } else {
                println!("{} {}", Icons::PERSON, customer);
            }
        }
        CustomerAction::Add { fname, lname, email, points } => {
            let customer = customers.create_customer(&fname, &lname, &email, points)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&customer)?);
            } else {
                ui::success(&format!("Created {}", customer));
            }
        }
        CustomerAction::Set { id, field, value } => {
            match field {
                CustomerField::Fname => customers.update_first_name(id, &value)?,
                CustomerField::Lname => customers.update_last_name(id, &value)?,
                CustomerField::Email => customers.update_email(id, &value)?,
                CustomerField::Points => {
                    let points: i64 = value
                        .parse()
                        .with_context(|| format!("points must be an integer, got '{}'", value))?;
                    customers.update_points(id, points)?
                }
            }
            ui::success(&format!("Updated customer {}", id));
        }
        CustomerAction::Delete { id } => {
            customers.delete(id)?;
            ui::success(&format!("{} Deleted customer {}", Icons::DEL, id));
        }
    }
    Ok(())
}

fn run_suppliers(
    suppliers: &SupplierManager<'_>,
    names: &SupplierNameManager<'_>,
    action: SupplierAction,
    json: bool,
) -> anyhow::Result<()> {
    match action {
        SupplierAction::List => {
            let mut listing = Vec::new();
            for supplier in suppliers.get_all()? {
                let contacts = names.names_of(supplier.id)?;
                listing.push((supplier, contacts));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else if listing.is_empty() {
                println!("∅ No suppliers found.");
            } else {
                println!("{}", ui::suppliers_table(&listing));
            }
        }
        SupplierAction::Get { id } => {
            let supplier = suppliers.get_by_id(id)?;
            let contacts = names.names_of(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&(supplier, contacts))?);
            } else {
                println!("{} {}", Icons::PACKAGE, supplier);
                for contact in contacts {
                    ui::summary_row("contact:", &contact.name);
                }
            }
        }
        SupplierAction::Add { company, email, names: contact_names } => {
            let refs: Vec<&str> = contact_names.iter().map(String::as_str).collect();
            let (supplier, contacts) =
                suppliers.create_with_names(names, &Supplier::new(company, email), &refs)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&(supplier, contacts))?);
            } else {
                ui::success(&format!("Created {}", supplier));
                for contact in contacts {
                    ui::summary_row("contact:", &contact.to_string());
                }
            }
        }
        SupplierAction::Set { id, field, value } => {
            match field {
                SupplierField::Company => suppliers.update_company(id, &value)?,
                SupplierField::Email => suppliers.update_email(id, &value)?,
            }
            ui::success(&format!("Updated supplier {}", id));
        }
        SupplierAction::AddName { supplier_id, name } => {
            let contact = names.create(&SupplierName::new(supplier_id, name))?;
            ui::success(&format!("Created {}", contact));
        }
        SupplierAction::Delete { id } => {
            let removed = suppliers.delete_with_names(names, id)?;
            ui::success(&format!(
                "{} Deleted supplier {} and {} contact name(s)",
                Icons::DEL, id, removed
            ));
            if removed > 0 {
                println!("{}", ui::dim("contact names are removed before their supplier"));
            }
        }
    }
    Ok(())
}

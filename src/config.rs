use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::entities::StoreTables;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RowkeeperConfig {
    pub data_dir: Option<String>,
    pub database: Option<String>,
    pub tables: Option<TableNames>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableNames {
    pub customers: Option<String>,
    pub suppliers: Option<String>,
    pub supplier_names: Option<String>,
}

pub const DEFAULT_DATABASE: &str = "sample_store";

impl RowkeeperConfig {
    /// The configuration `rowkeeper init` writes
    pub fn with_defaults() -> Self {
        let tables = StoreTables::default();
        Self {
            data_dir: Some(default_data_dir().to_string_lossy().to_string()),
            database: Some(DEFAULT_DATABASE.to_string()),
            tables: Some(TableNames {
                customers: Some(tables.customers),
                suppliers: Some(tables.suppliers),
                supplier_names: Some(tables.supplier_names),
            }),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.as_ref().map(PathBuf::from).unwrap_or_else(default_data_dir)
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or(DEFAULT_DATABASE)
    }

    /// Table names, falling back to the defaults for any key left out
    pub fn store_tables(&self) -> StoreTables {
        let mut tables = StoreTables::default();
        if let Some(names) = &self.tables {
            if let Some(t) = &names.customers {
                tables.customers = t.clone();
            }
            if let Some(t) = &names.suppliers {
                tables.suppliers = t.clone();
            }
            if let Some(t) = &names.supplier_names {
                tables.supplier_names = t.clone();
            }
        }
        tables
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("rowkeeper.toml")
}

pub fn default_data_dir() -> PathBuf {
    PathBuf::from(".rowkeeper")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RowkeeperConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RowkeeperConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RowkeeperConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_data_dir(data_dir: &Path) -> anyhow::Result<()> {
    if !data_dir.as_os_str().is_empty() && !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
    }
    Ok(())
}

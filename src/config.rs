//! Application configuration.
//!
//! Settings are read from a TOML file with three sections: `[swipam]` for the
//! backend connection, `[inventory]` for field tables and network filters and
//! `[cache]` for the artifact location.

use crate::error::{Error, Result};
use crate::models::{Ipv4, ADDRESS_COLUMN, ID_COLUMN, NAME_COLUMN, PREFIX_COLUMN};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Application name, used for file names and the environment override.
pub const APP_NAME: &str = "swipam";

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV: &str = "SWIPAM_CONFIG";

/// Default SWIS port.
pub const DEFAULT_PORT: u16 = 17778;

/// Rows requested per page.
pub const DEFAULT_PER_PAGE: usize = 500;

/// Column holding a host's IP address.
pub const DEFAULT_ADDRESS_FIELD: &str = "IPAddress";

/// Complete configuration file.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub swipam: SwisSettings,
    pub inventory: InventorySettings,
    pub cache: CacheSettings,
    /// Where the configuration was read from.
    #[serde(skip)]
    pub path: PathBuf,
}

/// Backend connection settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SwisSettings {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: u16,
    pub verify_ssl: bool,
    pub per_page: usize,
    /// Keep the fetched rows next to the cache as a replayable snapshot.
    pub save_raw: bool,
}

impl Default for SwisSettings {
    fn default() -> Self {
        SwisSettings {
            host: None,
            user: None,
            password: None,
            port: DEFAULT_PORT,
            verify_ssl: false,
            per_page: DEFAULT_PER_PAGE,
            save_raw: false,
        }
    }
}

/// Field tables and network filters.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct InventorySettings {
    /// Columns fetched for every Group/Supernet/Subnet row.
    pub subnet_columns: Vec<String>,
    /// Columns fetched for every IP node row.
    pub host_columns: Vec<String>,
    /// Columns kept aside for resolution, never exported.
    pub internal: Vec<String>,
    /// Group display names to leave out.
    pub exclude: HashSet<String>,
    /// Columns exported as group variables.
    pub group_vars: Vec<String>,
    /// Columns exported as subnet variables.
    pub subnet_vars: Vec<String>,
    /// Host columns exported as host variables.
    pub host_vars: Vec<String>,
    /// Output names for host variables, keyed by column.
    pub host_var_map: BTreeMap<String, String>,
    /// Admit subnets that no include network covers.
    pub include_root_net: bool,
    pub include_nets: Vec<Ipv4>,
    pub exclude_nets: Vec<Ipv4>,
    pub address_field: String,
    /// Pretty-print the produced document.
    pub pretty: bool,
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            subnet_columns: [ID_COLUMN, NAME_COLUMN, ADDRESS_COLUMN, PREFIX_COLUMN]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            host_columns: vec![DEFAULT_ADDRESS_FIELD.to_string()],
            internal: Vec::new(),
            exclude: HashSet::new(),
            group_vars: Vec::new(),
            subnet_vars: Vec::new(),
            host_vars: vec![DEFAULT_ADDRESS_FIELD.to_string()],
            host_var_map: BTreeMap::new(),
            include_root_net: false,
            include_nets: Vec::new(),
            exclude_nets: Vec::new(),
            address_field: DEFAULT_ADDRESS_FIELD.to_string(),
            pretty: false,
        }
    }
}

/// Cache artifact settings.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding the artifact; defaults to the configuration directory.
    pub path: Option<PathBuf>,
    /// Hand-maintained inventory served instead of the pipeline when it exists.
    pub local_cache: Option<PathBuf>,
    /// IANA timezone deciding the calendar day; host local time when unset.
    pub timezone: Option<String>,
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Config::parse(&text)?;
        config.path = path.to_path_buf();
        log::info!("Read configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        require("swipam.host", &self.swipam.host)?;
        require("swipam.user", &self.swipam.user)?;
        require("swipam.password", &self.swipam.password)?;
        if self.swipam.per_page == 0 {
            return Err(Error::Config("swipam.per_page must be positive".to_string()));
        }
        if !self.inventory.host_vars.contains(&self.inventory.address_field) {
            return Err(Error::Config(format!(
                "inventory.host_vars must contain the address field {}",
                self.inventory.address_field
            )));
        }
        self.timezone()?;
        Ok(())
    }

    /// Directory the configuration file lives in.
    pub fn dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Location of the generated inventory artifact.
    pub fn cache_file(&self) -> PathBuf {
        let dir = match &self.cache.path {
            Some(p) => expand_home(p),
            None => self.dir(),
        };
        dir.join(format!("{APP_NAME}.json"))
    }

    /// Location of the raw snapshot written when `swipam.save_raw` is set.
    pub fn raw_file(&self) -> PathBuf {
        self.cache_file().with_extension("raw.json")
    }

    /// Location of the hand-maintained inventory, if configured.
    pub fn local_cache_file(&self) -> Option<PathBuf> {
        self.cache.local_cache.as_deref().map(expand_home)
    }

    /// Timezone used for the calendar-day check.
    pub fn timezone(&self) -> Result<Option<chrono_tz::Tz>> {
        match &self.cache.timezone {
            None => Ok(None),
            Some(name) => name
                .parse::<chrono_tz::Tz>()
                .map(Some)
                .map_err(|e| Error::Config(format!("cache.timezone: {e}"))),
        }
    }
}

fn require(key: &str, value: &Option<String>) -> Result<()> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(Error::MissingConfig(key.to_string())),
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        (Ok(_), None) => {
            log::warn!("No home directory, using {} as is", path.display());
            path.to_path_buf()
        }
        _ => path.to_path_buf(),
    }
}

/// Configuration path from the environment, else next to the executable.
pub fn default_path() -> PathBuf {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return expand_home(Path::new(&p));
    }
    let file = format!("{APP_NAME}.toml");
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join(&file)))
        .unwrap_or_else(|| PathBuf::from(file))
}

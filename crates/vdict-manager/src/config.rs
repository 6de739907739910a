//! Catalog configuration
//!
//! A catalog file declares dictionaries, their seed data and extensions.
//! TOML, JSON and YAML are accepted; the format follows the file extension.
//!
//! ```toml
//! [dictionaries.STATUS]
//! remote = true
//!
//! [dictionaries.STATUS.data.SUCCESS]
//! label = "Success"
//! color = "green"
//!
//! [dictionaries.STATUS_DONE]
//! extends = "STATUS"
//! pick_values = ["SUCCESS"]
//! ```

use crate::error::CatalogError;
use crate::options::DictDefinition;
use crate::registry::{DictHandle, DictManager};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};
use vdict_item::{DictRecord, DictValue, ValueFilter};

/// Catalog file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// TOML (`.toml`)
    Toml,
    /// JSON (`.json`)
    Json,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
}

impl CatalogFormat {
    /// Format for a file path, by extension
    ///
    /// # Errors
    /// [`CatalogError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// One dictionary entry of a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Loads call the manager's fetcher
    pub remote: bool,
    /// Seed items keyed by default value
    pub data: DictRecord,
    /// Code of the dictionary this one extends
    pub extends: Option<String>,
    /// Keep only these values
    pub pick_values: Vec<DictValue>,
    /// Drop these values
    pub omit_values: Vec<DictValue>,
}

impl DictionaryConfig {
    fn filter(&self) -> ValueFilter {
        ValueFilter {
            pick_values: self.pick_values.clone(),
            omit_values: self.omit_values.clone(),
        }
    }

    fn definition(&self) -> DictDefinition {
        DictDefinition::new()
            .with_data(self.data.clone())
            .remote(self.remote)
    }
}

/// Parsed catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Dictionaries by code, in file order
    pub dictionaries: IndexMap<String, DictionaryConfig>,
}

impl CatalogConfig {
    /// Load catalog from file
    ///
    /// # Errors
    /// IO, format or parse errors.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let format = CatalogFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|err| CatalogError::io_error(path, err))?;
        Self::parse(&content, format)
    }

    /// Parse catalog content
    ///
    /// # Errors
    /// [`CatalogError::Parse`] if `content` is not a valid catalog.
    pub fn parse(content: &str, format: CatalogFormat) -> Result<Self, CatalogError> {
        match format {
            CatalogFormat::Toml => {
                toml::from_str(content).map_err(|err| CatalogError::Parse(err.to_string()))
            }
            CatalogFormat::Json => {
                serde_json::from_str(content).map_err(|err| CatalogError::Parse(err.to_string()))
            }
            CatalogFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|err| CatalogError::Parse(err.to_string()))
            }
        }
    }

    /// Define every dictionary of the catalog on `manager`
    ///
    /// Base dictionaries are defined first, then extensions once their base
    /// exists. Remote dictionaries use the manager's default fetcher.
    ///
    /// # Errors
    /// [`CatalogError::UnknownBase`] for extensions whose base never resolves.
    pub fn install(&self, manager: &DictManager) -> Result<Vec<DictHandle>, CatalogError> {
        let mut handles = Vec::with_capacity(self.dictionaries.len());
        let mut pending = Vec::new();

        for (code, config) in &self.dictionaries {
            match &config.extends {
                None => handles.push(manager.define_scoped(
                    code.clone(),
                    config.definition(),
                    config.filter(),
                    code.clone(),
                )),
                Some(base) => pending.push((code, base, config)),
            }
        }

        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for (code, base, config) in pending {
                match handles.iter().find(|handle| handle.code() == base.as_str()) {
                    Some(parent) => {
                        if config.remote || !config.data.is_empty() {
                            warn!(
                                code = %code,
                                base = %base,
                                "extension ignores its own data and remote flag"
                            );
                        }
                        let handle = parent.extend(code.clone(), config.filter());
                        handles.push(handle);
                    }
                    None => waiting.push((code, base, config)),
                }
            }
            if waiting.len() == before {
                if let Some((code, base, _)) = waiting.first() {
                    return Err(CatalogError::UnknownBase {
                        code: (*code).clone(),
                        base: (*base).clone(),
                    });
                }
            }
            pending = waiting;
        }

        info!(dictionaries = handles.len(), "catalog installed");
        Ok(handles)
    }
}

//! Raw key/value loading of run configuration files.
//!
//! Both formats reduce to an ordered list of named sections, each a flat map
//! of lowercase keys to string values:
//!
//! ```ini
//! [params]
//! pRun = 100
//! gravity = tree
//!
//! [light]
//! N = 1000
//! m = 5e-5
//! ```
//!
//! ```yaml
//! params:
//!   pRun: 100
//!   gravity: tree
//! light:
//!   N: 1000
//!   m: 5.0e-5
//! ```
//!
//! A `DEFAULT` section (any case) supplies fallbacks for every section.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ini::Ini;
use serde_yaml::{Mapping, Value};

use crate::configuration::config::ConfigError;

pub const DEFAULT_SECTION: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct RawSection {
    pub name: String,
    pub entries: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub sections: Vec<RawSection>, // in file order, DEFAULT excluded
    pub defaults: HashMap<String, String>,
}

impl RawConfig {
    /// Load a file, choosing YAML for `.yaml`/`.yml` and INI otherwise
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Self::from_ini_str(&text),
        }
    }

    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Ini(e.to_string()))?;
        let mut raw = RawConfig::default();

        for (name, props) in ini.iter() {
            let entries: HashMap<String, String> = props
                .iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .collect();
            match name {
                None if entries.is_empty() => {}
                None => return Err(ConfigError::KeyOutsideSection),
                Some(name) => raw.push(name.trim(), entries),
            }
        }
        Ok(raw)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let root: Mapping = serde_yaml::from_str(text)?;
        let mut raw = RawConfig::default();

        for (name, body) in &root {
            let name = scalar_to_string(name).ok_or(ConfigError::KeyOutsideSection)?;
            let Some(body) = body.as_mapping() else {
                return Err(ConfigError::KeyOutsideSection);
            };
            let mut entries = HashMap::new();
            for (k, v) in body {
                let key = scalar_to_string(k).ok_or_else(|| ConfigError::InvalidValue {
                    section: name.clone(),
                    key: format!("{k:?}"),
                    value: String::new(),
                    reason: "keys must be scalars".into(),
                })?;
                let value = scalar_to_string(v).ok_or_else(|| ConfigError::InvalidValue {
                    section: name.clone(),
                    key: key.clone(),
                    value: format!("{v:?}"),
                    reason: "values must be scalars".into(),
                })?;
                entries.insert(key.to_lowercase(), value);
            }
            raw.push(&name, entries);
        }
        Ok(raw)
    }

    /// Add a section; repeated names merge, later keys win
    fn push(&mut self, name: &str, entries: HashMap<String, String>) {
        if name.eq_ignore_ascii_case(DEFAULT_SECTION) {
            self.defaults.extend(entries);
        } else if let Some(existing) = self.sections.iter_mut().find(|s| s.name == name) {
            existing.entries.extend(entries);
        } else {
            self.sections.push(RawSection {
                name: name.to_string(),
                entries,
            });
        }
    }

    pub fn section(&self, name: &str) -> Option<&RawSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

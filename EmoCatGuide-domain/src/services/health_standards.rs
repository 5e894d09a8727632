//! Reference values and grade bands for the vital stats extracted from reports.
//!
//! The table is JSON shaped as `{"health_standards": {key: standard}}`. A copy is
//! embedded in the binary and `HEALTH_STANDARDS_FILE` can point at a replacement.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::entities::Gender;

const EMBEDDED_STANDARDS: &str = include_str!("../../data/health_standards.json");

static DEFAULT_STANDARDS: Lazy<Arc<HealthStandards>> = Lazy::new(|| {
    match HealthStandards::from_json(EMBEDDED_STANDARDS) {
        Ok(standards) => Arc::new(standards),
        Err(e) => {
            error!("Embedded health standards are invalid: {}", e);
            Arc::new(HealthStandards::default())
        }
    }
});

/// Errors raised while loading a standards table
#[derive(Debug, Error)]
pub enum StandardsError {
    #[error("Failed to read health standards: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse health standards: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reference data for one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStandard {
    /// Display name used in warnings
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Reference such as `70-99`, `<100`, `>40` or `(-)`
    #[serde(default)]
    pub reference_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_value_male: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_value_female: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Gender → grade letter → inclusive `[lower, upper]`, in file order
    #[serde(default)]
    pub grades: HashMap<String, IndexMap<String, (f64, f64)>>,
}

impl HealthStandard {
    /// Gendered reference value when one exists, else the general one
    pub fn reference_for(&self, gender: Gender) -> &str {
        let gendered = match gender {
            Gender::Male => self.reference_value_male.as_deref(),
            Gender::Female => self.reference_value_female.as_deref(),
        };
        gendered.unwrap_or(&self.reference_value).trim()
    }

    /// Grade bands for a gender, if any are defined
    pub fn grades_for(&self, gender: Gender) -> Option<&IndexMap<String, (f64, f64)>> {
        self.grades.get(gender.as_str()).filter(|grades| !grades.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct StandardsFile {
    #[serde(default)]
    health_standards: IndexMap<String, HealthStandard>,
}

/// Loaded standards table with its alias index
#[derive(Debug, Clone, Default)]
pub struct HealthStandards {
    standards: IndexMap<String, HealthStandard>,
    /// Trimmed, lower-cased alias → canonical key
    aliases: HashMap<String, String>,
}

impl HealthStandards {
    /// Parse a standards table from JSON text
    pub fn from_json(json: &str) -> Result<Self, StandardsError> {
        let file: StandardsFile = serde_json::from_str(json)?;
        let mut aliases = HashMap::new();

        for (key, standard) in &file.health_standards {
            for alias in &standard.aliases {
                aliases.insert(alias.trim().to_lowercase(), key.clone());
            }
        }
        // Keys match themselves case-insensitively unless an alias already claims the spelling
        for key in file.health_standards.keys() {
            aliases.entry(key.to_lowercase()).or_insert_with(|| key.clone());
        }

        debug!("Health standards loaded: {:?}", file.health_standards.keys().collect::<Vec<_>>());
        Ok(Self { standards: file.health_standards, aliases })
    }

    /// Read a standards table from disk
    pub fn from_file(path: &Path) -> Result<Self, StandardsError> {
        let json = std::fs::read_to_string(path)?;
        let standards = Self::from_json(&json)?;
        info!("Loaded {} health standards from {}", standards.len(), path.display());
        Ok(standards)
    }

    /// Load the override file when given, otherwise the embedded table
    pub fn load(path: Option<&Path>) -> Result<Arc<Self>, StandardsError> {
        match path {
            Some(path) => Ok(Arc::new(Self::from_file(path)?)),
            None => Ok(default_standards()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HealthStandard> {
        self.standards.get(key)
    }

    pub fn len(&self) -> usize {
        self.standards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }

    /// Canonical metric keys in table order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.standards.keys().map(String::as_str)
    }

    /// Resolve a reported metric name to its canonical key
    pub fn canonical_key(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.standards.get_key_value(name) {
            return Some(key.as_str());
        }
        self.aliases.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    /// Re-key extracted stats onto canonical names.
    /// Unknown names pass through. The first non-null value for a key wins.
    pub fn normalize(&self, vital_stats: &Map<String, Value>) -> Map<String, Value> {
        let mut normalized = Map::new();

        for (name, value) in vital_stats {
            let key = self.canonical_key(name).unwrap_or(name).to_string();
            match normalized.get(&key) {
                None => {
                    normalized.insert(key, value.clone());
                },
                Some(Value::Null) if !value.is_null() => {
                    debug!("Filling {} from alias {}", key, name);
                    normalized.insert(key, value.clone());
                },
                Some(_) => {}
            }
        }

        normalized
    }
}

/// The embedded standards table
pub fn default_standards() -> Arc<HealthStandards> {
    DEFAULT_STANDARDS.clone()
}

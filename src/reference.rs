use crate::engine::district::normalize_district_key;
use crate::error::Result;

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

pub const UNKNOWN_DISTRICT: &str = "Unknown";

const DISTRICT_ID_COLUMN: &str = "DISTRICT";
const DISTRICT_NAME_COLUMN: &str = "DISTRICT NAME";
const HEADQUARTERS: &str = "Headquarters";

/// Normalized district key to display name. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictMapping {
    names: HashMap<String, String>,
}

impl DistrictMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.names.insert(key.into(), name.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Display name for a key. Missing keys and absent entries resolve to `"Unknown"`.
    pub fn resolve(&self, key: Option<&str>) -> &str {
        key.and_then(|k| self.get(k)).unwrap_or(UNKNOWN_DISTRICT)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DistrictMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (key, name) in iter {
            mapping.insert(key, name);
        }
        mapping
    }
}

/// The IUCR classification-code table, kept as raw text rows.
///
/// Loaded alongside the district table but not consulted when cleaning.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCodes {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl ClassificationCodes {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub districts: DistrictMapping,
    pub classification_codes: ClassificationCodes,
}

pub fn load_lookups(districts_path: &Path, iucr_path: &Path) -> Result<Lookups> {
    let districts = load_district_mapping(districts_path)?;
    let classification_codes = load_classification_codes(iucr_path);

    info!(
        districts = districts.len(),
        classification_codes = classification_codes.len(),
        "Loaded lookups"
    );

    Ok(Lookups {
        districts,
        classification_codes,
    })
}

/// Reads the district reference table.
///
/// A missing file is not an error: it yields an empty mapping and a warning, so every
/// district later resolves to `"Unknown"`.
pub fn load_district_mapping(path: &Path) -> Result<DistrictMapping> {
    if !path.exists() {
        warn!(path = %path.display(), "District file not found, skipping district merge");
        return Ok(DistrictMapping::new());
    }

    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let id_idx = column_index(&headers, DISTRICT_ID_COLUMN);
    let name_idx = column_index(&headers, DISTRICT_NAME_COLUMN);

    let (Some(id_idx), Some(name_idx)) = (id_idx, name_idx) else {
        warn!(path = %path.display(), "District file lacks DISTRICT / DISTRICT NAME columns");
        return Ok(DistrictMapping::new());
    };

    let mut mapping = DistrictMapping::new();
    for row in rdr.records() {
        let row = row?;
        let (Some(id), Some(name)) = (non_empty(&row, id_idx), non_empty(&row, name_idx)) else {
            continue;
        };
        if id == HEADQUARTERS {
            continue;
        }
        if let Some(key) = normalize_district_key(id) {
            mapping.insert(key, name);
        }
    }

    Ok(mapping)
}

/// Reads the classification-code table. Never fails: an absent or unreadable file
/// degrades to an empty table with a warning.
pub fn load_classification_codes(path: &Path) -> ClassificationCodes {
    if !path.exists() {
        warn!(path = %path.display(), "Classification code file not found");
        return ClassificationCodes::default();
    }

    match read_classification_codes(path) {
        Ok(codes) => codes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable classification code file");
            ClassificationCodes::default()
        }
    }
}

fn read_classification_codes(path: &Path) -> Result<ClassificationCodes> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ClassificationCodes { headers, rows })
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn non_empty(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).filter(|value| !value.is_empty())
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Columns the raw incident file must carry, in the order they are read.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "ID",
    "Date",
    "IUCR",
    "Primary Type",
    "District",
    "Latitude",
    "Longitude",
    "Location",
];

pub const OUTPUT_HEADER: [&str; 7] = [
    "id",
    "type",
    "lat",
    "lon",
    "timestamp",
    "district",
    "district_name",
];

/// Format of the `Date` column, e.g. `01/15/2024 03:30:00 PM`.
pub const RAW_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Output timestamp format. The parsed wall-clock value is stamped with `Z` as-is.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One row of the raw incident table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "IUCR")]
    pub iucr: Option<String>,
    #[serde(rename = "Primary Type")]
    pub primary_type: Option<String>,
    // Kept as text so leading zeros survive until normalization.
    #[serde(rename = "District")]
    pub district: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
}

impl RawRecord {
    pub fn new(id: i64, date: &str) -> Self {
        Self {
            id,
            date: Some(date.to_string()),
            iucr: None,
            primary_type: None,
            district: None,
            latitude: None,
            longitude: None,
            location: None,
        }
    }

    pub fn with_type(mut self, primary_type: &str) -> Self {
        self.primary_type = Some(primary_type.to_string());
        self
    }

    pub fn with_district(mut self, district: &str) -> Self {
        self.district = Some(district.to_string());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

/// A record that passed every filter, projected onto the output columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: String,
    pub district: Option<String>,
    pub district_name: String,
}

impl CleanedRecord {
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

pub type Batch = Vec<RawRecord>;
pub type CleanedBatch = Vec<CleanedRecord>;

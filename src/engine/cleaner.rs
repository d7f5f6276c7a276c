use crate::engine::district::normalize_district_key;
use crate::engine::location::parse_location;
use crate::record::{
    Batch, CleanedBatch, CleanedRecord, RawRecord, RAW_DATE_FORMAT, TIMESTAMP_FORMAT,
};
use crate::reference::DistrictMapping;

use chrono::NaiveDateTime;
use std::collections::HashSet;

pub const LAT_MIN: f64 = 41.6;
pub const LAT_MAX: f64 = 42.1;
pub const LON_MIN: f64 = -87.9;
pub const LON_MAX: f64 = -87.5;

/// How many rows each cleaning step removed from one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub input: usize,
    pub duplicates: usize,
    pub stale_or_undated: usize,
    pub backfilled: usize,
    pub missing_coordinates: usize,
    pub out_of_bounds: usize,
    pub output: usize,
}

struct Dated {
    record: RawRecord,
    date: NaiveDateTime,
}

struct Located {
    record: RawRecord,
    date: NaiveDateTime,
    lat: f64,
    lon: f64,
}

/// Cleans one raw batch. Malformed input is dropped or labelled, never raised.
pub fn clean_batch(
    batch: Batch,
    districts: &DistrictMapping,
    cutoff: NaiveDateTime,
) -> CleanedBatch {
    clean_batch_with_stats(batch, districts, cutoff).0
}

pub fn clean_batch_with_stats(
    batch: Batch,
    districts: &DistrictMapping,
    cutoff: NaiveDateTime,
) -> (CleanedBatch, CleanStats) {
    let mut stats = CleanStats {
        input: batch.len(),
        ..CleanStats::default()
    };

    let unique = dedupe_by_id(batch);
    stats.duplicates = stats.input - unique.len();

    // A date that fails to parse becomes None and falls out of the cutoff filter.
    let dated: Vec<Dated> = unique
        .into_iter()
        .filter_map(|record| {
            let date = record.date.as_deref().and_then(parse_raw_date)?;
            (date >= cutoff).then_some(Dated { record, date })
        })
        .collect();
    stats.stale_or_undated = stats.input - stats.duplicates - dated.len();
    if dated.is_empty() {
        return (Vec::new(), stats);
    }

    let mut located = Vec::with_capacity(dated.len());
    for Dated { mut record, date } in dated {
        if backfill_coordinates(&mut record) {
            stats.backfilled += 1;
        }
        match (present(record.latitude), present(record.longitude)) {
            (Some(lat), Some(lon)) => located.push(Located {
                record,
                date,
                lat,
                lon,
            }),
            _ => stats.missing_coordinates += 1,
        }
    }

    let before_bounds = located.len();
    located.retain(|row| within_bounds(row.lat, row.lon));
    stats.out_of_bounds = before_bounds - located.len();

    let cleaned: CleanedBatch = located
        .into_iter()
        .map(|row| project(row, districts))
        .collect();
    stats.output = cleaned.len();

    (cleaned, stats)
}

/// Keeps the first occurrence of each identifier within this batch only.
pub fn dedupe_by_id(batch: Batch) -> Batch {
    let mut seen = HashSet::with_capacity(batch.len());
    batch.into_iter().filter(|r| seen.insert(r.id)).collect()
}

pub fn parse_raw_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, RAW_DATE_FORMAT).ok()
}

/// Fills missing coordinates from the location text. Present coordinates are never
/// overwritten. Returns true when at least one value was filled.
pub fn backfill_coordinates(record: &mut RawRecord) -> bool {
    let lat_missing = present(record.latitude).is_none();
    let lon_missing = present(record.longitude).is_none();
    if !(lat_missing || lon_missing) {
        return false;
    }

    let Some((lat, lon)) = record.location.as_deref().and_then(parse_location) else {
        return false;
    };
    if lat_missing {
        record.latitude = Some(lat);
    }
    if lon_missing {
        record.longitude = Some(lon);
    }
    true
}

/// Inclusive on both ends.
pub fn within_bounds(lat: f64, lon: f64) -> bool {
    (LAT_MIN..=LAT_MAX).contains(&lat) && (LON_MIN..=LON_MAX).contains(&lon)
}

pub fn format_timestamp(date: NaiveDateTime) -> String {
    date.format(TIMESTAMP_FORMAT).to_string()
}

// NaN reads as missing; infinities stay and fail the bounds check.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn project(row: Located, districts: &DistrictMapping) -> CleanedRecord {
    let district = row.record.district.as_deref().and_then(normalize_district_key);
    let district_name = districts.resolve(district.as_deref()).to_string();

    CleanedRecord {
        id: row.record.id,
        kind: row.record.primary_type,
        lat: row.lat,
        lon: row.lon,
        timestamp: format_timestamp(row.date),
        district,
        district_name,
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use crimeprep::pipeline::{compute_cutoff, drive, run_pipeline_at, PipelineConfig};
use crimeprep::{DistrictMapping, IncrementalSink, PipelineError, RawRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const HEADER: &str = "ID,Case Number,Date,Block,IUCR,Primary Type,District,Latitude,Longitude,Location";
const OUTPUT_HEADER: &str = "id,type,lat,lon,timestamp,district,district_name";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

struct Fixture {
    dir: TempDir,
    config: PipelineConfig,
}

impl Fixture {
    fn new(rows: &[&str], batch_size: usize) -> Self {
        let dir = tempdir().unwrap();
        let input = dir.path().join("crimes.csv");
        fs::write(&input, format!("{}\n{}\n", HEADER, rows.join("\n"))).unwrap();

        let districts = dir.path().join("districts.csv");
        fs::write(
            &districts,
            "DISTRICT,DISTRICT NAME\n1,Central\n22,Near North\nHeadquarters,Headquarters\n",
        )
        .unwrap();

        let mut config = PipelineConfig::new(&input, dir.path().join("out.csv"));
        config.batch_size = batch_size;
        config.districts_file = districts;
        config.iucr_file = dir.path().join("missing_iucr.csv");

        Self { dir, config }
    }

    fn output(&self) -> String {
        fs::read_to_string(&self.config.output).unwrap()
    }

    fn output_rows(&self) -> Vec<Vec<String>> {
        self.output()
            .lines()
            .skip(1)
            .map(|line| line.split(',').map(str::to_string).collect())
            .collect()
    }
}

fn row(id: i64, date: &str, district: &str, lat: &str, lon: &str, location: &str) -> String {
    format!("{id},JH{id},{date},001XX N STATE ST,0820,THEFT,{district},{lat},{lon},{location}")
}

#[test]
fn test_cutoff_is_five_calendar_years_back() {
    let cutoff = compute_cutoff(now(), 5).unwrap();
    assert_eq!(cutoff, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());

    let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(12, 0, 0).unwrap();
    assert_eq!(
        compute_cutoff(leap, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 2, 28).unwrap().and_hms_opt(12, 0, 0).unwrap()
    );
}

#[test]
fn test_cutoff_unrepresentable() {
    assert!(matches!(
        compute_cutoff(now(), u32::MAX),
        Err(PipelineError::InvalidRetention(u32::MAX))
    ));
}

#[test]
fn test_district_resolved_end_to_end() {
    let rows = [row(1, "03/15/2024 02:30:00 PM", "022", "41.9", "-87.63", "")];
    let fixture = Fixture::new(&rows.iter().map(String::as_str).collect::<Vec<_>>(), 100);

    let summary = run_pipeline_at(&fixture.config, now()).unwrap();

    assert_eq!(summary.rows_written, 1);
    assert_eq!(
        fixture.output(),
        format!("{OUTPUT_HEADER}\n1,THEFT,41.9,-87.63,2024-03-15T14:30:00Z,22,Near North\n")
    );
}

#[test]
fn test_location_backfill_end_to_end() {
    let rows = [row(2, "03/15/2024 02:30:00 PM", "001", "", "", "\"(41.8, -87.6)\"")];
    let fixture = Fixture::new(&rows.iter().map(String::as_str).collect::<Vec<_>>(), 100);

    run_pipeline_at(&fixture.config, now()).unwrap();

    let out = fixture.output_rows();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0][2], "41.8");
    assert_eq!(out[0][3], "-87.6");
    assert_eq!(out[0][6], "Central");
}

#[test]
fn test_stale_records_absent() {
    let rows = [
        row(3, "12/31/2020 11:59:59 PM", "001", "41.8", "-87.6", ""),
        row(4, "01/02/2021 08:00:00 AM", "001", "41.8", "-87.6", ""),
    ];
    let fixture = Fixture::new(&rows.iter().map(String::as_str).collect::<Vec<_>>(), 100);

    run_pipeline_at(&fixture.config, now()).unwrap();

    let ids: Vec<String> = fixture.output_rows().into_iter().map(|r| r[0].clone()).collect();
    assert_eq!(ids, vec!["4"]);
}

#[test]
fn test_unmapped_district_is_unknown() {
    let rows = [
        row(5, "03/15/2024 02:30:00 PM", "999", "41.8", "-87.6", ""),
        row(6, "03/15/2024 02:30:00 PM", "", "41.8", "-87.6", ""),
    ];
    let fixture = Fixture::new(&rows.iter().map(String::as_str).collect::<Vec<_>>(), 100);

    run_pipeline_at(&fixture.config, now()).unwrap();

    let out = fixture.output_rows();
    assert_eq!(out[0][5], "999");
    assert_eq!(out[0][6], "Unknown");
    assert_eq!(out[1][5], "");
    assert_eq!(out[1][6], "Unknown");
}

#[test]
fn test_duplicates_removed_within_batch_only() {
    let rows = [
        row(42, "03/15/2024 02:30:00 PM", "001", "41.8", "-87.6", ""),
        row(42, "03/16/2024 02:30:00 PM", "022", "41.8", "-87.6", ""),
        row(7, "03/17/2024 02:30:00 PM", "001", "41.8", "-87.6", ""),
        row(42, "03/18/2024 02:30:00 PM", "001", "41.8", "-87.6", ""),
    ];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();

    // One batch: only the first id 42 survives
    let single = Fixture::new(&rows, 100);
    run_pipeline_at(&single.config, now()).unwrap();
    let out = single.output_rows();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0][0], "42");
    assert_eq!(out[0][4], "2024-03-15T14:30:00Z");
    assert_eq!(out[1][0], "7");

    // Batches of two: the id 42 in the second batch is kept as well
    let split = Fixture::new(&rows, 2);
    let summary = run_pipeline_at(&split.config, now()).unwrap();
    let out = split.output_rows();
    let ids: Vec<&str> = out.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["42", "7", "42"]);
    assert_eq!(out[2][4], "2024-03-18T14:30:00Z");
    assert_eq!(summary.batches_read, 2);
}

#[test]
fn test_fully_filtered_batch_causes_no_write() {
    let rows = [
        row(1, "03/15/2024 02:30:00 PM", "001", "41.8", "-87.6", ""),
        row(2, "01/01/2015 02:30:00 PM", "001", "41.8", "-87.6", ""),
        row(3, "01/01/2016 02:30:00 PM", "001", "41.8", "-87.6", ""),
        row(4, "03/15/2024 02:30:00 PM", "001", "41.8", "-87.6", ""),
    ];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&rows, 1);

    let summary = run_pipeline_at(&fixture.config, now()).unwrap();

    assert_eq!(summary.batches_read, 4);
    assert_eq!(summary.batches_written, 2);
    assert_eq!(summary.rows_written, 2);
    let output = fixture.output();
    assert_eq!(output.matches(OUTPUT_HEADER).count(), 1);
    assert!(output.starts_with(OUTPUT_HEADER));
}

#[test]
fn test_leading_filtered_batch_does_not_consume_header() {
    let rows = [
        row(1, "01/01/2015 02:30:00 PM", "001", "41.8", "-87.6", ""),
        row(2, "03/15/2024 02:30:00 PM", "001", "41.8", "-87.6", ""),
    ];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&rows, 1);

    run_pipeline_at(&fixture.config, now()).unwrap();

    assert_eq!(
        fixture.output(),
        format!("{OUTPUT_HEADER}\n2,THEFT,41.8,-87.6,2024-03-15T14:30:00Z,1,Central\n")
    );
}

#[test]
fn test_nothing_survives_leaves_output_untouched() {
    let rows = [row(1, "01/01/2015 02:30:00 PM", "001", "41.8", "-87.6", "")];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&rows, 10);

    let summary = run_pipeline_at(&fixture.config, now()).unwrap();

    assert_eq!(summary.rows_written, 0);
    assert!(!fixture.config.output.exists());
}

#[test]
fn test_output_invariants_hold() {
    let rows = [
        row(1, "03/15/2024 02:30:00 PM", "001", "41.6", "-87.9", ""),
        row(2, "03/15/2024 02:30:00 PM", "001", "42.1", "-87.5", ""),
        row(3, "03/15/2024 02:30:00 PM", "001", "42.2", "-87.6", ""),
        row(4, "03/15/2024 02:30:00 PM", "001", "41.8", "-88.0", ""),
        row(5, "bad date", "001", "41.8", "-87.6", ""),
        row(6, "06/01/2022 11:00:00 AM", "001", "", "", "\"(41.7, -87.7)\""),
        row(7, "06/01/2022 11:00:00 AM", "001", "", "-87.7", "no coordinates"),
    ];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&rows, 3);

    let summary = run_pipeline_at(&fixture.config, now()).unwrap();

    let out = fixture.output_rows();
    let ids: Vec<&str> = out.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "6"]);
    for r in &out {
        let lat: f64 = r[2].parse().unwrap();
        let lon: f64 = r[3].parse().unwrap();
        assert!((41.6..=42.1).contains(&lat));
        assert!((-87.9..=-87.5).contains(&lon));

        let ts = NaiveDateTime::parse_from_str(&r[4], "%Y-%m-%dT%H:%M:%SZ").unwrap();
        assert!(ts >= summary.cutoff);
        assert_eq!(r[4].len(), 20);
    }
}

#[test]
fn test_missing_district_file_degrades_to_unknown() {
    let rows = [row(1, "03/15/2024 02:30:00 PM", "022", "41.8", "-87.6", "")];
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let mut fixture = Fixture::new(&rows, 10);
    fixture.config.districts_file = fixture.dir.path().join("nope.csv");

    run_pipeline_at(&fixture.config, now()).unwrap();

    let out = fixture.output_rows();
    assert_eq!(out[0][5], "22");
    assert_eq!(out[0][6], "Unknown");
}

#[test]
fn test_missing_input_is_fatal_before_any_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.csv");
    let config = PipelineConfig::new(dir.path().join("absent.csv"), &output);

    let result = run_pipeline_at(&config, now());

    assert!(matches!(result, Err(PipelineError::MissingPrimaryInput(_))));
    assert!(!output.exists());
}

#[test]
fn test_drive_skips_empty_batches() {
    let dir = tempdir().unwrap();
    let path: PathBuf = dir.path().join("out.csv");
    let mut sink = IncrementalSink::new(&path);
    let cutoff = compute_cutoff(now(), 5).unwrap();

    let fresh = RawRecord::new(1, "03/15/2024 02:30:00 PM").with_coordinates(41.8, -87.6);
    let stale = RawRecord::new(2, "03/15/2010 02:30:00 PM").with_coordinates(41.8, -87.6);
    let batches = vec![Ok(vec![stale.clone()]), Ok(vec![fresh]), Ok(vec![stale])];

    let counts = drive(batches, &DistrictMapping::new(), cutoff, &mut sink).unwrap();

    assert_eq!(counts.read, 3);
    assert_eq!(counts.written, 1);
    assert_eq!(sink.rows_written(), 1);
    assert_eq!(read_lines(&path), 2);
}

fn read_lines(path: &Path) -> usize {
    fs::read_to_string(path).unwrap().lines().count()
}

mod common;

use common::{dimension, test_config, view, FakeApi, FakeStorage};
use ga_pii_report::{
    analytics::{
        types::{DateRangeValues, Report, ReportData, ReportRow},
        BatchGetResponse,
    },
    config::MissingFields,
    flatten::flatten_page,
    pipeline::Pipeline,
    report::UnitStatus,
};
use time::macros::date;

// What the Reporting API sends for a window with no rows: `data` without `rows`.
const EMPTY_WINDOW: &str = r#"{
  "reports": [{
    "columnHeader": {
      "dimensions": ["ga:hostname"],
      "metricHeader": {"metricHeaderEntries": [{"name": "ga:pageviews", "type": "INTEGER"}]}
    },
    "data": {"totals": [{"values": ["0"]}], "rowCount": 0}
  }]
}"#;

fn row(dims: Option<Vec<&str>>, vals: Option<Vec<&str>>) -> ReportRow {
    ReportRow {
        dimensions: dims.map(|d| d.into_iter().map(String::from).collect()),
        metrics: vals.map(|v| {
            vec![DateRangeValues {
                values: Some(v.into_iter().map(String::from).collect()),
            }]
        }),
    }
}

fn page_of(rows: Vec<ReportRow>) -> BatchGetResponse {
    BatchGetResponse {
        reports: Some(vec![Report {
            data: Some(ReportData {
                rows: Some(rows),
                row_count: None,
            }),
            next_page_token: None,
        }]),
    }
}

#[test]
fn sequences_stay_aligned_across_pages() {
    let mut dims = Vec::new();
    let mut vals = Vec::new();

    let p1 = BatchGetResponse::single_page(&[("a.com", "3"), ("b.com", "10")], Some("2"));
    let p2 = BatchGetResponse::single_page(&[("c.com", "7")], None);

    let next = flatten_page(&p1, MissingFields::Tolerate, &mut dims, &mut vals).unwrap();
    assert_eq!(next.as_deref(), Some("2"));
    let next = flatten_page(&p2, MissingFields::Tolerate, &mut dims, &mut vals).unwrap();
    assert_eq!(next, None);

    assert_eq!(dims.len(), vals.len());
    assert_eq!(dims, vec!["a.com", "b.com", "c.com"]);
    assert_eq!(vals, vec![3, 10, 7]);
}

#[test]
fn tolerate_reads_missing_collections_as_empty() {
    let mut dims = Vec::new();
    let mut vals = Vec::new();

    let next = flatten_page(
        &BatchGetResponse::default(),
        MissingFields::Tolerate,
        &mut dims,
        &mut vals,
    )
    .unwrap();
    assert_eq!(next, None);

    let no_data = BatchGetResponse {
        reports: Some(vec![Report::default()]),
    };
    flatten_page(&no_data, MissingFields::Tolerate, &mut dims, &mut vals).unwrap();

    let half_rows = page_of(vec![
        row(Some(vec!["/only-dim"]), None),
        row(None, Some(vec!["4"])),
        row(Some(vec!["/ok"]), Some(vec!["2"])),
    ]);
    flatten_page(&half_rows, MissingFields::Tolerate, &mut dims, &mut vals).unwrap();

    assert_eq!(dims, vec!["/ok"]);
    assert_eq!(vals, vec![2]);
}

#[test]
fn strict_rejects_missing_collections() {
    let mut dims = Vec::new();
    let mut vals = Vec::new();

    let err = flatten_page(
        &BatchGetResponse::default(),
        MissingFields::Strict,
        &mut dims,
        &mut vals,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("reports"));

    let half_rows = page_of(vec![row(Some(vec!["/only-dim"]), None)]);
    assert!(flatten_page(&half_rows, MissingFields::Strict, &mut dims, &mut vals).is_err());
    assert!(dims.is_empty() && vals.is_empty());
}

#[test]
fn mismatched_row_is_always_an_error() {
    let mut dims = Vec::new();
    let mut vals = Vec::new();
    let bad = page_of(vec![row(Some(vec!["/a"]), Some(vec!["1", "2"]))]);
    let err = flatten_page(&bad, MissingFields::Tolerate, &mut dims, &mut vals).unwrap_err();
    assert!(err.to_string().contains("1 dimension value(s) but 2 metric value(s)"));
    assert!(dims.is_empty());
}

#[test]
fn non_numeric_metric_fails_the_page() {
    let mut dims = Vec::new();
    let mut vals = Vec::new();
    let bad = BatchGetResponse::single_page(&[("/a", "lots")], None);
    let err = flatten_page(&bad, MissingFields::Tolerate, &mut dims, &mut vals).unwrap_err();
    assert!(format!("{err:#}").contains("not an integer"));
}

#[test]
fn strict_reads_empty_window_as_no_rows() {
    let page: BatchGetResponse = serde_json::from_str(EMPTY_WINDOW).unwrap();
    let mut dims = Vec::new();
    let mut vals = Vec::new();
    let next = flatten_page(&page, MissingFields::Strict, &mut dims, &mut vals).unwrap();
    assert_eq!(next, None);
    assert!(dims.is_empty() && vals.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(vec![view("v1", "Main Site")], vec![dimension("ga:hostname", "Hostname")]);
    cfg.report.missing_fields = MissingFields::Strict;
    let api = FakeApi::default().script("v1", "ga:hostname", vec![page]);
    let storage = FakeStorage::default();

    let report = Pipeline::new(&cfg, &api, &storage, date!(2024 - 03 - 04), dir.path())
        .run_batch()
        .unwrap();
    assert_eq!(report.units[0].status, UnitStatus::NoData);
    assert_eq!(report.units[0].error, None);
    assert!(storage.uploads.borrow().is_empty());
}

#[test]
fn strict_rejects_rows_missing_despite_row_count() {
    let page = BatchGetResponse {
        reports: Some(vec![Report {
            data: Some(ReportData {
                rows: None,
                row_count: Some(3),
            }),
            next_page_token: None,
        }]),
    };
    let mut dims = Vec::new();
    let mut vals = Vec::new();
    let err = flatten_page(&page, MissingFields::Strict, &mut dims, &mut vals).unwrap_err();
    assert!(format!("{err:#}").contains("data.rows"));
    assert!(flatten_page(&page, MissingFields::Tolerate, &mut dims, &mut vals).is_ok());
}

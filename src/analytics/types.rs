use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest {
    pub report_requests: Vec<ReportRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<MetricRef>,
    pub dimensions: Vec<DimensionRef>,
    pub page_token: String,
    pub page_size: u32,
    pub sampling_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRef {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRef {
    pub name: String,
}

// Response side: every collection is optional so the flattener can apply
// the configured missing-field policy instead of serde failing the page.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetResponse {
    #[serde(default)]
    pub reports: Option<Vec<Report>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub data: Option<ReportData>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(default)]
    pub rows: Option<Vec<ReportRow>>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Option<Vec<String>>,
    #[serde(default)]
    pub metrics: Option<Vec<DateRangeValues>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

impl BatchGetResponse {
    /// Single-report page holding `rows` of (dimension value, metric value).
    pub fn single_page(rows: &[(&str, &str)], next_page_token: Option<&str>) -> Self {
        let rows = rows
            .iter()
            .map(|(dim, val)| ReportRow {
                dimensions: Some(vec![dim.to_string()]),
                metrics: Some(vec![DateRangeValues {
                    values: Some(vec![val.to_string()]),
                }]),
            })
            .collect();
        Self {
            reports: Some(vec![Report {
                data: Some(ReportData {
                    rows: Some(rows),
                    row_count: None,
                }),
                next_page_token: next_page_token.map(str::to_string),
            }]),
        }
    }
}

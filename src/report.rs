use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Uploaded,
    /// The API returned no rows for the window.
    NoData,
    /// Rows came back but none were flagged.
    NoPii,
    Failed,
    /// Not attempted because an earlier unit failed with `fail_fast` set.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    pub view_id: String,
    pub view_name: String,
    pub dimension_id: String,
    pub dimension_label: String,
    pub status: UnitStatus,
    pub pages: u32,
    pub total_rows: usize,
    pub pii_rows: usize,
    pub file: Option<String>,
    pub remote_id: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub run_name: String,
    pub run_date: String,
    pub window_start: String,
    pub window_end: String,
    pub folder_name: String,
    pub folder_id: Option<String>,
    pub started: String,
    pub finished: String,
    pub units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| u.status == UnitStatus::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }
}

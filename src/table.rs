use crate::{config::Config, pii::PiiClassifier, util::ensure_dir};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Position in the fetched sequence, before sorting.
    pub index: usize,
    pub value: String,
    pub metric: i64,
    pub pii: bool,
}

/// Rows for one (view, dimension) pair.
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub dimension_label: String,
    pub metric_label: String,
    pub rows: Vec<TableRow>,
}

impl ReportTable {
    pub fn build(
        dimension_label: &str,
        metric_label: &str,
        dim_values: Vec<String>,
        metric_values: Vec<i64>,
    ) -> Result<Self> {
        if dim_values.len() != metric_values.len() {
            bail!(
                "misaligned report columns: {} dimension values vs {} metric values",
                dim_values.len(),
                metric_values.len()
            );
        }
        let rows = dim_values
            .into_iter()
            .zip(metric_values)
            .enumerate()
            .map(|(index, (value, metric))| TableRow {
                index,
                value,
                metric,
                pii: false,
            })
            .collect();
        Ok(Self {
            dimension_label: dimension_label.to_string(),
            metric_label: metric_label.to_string(),
            rows,
        })
    }

    /// Descending by metric; equal metrics keep their fetched order.
    pub fn sort_by_metric_desc(&mut self) {
        self.rows.sort_by(|a, b| b.metric.cmp(&a.metric));
    }

    pub fn sanitize(&mut self) {
        for row in &mut self.rows {
            if row.value.contains(';') {
                row.value = sanitize_value(&row.value);
            }
        }
    }

    pub fn classify(&mut self, classifier: &PiiClassifier) {
        for row in &mut self.rows {
            row.pii = classifier.is_pii(&row.value);
        }
    }

    pub fn pii_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|r| r.pii)
    }

    /// Writes the PII-positive rows as CSV with a leading index column.
    pub fn write_pii_csv(&self, path: &Path) -> Result<usize> {
        let mut w = csv::Writer::from_path(path)
            .with_context(|| format!("create report: {}", path.display()))?;
        w.write_record(["", self.dimension_label.as_str(), self.metric_label.as_str(), "PII"])?;

        let mut written = 0;
        for row in self.pii_rows() {
            w.write_record([
                row.index.to_string(),
                row.value.clone(),
                row.metric.to_string(),
                "YES".to_string(),
            ])?;
            written += 1;
        }
        w.flush()
            .with_context(|| format!("flush report: {}", path.display()))?;
        Ok(written)
    }
}

pub fn sanitize_value(s: &str) -> String {
    s.replace(';', "")
}

pub fn report_filename(view_name: &str, dimension_label: &str) -> String {
    format!("PII - {view_name} - {dimension_label}.csv")
}

/// `report_filename` made safe as a single path component under the output directory.
pub fn local_filename(view_name: &str, dimension_label: &str) -> String {
    report_filename(view_name, dimension_label)
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct WrittenReport {
    pub path: PathBuf,
    /// Name the file gets in storage.
    pub remote_name: String,
    pub total_rows: usize,
    pub pii_rows: usize,
}

/// Turns fetched columns into a filtered CSV on disk.
pub struct ReportWriter {
    classifier: PiiClassifier,
    metric_label: String,
    out_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(cfg: &Config, out_dir: &Path) -> Result<Self> {
        Ok(Self {
            classifier: PiiClassifier::from_config(cfg)?,
            metric_label: cfg.report.metric_label.clone(),
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn classify_and_write(
        &self,
        dimension_label: &str,
        dim_values: Vec<String>,
        view_name: &str,
        metric_values: Vec<i64>,
    ) -> Result<WrittenReport> {
        let mut table =
            ReportTable::build(dimension_label, &self.metric_label, dim_values, metric_values)?;
        table.sort_by_metric_desc();
        table.sanitize();
        table.classify(&self.classifier);

        for row in table.pii_rows() {
            debug!(
                "pii row value={:?} matched={:?}",
                row.value,
                self.classifier.first_match(&row.value)
            );
        }

        ensure_dir(&self.out_dir)?;
        let path = self.out_dir.join(local_filename(view_name, dimension_label));
        let pii_rows = table.write_pii_csv(&path)?;
        info!(
            "wrote {} ({} of {} rows flagged)",
            path.display(),
            pii_rows,
            table.rows.len()
        );

        Ok(WrittenReport {
            path,
            remote_name: report_filename(view_name, dimension_label),
            total_rows: table.rows.len(),
            pii_rows,
        })
    }
}

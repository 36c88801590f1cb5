use crate::{
    analytics::ReportingApi,
    config::{Config, Dimension, View},
    fetch::Fetcher,
    notify::{Notifier, NoopNotifier},
    report::{BatchReport, UnitReport, UnitStatus},
    storage::Storage,
    table::ReportWriter,
    upload::Uploader,
    util::{iso_date, now_rfc3339, run_id, DateWindow},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;
use time::Date;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct WorkItem {
    pub view: View,
    pub dimension: Dimension,
}

/// Views in the outer loop, dimensions in the inner one.
pub fn work_items(cfg: &Config) -> Vec<WorkItem> {
    cfg.views
        .iter()
        .flat_map(|v| {
            cfg.dimensions.iter().map(move |d| WorkItem {
                view: v.clone(),
                dimension: d.clone(),
            })
        })
        .collect()
}

pub struct Pipeline<A: ReportingApi, S: Storage> {
    cfg: Config,
    api: A,
    storage: S,
    run_date: Date,
    out_dir: PathBuf,
    notifier: Box<dyn Notifier>,
}

#[derive(Debug, Default)]
struct UnitOutcome {
    pages: u32,
    total_rows: usize,
    pii_rows: usize,
    file: Option<String>,
    remote_id: Option<String>,
}

impl<A: ReportingApi, S: Storage> Pipeline<A, S> {
    pub fn new(cfg: &Config, api: A, storage: S, run_date: Date, out_dir: &Path) -> Self {
        Self {
            cfg: cfg.clone(),
            api,
            storage,
            run_date,
            out_dir: out_dir.to_path_buf(),
            notifier: Box::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::trailing(self.run_date, self.cfg.report.window_days)
    }

    /// Runs every (view, dimension) pair in order. A failing pair is recorded
    /// and the batch moves on, unless `global.fail_fast` is set.
    pub fn run_batch(&self) -> Result<BatchReport> {
        let started = now_rfc3339();
        let window = self.window();
        let run_id = run_id(&self.cfg, self.run_date);

        let writer = ReportWriter::new(&self.cfg, &self.out_dir)?;
        let fetcher = Fetcher::new(&self.cfg, &self.api, window);
        let mut uploader = Uploader::new(&self.cfg, &self.storage, self.run_date)?;

        info!(
            "run_id={} window={}..{} folder='{}'",
            run_id,
            iso_date(window.start),
            iso_date(window.end),
            uploader.folder_name()
        );

        let items = work_items(&self.cfg);
        let mut units = Vec::with_capacity(items.len());
        let mut aborted = false;

        for (i, item) in items.iter().enumerate() {
            let t0 = Instant::now();
            let mut unit = UnitReport {
                view_id: item.view.id.clone(),
                view_name: item.view.name.clone(),
                dimension_id: item.dimension.id.clone(),
                dimension_label: item.dimension.label.clone(),
                status: UnitStatus::Skipped,
                pages: 0,
                total_rows: 0,
                pii_rows: 0,
                file: None,
                remote_id: None,
                error: None,
                elapsed_ms: 0,
            };

            if aborted {
                units.push(unit);
                continue;
            }

            info!(
                "unit {}/{} view='{}' dimension='{}'",
                i + 1,
                items.len(),
                item.view.name,
                item.dimension.label
            );

            match self.run_unit(item, &fetcher, &writer, &mut uploader) {
                Ok((status, out)) => {
                    unit.status = status;
                    unit.pages = out.pages;
                    unit.total_rows = out.total_rows;
                    unit.pii_rows = out.pii_rows;
                    unit.file = out.file;
                    unit.remote_id = out.remote_id;
                }
                Err(err) => {
                    warn!(
                        "unit view='{}' dimension='{}' failed: {:#}",
                        item.view.name, item.dimension.label, err
                    );
                    unit.status = UnitStatus::Failed;
                    unit.error = Some(format!("{err:#}"));
                    if self.cfg.global.fail_fast {
                        warn!("fail_fast is set; skipping remaining units");
                        aborted = true;
                    }
                }
            }
            unit.elapsed_ms = t0.elapsed().as_millis() as u64;
            units.push(unit);
        }

        let report = BatchReport {
            run_id,
            run_name: self.cfg.global.run_name.clone(),
            run_date: iso_date(self.run_date),
            window_start: iso_date(window.start),
            window_end: iso_date(window.end),
            folder_name: uploader.folder_name().to_string(),
            folder_id: uploader.folder_id().map(str::to_string),
            started,
            finished: now_rfc3339(),
            units,
        };

        if !self.cfg.notify.only_on_failure || report.has_failures() {
            if let Err(err) = self.notifier.notify(&report) {
                warn!("notification failed: {:#}", err);
            }
        }

        Ok(report)
    }

    fn run_unit(
        &self,
        item: &WorkItem,
        fetcher: &Fetcher<'_, A>,
        writer: &ReportWriter,
        uploader: &mut Uploader<'_, S>,
    ) -> Result<(UnitStatus, UnitOutcome)> {
        let fetched = fetcher.fetch_all(&item.view.id, &item.dimension)?;
        let mut out = UnitOutcome {
            pages: fetched.pages,
            ..Default::default()
        };

        if fetched.dim_values.is_empty() {
            info!("no rows for view='{}' dimension='{}'", item.view.name, item.dimension.label);
            return Ok((UnitStatus::NoData, out));
        }

        let written = writer.classify_and_write(
            &item.dimension.label,
            fetched.dim_values,
            &item.view.name,
            fetched.metric_values,
        )?;
        out.total_rows = written.total_rows;
        out.pii_rows = written.pii_rows;
        out.file = Some(written.path.display().to_string());

        if written.pii_rows == 0 && !self.cfg.storage.upload_empty {
            return Ok((UnitStatus::NoPii, out));
        }

        let remote = uploader.upload(&written.path, &written.remote_name)?;
        out.remote_id = Some(remote.id);
        Ok((UnitStatus::Uploaded, out))
    }
}

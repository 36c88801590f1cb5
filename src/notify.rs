//! Post-batch notification hook.

use crate::config::{Config, NotifyKind};
use crate::http::{build_client, check_status};
use crate::report::{BatchReport, UnitStatus};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{info, warn};

pub trait Notifier {
    fn notify(&self, report: &BatchReport) -> Result<()>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _report: &BatchReport) -> Result<()> {
        Ok(())
    }
}

/// Writes the outcome to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &BatchReport) -> Result<()> {
        let failed = report.count(UnitStatus::Failed);
        if failed > 0 {
            warn!(
                "batch {} finished with {} failed unit(s) of {}",
                report.run_id,
                failed,
                report.units.len()
            );
            for u in report.failures() {
                warn!(
                    "  {} / {}: {}",
                    u.view_name,
                    u.dimension_label,
                    u.error.as_deref().unwrap_or("unknown error")
                );
            }
        } else {
            info!(
                "batch {} ok: uploaded={} no_pii={} no_data={}",
                report.run_id,
                report.count(UnitStatus::Uploaded),
                report.count(UnitStatus::NoPii),
                report.count(UnitStatus::NoData)
            );
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub event: &'static str,
    pub run_id: &'a str,
    pub run_date: &'a str,
    pub folder_name: &'a str,
    pub uploaded: usize,
    pub failed: usize,
    pub units: usize,
    pub timestamp: &'a str,
}

impl<'a> WebhookPayload<'a> {
    pub fn from_report(report: &'a BatchReport) -> Self {
        let failed = report.count(UnitStatus::Failed);
        Self {
            event: if failed > 0 { "batch_failed" } else { "batch_completed" },
            run_id: &report.run_id,
            run_date: &report.run_date,
            folder_name: &report.folder_name,
            uploaded: report.count(UnitStatus::Uploaded),
            failed,
            units: report.units.len(),
            timestamp: &report.finished,
        }
    }
}

/// POSTs a JSON summary to a URL.
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            url: url.to_string(),
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, report: &BatchReport) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(&WebhookPayload::from_report(report))
            .send()
            .with_context(|| format!("POST {}", self.url))?;
        check_status(resp, "webhook")?;
        Ok(())
    }
}

pub fn from_config(cfg: &Config) -> Result<Box<dyn Notifier>> {
    Ok(match cfg.notify.kind {
        NotifyKind::None => Box::new(NoopNotifier),
        NotifyKind::Log => Box::new(LogNotifier),
        NotifyKind::Webhook => Box::new(WebhookNotifier::new(
            &cfg.notify.webhook_url,
            cfg.notify.timeout_seconds,
        )?),
    })
}

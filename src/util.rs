use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Calendar date of the run in the operator's local zone, UTC if the offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn parse_iso_date(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}

pub fn iso_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

/// Formats `d` with a runtime `time` format description such as `[day]-[month]-[year repr:last_two]`.
pub fn format_date(d: Date, description: &str) -> Result<String> {
    let items = time::format_description::parse_borrowed::<1>(description)
        .map_err(|e| anyhow!("bad date format '{description}': {e}"))?;
    d.format(&items)
        .with_context(|| format!("formatting date with '{description}'"))
}

/// Inclusive reporting window ending the day before `run_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

impl DateWindow {
    pub fn trailing(run_date: Date, days: u32) -> Self {
        Self {
            start: run_date - Duration::days(i64::from(days)),
            end: run_date - Duration::days(1),
        }
    }
}

pub fn run_id(cfg: &Config, run_date: Date) -> String {
    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    sha256_hex(format!("{}:{}", cfg_hash, iso_date(run_date)).as_bytes())[..16].to_string()
}

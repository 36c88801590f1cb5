use crate::{
    analytics::{
        types::{DateRange, DimensionRef, MetricRef},
        ReportRequest, ReportingApi,
    },
    config::{Config, Dimension},
    flatten::flatten_page,
    util::{iso_date, DateWindow},
};
use anyhow::{bail, Context, Result};
use tracing::debug;

/// Cursor sent with the first request.
pub const FIRST_PAGE_TOKEN: &str = "0";

/// Everything fetched for one (view, dimension) pair.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub dim_values: Vec<String>,
    pub metric_values: Vec<i64>,
    pub pages: u32,
}

pub struct Fetcher<'a, A: ReportingApi + ?Sized> {
    cfg: &'a Config,
    api: &'a A,
    window: DateWindow,
}

impl<'a, A: ReportingApi + ?Sized> Fetcher<'a, A> {
    pub fn new(cfg: &'a Config, api: &'a A, window: DateWindow) -> Self {
        Self { cfg, api, window }
    }

    pub fn request(&self, view_id: &str, dimension: &Dimension, page_token: &str) -> ReportRequest {
        ReportRequest {
            view_id: view_id.to_string(),
            date_ranges: vec![DateRange {
                start_date: iso_date(self.window.start),
                end_date: iso_date(self.window.end),
            }],
            metrics: vec![MetricRef {
                expression: self.cfg.report.metric.clone(),
            }],
            dimensions: vec![DimensionRef {
                name: dimension.id.clone(),
            }],
            page_token: page_token.to_string(),
            page_size: self.cfg.effective_page_size(),
            sampling_level: self.cfg.report.sampling_level.clone(),
        }
    }

    /// Follows continuation tokens until the API stops returning one.
    pub fn fetch_all(&self, view_id: &str, dimension: &Dimension) -> Result<Fetched> {
        let mut out = Fetched::default();
        let mut token = FIRST_PAGE_TOKEN.to_string();

        loop {
            if out.pages >= self.cfg.report.max_pages {
                bail!(
                    "view {} dimension {}: still paginating after max_pages={}",
                    view_id,
                    dimension.id,
                    self.cfg.report.max_pages
                );
            }

            let req = self.request(view_id, dimension, &token);
            let page = self
                .api
                .fetch_page(&req)
                .with_context(|| format!("fetching page {} (token {token})", out.pages + 1))?;
            out.pages += 1;

            let next = flatten_page(
                &page,
                self.cfg.report.missing_fields,
                &mut out.dim_values,
                &mut out.metric_values,
            )
            .with_context(|| format!("flattening page {}", out.pages))?;

            match next {
                Some(t) if !t.is_empty() => {
                    debug!("next page token={t}");
                    token = t;
                }
                _ => break,
            }
        }

        Ok(out)
    }
}

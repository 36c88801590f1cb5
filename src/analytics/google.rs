use super::{types::*, ReportingApi};
use crate::auth::TokenSource;
use crate::config::Config;
use crate::http::{build_client, check_status};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;

/// Reporting API v4 `reports:batchGet` over blocking HTTP.
pub struct GoogleReportingApi {
    http: Client,
    tokens: TokenSource,
    url: String,
}

impl GoogleReportingApi {
    pub fn new(cfg: &Config, tokens: TokenSource) -> Result<Self> {
        let http = build_client(cfg.analytics.timeout_seconds)?;
        let url = format!(
            "{}/v4/reports:batchGet",
            cfg.analytics.endpoint.trim_end_matches('/')
        );
        Ok(Self { http, tokens, url })
    }
}

impl ReportingApi for GoogleReportingApi {
    fn fetch_page(&self, req: &ReportRequest) -> Result<BatchGetResponse> {
        debug!(
            "batchGet view={} dims={:?} token={} size={}",
            req.view_id,
            req.dimensions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            req.page_token,
            req.page_size
        );
        let body = BatchGetRequest {
            report_requests: vec![req.clone()],
        };
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(self.tokens.bearer()?)
            .json(&body)
            .send()
            .with_context(|| format!("POST {}", self.url))?;
        let resp = check_status(resp, "reports:batchGet")?;
        resp.json::<BatchGetResponse>()
            .with_context(|| "parsing batchGet response")
    }
}

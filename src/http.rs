use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use std::time::Duration;

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }
    builder.build().with_context(|| "building HTTP client")
}

/// Passes successful responses through; turns anything else into an error carrying the body.
pub fn check_status(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    bail!("{what} failed ({status}): {}", body.trim())
}

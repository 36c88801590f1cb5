use crate::analytics::{types::ReportRow, BatchGetResponse};
use crate::config::MissingFields;
use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

/// Appends one page's rows to the caller's `dims` / `vals` and returns the
/// continuation token, if any.
///
/// Both sequences grow by the same amount per row. A row whose dimension and
/// metric counts differ is rejected. Missing collections follow `policy`:
/// `Tolerate` reads them as empty (a row lacking either side is skipped so
/// alignment holds), `Strict` fails the page.
pub fn flatten_page(
    page: &BatchGetResponse,
    policy: MissingFields,
    dims: &mut Vec<String>,
    vals: &mut Vec<i64>,
) -> Result<Option<String>> {
    let reports = present(page.reports.as_deref(), "reports", policy)?;
    let mut next = None;

    for (ri, report) in reports.iter().enumerate() {
        next = report.next_page_token.clone();

        let rows: &[ReportRow] = match report.data.as_ref() {
            // The API leaves `rows` out when the window has none.
            Some(data) if data.rows.is_none() && data.row_count.unwrap_or(0) == 0 => &[],
            Some(data) => present(data.rows.as_deref(), "data.rows", policy)?,
            None => present(None, "data", policy)?,
        };

        for (i, row) in rows.iter().enumerate() {
            let row_dims = present(row.dimensions.as_deref(), "row.dimensions", policy)
                .with_context(|| format!("report {ri} row {i}"))?;
            let ranges = present(row.metrics.as_deref(), "row.metrics", policy)
                .with_context(|| format!("report {ri} row {i}"))?;

            let mut row_vals = Vec::new();
            for range in ranges {
                let values = present(range.values.as_deref(), "metrics.values", policy)
                    .with_context(|| format!("report {ri} row {i}"))?;
                for v in values {
                    row_vals.push(parse_metric(v).with_context(|| format!("report {ri} row {i}"))?);
                }
            }

            if row_dims.is_empty() && row_vals.is_empty() {
                continue;
            }
            if row_dims.is_empty() || row_vals.is_empty() {
                if policy == MissingFields::Strict {
                    bail!(
                        "report {ri} row {i}: {} dimension value(s) but {} metric value(s)",
                        row_dims.len(),
                        row_vals.len()
                    );
                }
                debug!("skipping half-empty row {i} of report {ri}");
                continue;
            }
            if row_dims.len() != row_vals.len() {
                bail!(
                    "report {ri} row {i}: {} dimension value(s) but {} metric value(s)",
                    row_dims.len(),
                    row_vals.len()
                );
            }

            dims.extend(row_dims.iter().cloned());
            vals.extend(row_vals);
        }

        info!("Number of unique pages: {}", dims.len());
    }

    Ok(next)
}

fn present<'a, T>(v: Option<&'a [T]>, field: &str, policy: MissingFields) -> Result<&'a [T]> {
    match (v, policy) {
        (Some(v), _) => Ok(v),
        (None, MissingFields::Tolerate) => Ok(&[]),
        (None, MissingFields::Strict) => Err(anyhow!("response is missing `{field}`")),
    }
}

fn parse_metric(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| anyhow!("metric value is not an integer: {raw:?}"))
}

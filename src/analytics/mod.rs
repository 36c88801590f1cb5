pub mod google;
pub mod types;

use anyhow::Result;

pub use types::{BatchGetRequest, BatchGetResponse, ReportRequest};

/// One call against the reporting API: a single request, a single page back.
pub trait ReportingApi {
    fn fetch_page(&self, req: &ReportRequest) -> Result<BatchGetResponse>;
}

impl<T: ReportingApi + ?Sized> ReportingApi for &T {
    fn fetch_page(&self, req: &ReportRequest) -> Result<BatchGetResponse> {
        (**self).fetch_page(req)
    }
}

use super::{types::*, Storage};
use crate::auth::TokenSource;
use crate::config::Config;
use crate::http::{build_client, check_status};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Drive v3 files API over blocking HTTP.
pub struct DriveStorage {
    http: Client,
    tokens: TokenSource,
    endpoint: String,
    upload_endpoint: String,
}

impl DriveStorage {
    pub fn new(cfg: &Config, tokens: TokenSource) -> Result<Self> {
        Ok(Self {
            http: build_client(cfg.storage.timeout_seconds)?,
            tokens,
            endpoint: cfg.storage.endpoint.trim_end_matches('/').to_string(),
            upload_endpoint: cfg.storage.upload_endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl Storage for DriveStorage {
    fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteFile>> {
        let url = format!("{}/files", self.endpoint);
        let query = format!("'{}' in parents", parent_id.replace('\'', "\\'"));
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.clone()),
                ("spaces", "drive".to_string()),
                ("fields", "nextPageToken, files(id, name)".to_string()),
            ];
            if let Some(t) = &page_token {
                params.push(("pageToken", t.clone()));
            }
            let resp = self
                .http
                .get(&url)
                .bearer_auth(self.tokens.bearer()?)
                .query(&params)
                .send()
                .with_context(|| format!("GET {url}"))?;
            let list: FileList = check_status(resp, "files.list")?
                .json()
                .with_context(|| "parsing files.list response")?;
            out.extend(list.files.unwrap_or_default());
            match list.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }

        debug!("files.list parent={} children={}", parent_id, out.len());
        Ok(out)
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<RemoteFile> {
        let url = format!("{}/files", self.endpoint);
        let meta = FileMetadata {
            name,
            mime_type: FOLDER_MIME,
            parents: vec![parent_id],
        };
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.tokens.bearer()?)
            .query(&[("fields", "id, name")])
            .json(&meta)
            .send()
            .with_context(|| format!("POST {url}"))?;
        check_status(resp, "files.create (folder)")?
            .json()
            .with_context(|| "parsing files.create response")
    }

    fn create_file(&self, upload: &FileUpload) -> Result<RemoteFile> {
        let url = format!("{}/files", self.upload_endpoint);
        let meta = FileMetadata {
            name: upload.name.as_str(),
            mime_type: upload.target_mime.as_str(),
            parents: vec![upload.parent_id.as_str()],
        };
        let boundary = format!("ga-pii-report-{}", crate::util::sha256_hex(&upload.bytes));
        let body = multipart_related(
            &boundary,
            &serde_json::to_vec(&meta)?,
            &upload.media_mime,
            &upload.bytes,
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.tokens.bearer()?)
            .query(&[("uploadType", "multipart"), ("fields", "id, name")])
            .header(CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
            .body(body)
            .send()
            .with_context(|| format!("POST {url}"))?;
        check_status(resp, "files.create (upload)")?
            .json()
            .with_context(|| "parsing upload response")
    }
}

/// Builds a two-part `multipart/related` body: JSON metadata, then the media bytes.
fn multipart_related(boundary: &str, metadata: &[u8], media_mime: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {media_mime}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

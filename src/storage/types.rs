use serde::{Deserialize, Serialize};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Option<Vec<RemoteFile>>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub parents: Vec<&'a str>,
}

/// A local file headed for a storage folder.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub parent_id: String,
    /// Type of the object created remotely (e.g. a spreadsheet).
    pub target_mime: String,
    /// Type of the uploaded bytes.
    pub media_mime: String,
    pub bytes: Vec<u8>,
}

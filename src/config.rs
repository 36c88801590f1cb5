use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest page the reporting API will return in one call.
pub const MAX_PAGE_SIZE: u32 = 100_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub analytics: Analytics,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub pii: Pii,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub notify: Notify,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.views.is_empty() {
            bail!("no [[views]] configured");
        }
        if self.dimensions.is_empty() {
            bail!("no [[dimensions]] configured");
        }
        for v in &self.views {
            if v.id.trim().is_empty() {
                bail!("view '{}' has an empty id", v.name);
            }
        }
        for d in &self.dimensions {
            if d.id.trim().is_empty() {
                bail!("dimension '{}' has an empty id", d.label);
            }
        }
        if self.report.page_size == 0 {
            bail!("report.page_size must be > 0");
        }
        if self.report.max_pages == 0 {
            bail!("report.max_pages must be > 0");
        }
        if self.report.window_days == 0 {
            bail!("report.window_days must be > 0");
        }
        if self.pii.pattern.trim().is_empty() {
            bail!("pii.pattern must not be empty");
        }
        if self.storage.parent_folder_id.trim().is_empty() {
            bail!("storage.parent_folder_id is not set");
        }
        if self.notify.kind == NotifyKind::Webhook && self.notify.webhook_url.trim().is_empty() {
            bail!("notify.kind = \"webhook\" requires notify.webhook_url");
        }
        Ok(())
    }

    /// Page size actually sent to the API.
    pub fn effective_page_size(&self) -> u32 {
        self.report.page_size.min(MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub run_name: String,
    pub print_summary: bool,
    pub fail_fast: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            run_name: "weekly".into(),
            print_summary: true,
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub out_dir: String,
    /// Where to write the batch summary JSON; empty disables it.
    pub summary_file: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            summary_file: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub key_file: String,
    /// Overrides the `token_uri` from the key file when non-empty.
    pub token_uri: String,
    pub analytics_scope: String,
    pub drive_scope: String,
}
impl Default for Auth {
    fn default() -> Self {
        Self {
            key_file: "client_secret.json".into(),
            token_uri: "".into(),
            analytics_scope: "https://www.googleapis.com/auth/analytics.readonly".into(),
            drive_scope: "https://www.googleapis.com/auth/drive.file".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub endpoint: String,
    pub timeout_seconds: u64,
}
impl Default for Analytics {
    fn default() -> Self {
        Self {
            endpoint: "https://analyticsreporting.googleapis.com".into(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFields {
    /// Absent collections count as empty.
    Tolerate,
    /// Absent collections are an error.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    pub metric: String,
    pub metric_label: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub window_days: u32,
    pub sampling_level: String,
    pub missing_fields: MissingFields,
}
impl Default for Report {
    fn default() -> Self {
        Self {
            metric: "ga:pageviews".into(),
            metric_label: "Pageviews".into(),
            page_size: MAX_PAGE_SIZE,
            max_pages: 1000,
            window_days: 7,
            sampling_level: "LARGE".into(),
            missing_fields: MissingFields::Tolerate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// API field name, e.g. `ga:hostname`.
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pii {
    pub pattern: String,
    pub extra_patterns: Vec<String>,
    pub case_insensitive: bool,
}
impl Default for Pii {
    fn default() -> Self {
        Self {
            pattern: crate::pii::DEFAULT_PII_PATTERN.into(),
            extra_patterns: Vec::new(),
            case_insensitive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub endpoint: String,
    pub upload_endpoint: String,
    pub timeout_seconds: u64,
    pub parent_folder_id: String,
    pub folder_suffix: String,
    /// `time` format description for the date prefix of the folder name.
    pub date_format: String,
    pub target_mime: String,
    pub media_mime: String,
    pub upload_empty: bool,
    pub delete_local_after_upload: bool,
}
impl Default for Storage {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/drive/v3".into(),
            upload_endpoint: "https://www.googleapis.com/upload/drive/v3".into(),
            timeout_seconds: 300,
            parent_folder_id: "".into(),
            folder_suffix: "GA PII Reports".into(),
            date_format: "[day]-[month]-[year repr:last_two]".into(),
            target_mime: "application/vnd.google-apps.spreadsheet".into(),
            media_mime: "text/csv".into(),
            upload_empty: false,
            delete_local_after_upload: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    None,
    Log,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Notify {
    pub kind: NotifyKind,
    pub webhook_url: String,
    pub timeout_seconds: u64,
    pub only_on_failure: bool,
}
impl Default for Notify {
    fn default() -> Self {
        Self {
            kind: NotifyKind::Log,
            webhook_url: "".into(),
            timeout_seconds: 10,
            only_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

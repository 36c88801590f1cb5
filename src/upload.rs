use crate::{
    config::Config,
    storage::{FileUpload, RemoteFile, Storage},
    util::format_date,
};
use anyhow::{Context, Result};
use std::path::Path;
use time::Date;
use tracing::info;

/// `<date> - <suffix>`, e.g. `04-03-24 - GA PII Reports`.
pub fn folder_name(cfg: &Config, run_date: Date) -> Result<String> {
    let date = format_date(run_date, &cfg.storage.date_format)?;
    Ok(format!("{} - {}", date, cfg.storage.folder_suffix))
}

/// Uploads reports into the run's dated folder, resolving the folder at most once.
pub struct Uploader<'a, S: Storage + ?Sized> {
    cfg: &'a Config,
    storage: &'a S,
    folder_name: String,
    folder_id: Option<String>,
}

impl<'a, S: Storage + ?Sized> Uploader<'a, S> {
    pub fn new(cfg: &'a Config, storage: &'a S, run_date: Date) -> Result<Self> {
        Ok(Self {
            cfg,
            storage,
            folder_name: folder_name(cfg, run_date)?,
            folder_id: None,
        })
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }

    /// First child of the parent folder with the exact name wins; otherwise a new folder is created.
    pub fn resolve_folder(&mut self) -> Result<String> {
        if let Some(id) = &self.folder_id {
            return Ok(id.clone());
        }

        let parent = &self.cfg.storage.parent_folder_id;
        let children = self
            .storage
            .list_children(parent)
            .with_context(|| format!("listing folder {parent}"))?;

        let id = match children.into_iter().find(|f| f.name == self.folder_name) {
            Some(existing) => {
                info!("reusing folder '{}' id={}", self.folder_name, existing.id);
                existing.id
            }
            None => {
                let created = self
                    .storage
                    .create_folder(&self.folder_name, parent)
                    .with_context(|| format!("creating folder '{}'", self.folder_name))?;
                info!("created folder '{}' id={}", self.folder_name, created.id);
                created.id
            }
        };

        self.folder_id = Some(id.clone());
        Ok(id)
    }

    /// Uploads the local file at `path` under `name`.
    pub fn upload(&mut self, path: &Path, name: &str) -> Result<RemoteFile> {
        let folder_id = self.resolve_folder()?;
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;

        let upload = FileUpload {
            name: name.to_string(),
            parent_id: folder_id,
            target_mime: self.cfg.storage.target_mime.clone(),
            media_mime: self.cfg.storage.media_mime.clone(),
            bytes,
        };
        let remote = self
            .storage
            .create_file(&upload)
            .with_context(|| format!("uploading {}", path.display()))?;
        info!("uploaded {} as id={}", upload.name, remote.id);

        if self.cfg.storage.delete_local_after_upload {
            std::fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
        }
        Ok(remote)
    }
}

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use ga_pii_report::{
    analytics::{BatchGetResponse, ReportRequest, ReportingApi},
    config::{Config, Dimension, View},
    storage::{FileUpload, RemoteFile, Storage},
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub fn view(id: &str, name: &str) -> View {
    View {
        id: id.into(),
        name: name.into(),
    }
}

pub fn dimension(id: &str, label: &str) -> Dimension {
    Dimension {
        id: id.into(),
        label: label.into(),
    }
}

pub fn test_config(views: Vec<View>, dimensions: Vec<Dimension>) -> Config {
    let mut cfg = Config::default();
    cfg.views = views;
    cfg.dimensions = dimensions;
    cfg.storage.parent_folder_id = "parent".into();
    cfg
}

/// Scripted pages per (view id, dimension id); unscripted pairs get an empty response.
#[derive(Default)]
pub struct FakeApi {
    pages: HashMap<(String, String), Vec<BatchGetResponse>>,
    failing: HashSet<(String, String)>,
    pub calls: RefCell<Vec<ReportRequest>>,
}

impl FakeApi {
    pub fn script(mut self, view_id: &str, dim_id: &str, pages: Vec<BatchGetResponse>) -> Self {
        self.pages.insert((view_id.into(), dim_id.into()), pages);
        self
    }

    pub fn fail(mut self, view_id: &str, dim_id: &str) -> Self {
        self.failing.insert((view_id.into(), dim_id.into()));
        self
    }

    pub fn calls_for(&self, view_id: &str, dim_id: &str) -> Vec<ReportRequest> {
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.view_id == view_id && r.dimensions[0].name == dim_id)
            .cloned()
            .collect()
    }
}

impl ReportingApi for FakeApi {
    fn fetch_page(&self, req: &ReportRequest) -> Result<BatchGetResponse> {
        let key = (req.view_id.clone(), req.dimensions[0].name.clone());
        let seen = self
            .calls
            .borrow()
            .iter()
            .filter(|r| r.view_id == key.0 && r.dimensions[0].name == key.1)
            .count();
        self.calls.borrow_mut().push(req.clone());

        if self.failing.contains(&key) {
            return Err(anyhow!("quota exceeded for view {}", key.0));
        }
        match self.pages.get(&key) {
            Some(pages) => pages
                .get(seen)
                .cloned()
                .ok_or_else(|| anyhow!("no scripted page {seen} for {key:?}")),
            None => Ok(BatchGetResponse::default()),
        }
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub children: RefCell<HashMap<String, Vec<RemoteFile>>>,
    pub uploads: RefCell<Vec<FileUpload>>,
    pub list_calls: RefCell<usize>,
    pub fail_uploads: bool,
    pub next_id: RefCell<u32>,
}

impl FakeStorage {
    pub fn with_child(self, parent: &str, id: &str, name: &str) -> Self {
        self.children
            .borrow_mut()
            .entry(parent.into())
            .or_default()
            .push(RemoteFile {
                id: id.into(),
                name: name.into(),
            });
        self
    }

    fn mint(&self, prefix: &str) -> String {
        let mut n = self.next_id.borrow_mut();
        *n += 1;
        format!("{prefix}-{}", *n)
    }

    pub fn folder_names(&self, parent: &str) -> Vec<String> {
        self.children
            .borrow()
            .get(parent)
            .map(|c| c.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl Storage for FakeStorage {
    fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteFile>> {
        *self.list_calls.borrow_mut() += 1;
        Ok(self
            .children
            .borrow()
            .get(parent_id)
            .cloned()
            .unwrap_or_default())
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<RemoteFile> {
        let f = RemoteFile {
            id: self.mint("folder"),
            name: name.into(),
        };
        self.children
            .borrow_mut()
            .entry(parent_id.into())
            .or_default()
            .push(f.clone());
        Ok(f)
    }

    fn create_file(&self, upload: &FileUpload) -> Result<RemoteFile> {
        if self.fail_uploads {
            return Err(anyhow!("503 backend error"));
        }
        self.uploads.borrow_mut().push(upload.clone());
        Ok(RemoteFile {
            id: self.mint("file"),
            name: upload.name.clone(),
        })
    }
}

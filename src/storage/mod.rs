pub mod drive;
pub mod types;

use anyhow::Result;

pub use types::{FileUpload, RemoteFile};

pub trait Storage {
    fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteFile>>;
    fn create_folder(&self, name: &str, parent_id: &str) -> Result<RemoteFile>;
    fn create_file(&self, upload: &FileUpload) -> Result<RemoteFile>;
}

impl<T: Storage + ?Sized> Storage for &T {
    fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteFile>> {
        (**self).list_children(parent_id)
    }
    fn create_folder(&self, name: &str, parent_id: &str) -> Result<RemoteFile> {
        (**self).create_folder(name, parent_id)
    }
    fn create_file(&self, upload: &FileUpload) -> Result<RemoteFile> {
        (**self).create_file(upload)
    }
}

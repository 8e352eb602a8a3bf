//! Seams to the remote store. The index only ever talks to Drive through
//! these traits, which keeps it testable without a network.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Summary of a remote object as returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

impl RemoteObject {
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

pub trait RemoteLister {
    /// Non-trashed objects owned by the user named `name` inside `parent_id`,
    /// in the order the store reports them.
    fn list_children(&self, parent_id: &str, name: &str) -> Result<Vec<RemoteObject>, RemoteError>;
}

/// Called with `(bytes_done, total_bytes)` while content streams.
pub type ProgressFn<'a> = dyn FnMut(u64, Option<u64>) + 'a;

pub trait RemoteTransfer {
    /// Uploads `source` as a new file named `name` under `parent_id`.
    fn create(&self, parent_id: &str, name: &str, source: &Path) -> Result<String, RemoteError>;
    /// Replaces the content of `id` with the bytes of `source`.
    fn update(&self, id: &str, source: &Path) -> Result<(), RemoteError>;
    /// Streams the content of `id` into `sink`, returning the byte count.
    fn download(
        &self,
        id: &str,
        sink: &mut dyn Write,
        progress: &mut ProgressFn<'_>,
    ) -> Result<u64, RemoteError>;
    /// Server-side copy of `id` named `name`; returns the new id.
    fn copy(&self, id: &str, name: &str) -> Result<String, RemoteError>;
    fn name_of(&self, id: &str) -> Result<String, RemoteError>;
}

/// Everything a connected Drive session can do.
pub trait RemoteDrive: RemoteLister + RemoteTransfer {}

impl<T: RemoteLister + RemoteTransfer> RemoteDrive for T {}

pub trait CredentialProvider {
    /// A bearer token usable right now.
    fn access_token(&self) -> Result<String, RemoteError>;
}

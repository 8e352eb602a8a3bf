pub mod auth;
pub mod index;
pub mod transfer;

pub use auth::{auth, AuthRequest};
pub use index::{
    index, link, list, unindex, unlink, IndexRequest, LinkRequest, ListRequest, UnindexRequest,
    UnlinkRequest,
};
pub use transfer::{
    backup, download, sync, update, upload, BackupRequest, DownloadRequest, SyncRequest,
    UpdateRequest, UploadRequest,
};

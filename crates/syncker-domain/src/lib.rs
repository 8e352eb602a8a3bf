#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod document;
pub mod error;
pub mod index;
pub mod links;
pub mod path;
pub mod remote;
pub mod render;
pub mod tree;

pub use document::{is_reserved_name, RESERVED_KEYS};
pub use error::{codes, IndexError, RemoteError};
pub use index::{check_entry_name, DriveIndex, LinkedPair};
pub use links::{LinkRegistry, LinkReplacement};
pub use path::{is_drive_path, parse, LocalPath, RemotePath, DRIVE_PREFIX};
pub use remote::{
    CredentialProvider, ProgressFn, RemoteDrive, RemoteLister, RemoteObject, RemoteTransfer,
    FOLDER_MIME_TYPE,
};
pub use render::{render, RenderMode, RenderOptions, RenderedLine, TREE_BRANCH};
pub use tree::{IndexNode, IndexTree, Walk, ROOT_ID};

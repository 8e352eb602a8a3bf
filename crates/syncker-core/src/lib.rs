#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::config::context;
pub(crate) use crate::core::tooling::{diagnostics, outcome};
pub(crate) use crate::core::{effects, store, sync};

pub use crate::core::drive;
pub use crate::core::tooling::progress;

pub use crate::core::commands::{
    auth, backup, download, index, link, list, sync as sync_file, unindex, unlink, update, upload,
    AuthRequest, BackupRequest, DownloadRequest, IndexRequest, LinkRequest, ListRequest,
    SyncRequest, UnindexRequest, UnlinkRequest, UpdateRequest, UploadRequest,
};
pub use crate::core::config::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::core::config::{Config, DriveConfig, GlobalOptions, StateConfig};
pub use crate::core::effects::{ConsentFlow, DriveConnector, Effects, SharedEffects, SystemEffects};
pub use crate::core::facade::{error_outcome, format_status_message, to_json_response};
pub use crate::core::store::{IndexStore, StoreError};
pub use crate::core::sync::{SyncCoordinator, SyncError};
pub use crate::core::tooling::diagnostics as diag;
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome};

//! Content transfers between linked local files and Drive.

use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use syncker_domain::{
    check_entry_name, DriveIndex, IndexError, LinkReplacement, LinkedPair, LocalPath, RemoteDrive, RemoteError,
    RemotePath,
};
use tempfile::NamedTempFile;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::diagnostics;
use crate::progress::ProgressReporter;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("{path} does not exist")]
    MissingLocalFile { path: String },
    #[error("{path} already exists")]
    DestinationExists { path: String },
    #[error("Drive name \"{name}\" is not a plain file name")]
    UnsafeName { name: String },
    #[error("unable to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Index(err) => err.code(),
            Self::Remote(err) => err.code(),
            Self::MissingLocalFile { .. } => diagnostics::local::MISSING_LOCAL_FILE,
            Self::DestinationExists { .. } => diagnostics::local::DESTINATION_EXISTS,
            Self::UnsafeName { .. } => diagnostics::local::UNSAFE_NAME,
            Self::Io { .. } => diagnostics::local::LOCAL_IO,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub source: RemotePath,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub source: RemotePath,
    pub destination: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub local: LocalPath,
    pub remote: RemotePath,
    pub id: String,
    pub indexed: bool,
    pub replaced: Vec<LinkReplacement>,
}

/// Moves file content between the local disk and Drive for indexed paths.
pub struct SyncCoordinator<'a> {
    drive: &'a dyn RemoteDrive,
    cwd: &'a Path,
    progress: ProgressReporter,
}

impl<'a> SyncCoordinator<'a> {
    #[must_use]
    pub fn new(drive: &'a dyn RemoteDrive, cwd: &'a Path, progress: ProgressReporter) -> Self {
        Self {
            drive,
            cwd,
            progress,
        }
    }

    /// Uploads the linked local file over its Drive counterpart. `input` is
    /// either side of the link.
    pub fn sync(&self, index: &DriveIndex, input: &str) -> Result<LinkedPair, SyncError> {
        let pair = index.resolve_linked_pair(input, self.cwd)?;
        if !pair.local.exists() {
            return Err(SyncError::MissingLocalFile {
                path: pair.local.to_string(),
            });
        }
        info!("Syncing {} with {}", pair.remote, pair.local);
        self.drive.update(&pair.id, pair.local.as_std_path())?;
        Ok(pair)
    }

    /// Overwrites an indexed Drive file with any local file, linked or not.
    pub fn update(
        &self,
        index: &DriveIndex,
        remote: &RemotePath,
        local: &LocalPath,
    ) -> Result<String, SyncError> {
        if !local.exists() {
            return Err(SyncError::MissingLocalFile {
                path: local.to_string(),
            });
        }
        let node = index.tree().resolve(remote)?;
        if node.is_folder() {
            return Err(IndexError::NotAFile {
                path: remote.to_string(),
            }
            .into());
        }
        info!("Updating {remote} with {local}");
        self.drive.update(node.id(), local.as_std_path())?;
        Ok(node.id().to_string())
    }

    /// Copies an indexed Drive file next to itself. The copy is not indexed.
    pub fn backup(
        &self,
        index: &DriveIndex,
        remote: &RemotePath,
        name: Option<&str>,
    ) -> Result<BackupReport, SyncError> {
        let node = index.tree().resolve(remote)?;
        if node.is_folder() {
            return Err(IndexError::NotAFile {
                path: remote.to_string(),
            }
            .into());
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => backup_name(&self.drive.name_of(node.id())?, backup_clock()),
        };
        info!("Backing up {remote} to {name}");
        let id = self.drive.copy(node.id(), &name)?;
        Ok(BackupReport {
            source: remote.clone(),
            id,
            name,
        })
    }

    /// Fetches an indexed Drive file. Nothing is written at the destination
    /// unless the whole transfer succeeds.
    pub fn download(
        &self,
        index: &DriveIndex,
        remote: &RemotePath,
        destination: Option<&str>,
    ) -> Result<DownloadReport, SyncError> {
        let node = index.tree().resolve(remote)?;
        if node.is_folder() {
            return Err(IndexError::NotAFile {
                path: remote.to_string(),
            }
            .into());
        }
        let destination = match destination {
            Some(path) => self.cwd.join(path),
            None => self.cwd.join(local_file_name(&self.drive.name_of(node.id())?)?),
        };
        let shown = destination.display().to_string();
        if destination.exists() {
            return Err(SyncError::DestinationExists { path: shown });
        }
        let parent = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(self.cwd);
        let mut staged = NamedTempFile::new_in(parent).map_err(|source| SyncError::Io {
            path: shown.clone(),
            source,
        })?;

        info!("Downloading {remote} to {shown}");
        let mut bar = self.progress.transfer("Downloading");
        let bytes = self
            .drive
            .download(node.id(), &mut staged, &mut |done, total| bar.update(done, total))?;
        bar.finish();

        staged.persist_noclobber(&destination).map_err(|err| {
            if err.error.kind() == io::ErrorKind::AlreadyExists {
                SyncError::DestinationExists {
                    path: shown.clone(),
                }
            } else {
                SyncError::Io {
                    path: shown.clone(),
                    source: err.error,
                }
            }
        })?;
        debug!(bytes, destination = %shown, "download complete");
        Ok(DownloadReport {
            source: remote.clone(),
            destination,
            bytes,
        })
    }

    /// Uploads `local` as a new file in the indexed folder `folder` and,
    /// unless `skip_index`, indexes and links the result.
    pub fn upload(
        &self,
        index: &mut DriveIndex,
        local: &LocalPath,
        folder: &RemotePath,
        name: Option<&str>,
        skip_index: bool,
    ) -> Result<UploadReport, SyncError> {
        if !local.as_std_path().is_file() {
            return Err(SyncError::MissingLocalFile {
                path: local.to_string(),
            });
        }
        let parent = index.tree().resolve(folder)?;
        if !parent.is_folder() {
            return Err(IndexError::NotAFolder {
                name: folder.name().unwrap_or_default().to_string(),
            }
            .into());
        }
        let name = match name.or_else(|| local.file_name()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(IndexError::InvalidLocalPath {
                    path: local.to_string(),
                    reason: "no file name to upload under".into(),
                }
                .into())
            }
        };
        check_entry_name(folder, &name)?;
        let remote = folder.join(&name);
        info!("Uploading {local} to {remote}");
        let id = self
            .drive
            .create(parent.id(), &name, local.as_std_path())?;

        let replaced = if skip_index {
            Vec::new()
        } else {
            info!("Indexing and linking {remote}");
            index.adopt_upload(folder, &name, &id, local.clone())?
        };
        Ok(UploadReport {
            local: local.clone(),
            remote,
            id,
            indexed: !skip_index,
            replaced,
        })
    }
}

/// A Drive name is only usable as a download target when it is a single
/// plain path component.
fn local_file_name(name: &str) -> Result<&str, SyncError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(name),
        _ => Err(SyncError::UnsafeName {
            name: name.to_string(),
        }),
    }
}

fn backup_clock() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `BACKUP-<timestamp>-<name>`.
pub(crate) fn backup_name(original: &str, at: OffsetDateTime) -> String {
    let stamp = at
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("BACKUP-{stamp}-{original}")
}

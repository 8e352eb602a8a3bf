//! Commands that move file content to or from Drive.

use anyhow::Result;
use serde_json::json;
use syncker_domain::{LocalPath, RemotePath};
use tracing::warn;

use crate::context::CommandContext;
use crate::outcome::ExecutionOutcome;
use crate::sync::SyncCoordinator;

#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub drive_file: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub drive_file: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub drive_file: String,
    pub local_file: String,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub local_file: String,
    pub drive_folder: String,
    pub name: Option<String>,
    pub no_index: bool,
}

pub fn sync(ctx: &CommandContext, request: &SyncRequest) -> Result<ExecutionOutcome> {
    let index = ctx.store()?.load()?;
    let drive = ctx.drive()?;
    let coordinator = SyncCoordinator::new(drive.as_ref(), ctx.cwd(), ctx.progress());
    let pair = coordinator.sync(&index, &request.file)?;
    Ok(ExecutionOutcome::success(
        format!(
            "synced {} with {}",
            pair.remote,
            pair.local.shorten(ctx.home())
        ),
        json!({ "remote": pair.remote, "local": pair.local, "id": pair.id }),
    ))
}

pub fn backup(ctx: &CommandContext, request: &BackupRequest) -> Result<ExecutionOutcome> {
    let remote = RemotePath::parse(&request.drive_file)?;
    let index = ctx.store()?.load()?;
    let drive = ctx.drive()?;
    let coordinator = SyncCoordinator::new(drive.as_ref(), ctx.cwd(), ctx.progress());
    let report = coordinator.backup(&index, &remote, request.name.as_deref())?;
    Ok(ExecutionOutcome::success(
        format!("backed up {} to {}", report.source, report.name),
        serde_json::to_value(&report)?,
    ))
}

pub fn download(ctx: &CommandContext, request: &DownloadRequest) -> Result<ExecutionOutcome> {
    let remote = RemotePath::parse(&request.drive_file)?;
    let index = ctx.store()?.load()?;
    let drive = ctx.drive()?;
    let coordinator = SyncCoordinator::new(drive.as_ref(), ctx.cwd(), ctx.progress());
    let report = coordinator.download(&index, &remote, request.to.as_deref())?;
    Ok(ExecutionOutcome::success(
        format!(
            "downloaded {} to {}",
            report.source,
            report.destination.display()
        ),
        serde_json::to_value(&report)?,
    ))
}

pub fn update(ctx: &CommandContext, request: &UpdateRequest) -> Result<ExecutionOutcome> {
    let remote = RemotePath::parse(&request.drive_file)?;
    let local = LocalPath::with_base(&request.local_file, ctx.cwd())?;
    let index = ctx.store()?.load()?;
    let drive = ctx.drive()?;
    let coordinator = SyncCoordinator::new(drive.as_ref(), ctx.cwd(), ctx.progress());
    let id = coordinator.update(&index, &remote, &local)?;
    Ok(ExecutionOutcome::success(
        format!("updated {remote} with {}", local.shorten(ctx.home())),
        json!({ "remote": remote, "local": local, "id": id }),
    ))
}

pub fn upload(ctx: &CommandContext, request: &UploadRequest) -> Result<ExecutionOutcome> {
    let local = LocalPath::with_base(&request.local_file, ctx.cwd())?;
    let folder = RemotePath::parse(&request.drive_folder)?;
    let store = ctx.store()?;
    let mut index = store.load()?;
    let drive = ctx.drive()?;
    let coordinator = SyncCoordinator::new(drive.as_ref(), ctx.cwd(), ctx.progress());
    let report = coordinator.upload(
        &mut index,
        &local,
        &folder,
        request.name.as_deref(),
        request.no_index,
    )?;
    if report.indexed {
        store.save(&index)?;
    }
    for replacement in &report.replaced {
        warn!("{replacement}");
    }
    Ok(ExecutionOutcome::success(
        format!("uploaded {} to {}", local.shorten(ctx.home()), report.remote),
        serde_json::to_value(&report)?,
    ))
}

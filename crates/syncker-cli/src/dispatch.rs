use syncker_core::{
    self, BackupRequest, CommandContext, CommandGroup, CommandInfo, DownloadRequest,
    ExecutionOutcome, IndexRequest, LinkRequest, ListRequest, SyncRequest, UnindexRequest,
    UnlinkRequest, UpdateRequest, UploadRequest,
};

use crate::cli::CommandGroupCli;

pub fn command_info(group: &CommandGroupCli) -> CommandInfo {
    match group {
        CommandGroupCli::Auth => CommandInfo::new(CommandGroup::Auth, "auth"),
        CommandGroupCli::List(_) => CommandInfo::new(CommandGroup::List, "list"),
        CommandGroupCli::Index(_) => CommandInfo::new(CommandGroup::Index, "index"),
        CommandGroupCli::Unindex(_) => CommandInfo::new(CommandGroup::Unindex, "unindex"),
        CommandGroupCli::Link(_) => CommandInfo::new(CommandGroup::Link, "link"),
        CommandGroupCli::Unlink(_) => CommandInfo::new(CommandGroup::Unlink, "unlink"),
        CommandGroupCli::Sync(_) => CommandInfo::new(CommandGroup::Sync, "sync"),
        CommandGroupCli::Backup(_) => CommandInfo::new(CommandGroup::Backup, "backup"),
        CommandGroupCli::Download(_) => CommandInfo::new(CommandGroup::Download, "download"),
        CommandGroupCli::Update(_) => CommandInfo::new(CommandGroup::Update, "update"),
        CommandGroupCli::Upload(_) => CommandInfo::new(CommandGroup::Upload, "upload"),
    }
}

pub fn dispatch_command(ctx: &CommandContext, group: &CommandGroupCli) -> ExecutionOutcome {
    let info = command_info(group);
    match group {
        CommandGroupCli::Auth => {
            core_call(info, || syncker_core::auth(ctx, &syncker_core::AuthRequest))
        }
        CommandGroupCli::List(args) => {
            let request = ListRequest {
                flat: args.flat,
                hide_links: args.hide_links,
            };
            core_call(info, || syncker_core::list(ctx, &request))
        }
        CommandGroupCli::Index(args) => {
            let request = IndexRequest {
                path: args.drive_file.clone(),
            };
            core_call(info, || syncker_core::index(ctx, &request))
        }
        CommandGroupCli::Unindex(args) => {
            let request = UnindexRequest {
                path: args.drive_file.clone(),
            };
            core_call(info, || syncker_core::unindex(ctx, &request))
        }
        CommandGroupCli::Link(args) => {
            let request = LinkRequest {
                drive_file: args.drive_file.clone(),
                local_file: args.local_file.clone(),
            };
            core_call(info, || syncker_core::link(ctx, &request))
        }
        CommandGroupCli::Unlink(args) => {
            let request = UnlinkRequest {
                file: args.file.clone(),
            };
            core_call(info, || syncker_core::unlink(ctx, &request))
        }
        CommandGroupCli::Sync(args) => {
            let request = SyncRequest {
                file: args.file.clone(),
            };
            core_call(info, || syncker_core::sync_file(ctx, &request))
        }
        CommandGroupCli::Backup(args) => {
            let request = BackupRequest {
                drive_file: args.drive_file.clone(),
                name: args.name.clone(),
            };
            core_call(info, || syncker_core::backup(ctx, &request))
        }
        CommandGroupCli::Download(args) => {
            let request = DownloadRequest {
                drive_file: args.drive_file.clone(),
                to: args.to.clone(),
            };
            core_call(info, || syncker_core::download(ctx, &request))
        }
        CommandGroupCli::Update(args) => {
            let request = UpdateRequest {
                drive_file: args.drive_file.clone(),
                local_file: args.local_file.clone(),
            };
            core_call(info, || syncker_core::update(ctx, &request))
        }
        CommandGroupCli::Upload(args) => {
            let request = UploadRequest {
                local_file: args.local_file.clone(),
                drive_folder: args.drive_folder.clone(),
                name: args.name.clone(),
                no_index: args.no_index,
            };
            core_call(info, || syncker_core::upload(ctx, &request))
        }
    }
}

fn core_call<F>(info: CommandInfo, action: F) -> ExecutionOutcome
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::debug!(command = info.name, error = ?err, "command failed");
            syncker_core::error_outcome(&err)
        }
    }
}

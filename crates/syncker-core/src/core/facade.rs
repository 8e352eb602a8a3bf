//! Shapes outcomes and errors for the CLI.

use serde_json::{json, Value};
use syncker_domain::{IndexError, RemoteError};

use crate::context::CommandInfo;
use crate::outcome::{CommandStatus, ExecutionOutcome};
use crate::store::StoreError;
use crate::sync::SyncError;

const INTERNAL_HINT: &str = "Re-run with `--trace` for more detail, or open an issue if this persists.";

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("syncker {}", info.name)
    } else {
        format!("syncker {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

/// Turns a handler error into an outcome. Typed errors anywhere in the
/// chain decide the status; anything else is an internal failure.
#[must_use]
pub fn error_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    for cause in err.chain() {
        if let Some(sync) = cause.downcast_ref::<SyncError>() {
            return sync_outcome(sync);
        }
        if let Some(index) = cause.downcast_ref::<IndexError>() {
            return index_outcome(index);
        }
        if let Some(remote) = cause.downcast_ref::<RemoteError>() {
            return remote_outcome(remote);
        }
        if let Some(store) = cause.downcast_ref::<StoreError>() {
            return store_outcome(store);
        }
    }
    let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
    ExecutionOutcome::failure(
        err.to_string(),
        json!({
            "reason": "internal_error",
            "error": err.to_string(),
            "issues": issues,
            "hint": INTERNAL_HINT,
        }),
    )
}

fn sync_outcome(err: &SyncError) -> ExecutionOutcome {
    let (reason, hint) = match err {
        SyncError::Index(inner) => return index_outcome(inner),
        SyncError::Remote(inner) => return remote_outcome(inner),
        SyncError::MissingLocalFile { .. } => (
            "missing_local_file",
            "Check the local path, or relink the Drive file with `syncker link`.",
        ),
        SyncError::DestinationExists { .. } => (
            "destination_exists",
            "Pass `-o` to download somewhere else, or move the existing file away.",
        ),
        SyncError::UnsafeName { .. } => (
            "unsafe_file_name",
            "Pass `-o` to choose the local file name.",
        ),
        SyncError::Io { .. } => (
            "local_io",
            "Check that the destination directory exists and is writable.",
        ),
    };
    user_error(err, err.code(), reason, hint)
}

fn index_outcome(err: &IndexError) -> ExecutionOutcome {
    let (reason, hint) = match err {
        IndexError::Remote(inner) => return remote_outcome(inner),
        IndexError::InvalidPath { .. } => (
            "invalid_path",
            "Drive paths start with `gdrive:/`, e.g. gdrive:/Reports/Q1.pdf.",
        ),
        IndexError::NotAFolder { .. } => (
            "not_a_folder",
            "Only folders can contain other Drive paths.",
        ),
        IndexError::NotAFile { .. } => ("not_a_file", "Pass a Drive file, not a folder."),
        IndexError::NotIndexed { .. } => (
            "not_indexed",
            "Run `syncker index <drive_file>` first.",
        ),
        IndexError::PathNotFound { .. } => (
            "path_not_found",
            "Check the spelling; names on Drive are case-sensitive.",
        ),
        IndexError::RootUnindexable => (
            "root_unindexable",
            "Unindex the top-level folders instead.",
        ),
        IndexError::NotLinked { .. } => (
            "not_linked",
            "Link it with `syncker link <drive_file> <local_file>`.",
        ),
        IndexError::InvalidLocalPath { .. } => (
            "invalid_local_path",
            "Local paths must be valid UTF-8.",
        ),
    };
    user_error(err, err.code(), reason, hint)
}

fn remote_outcome(err: &RemoteError) -> ExecutionOutcome {
    match err {
        RemoteError::Authentication(_) => user_error(
            err,
            err.code(),
            "authentication",
            "Run `syncker auth` to authenticate with Google Drive.",
        ),
        RemoteError::Api { status, .. } => ExecutionOutcome::failure(
            err.to_string(),
            json!({
                "reason": "remote_api",
                "code": err.code(),
                "status": status,
                "hint": "Retry later; if it keeps failing the file may have been removed on Drive.",
            }),
        ),
        RemoteError::Transport(_) => ExecutionOutcome::failure(
            err.to_string(),
            json!({
                "reason": "remote_transport",
                "code": err.code(),
                "hint": "Check your network connection and retry.",
            }),
        ),
    }
}

fn store_outcome(err: &StoreError) -> ExecutionOutcome {
    let (reason, hint) = match err {
        StoreError::NotADirectory { .. } | StoreError::StateDir { .. } => (
            "state_dir",
            "Point SYNCKER_DIR at a writable directory.",
        ),
        StoreError::Corrupt { .. } => (
            "corrupt_index",
            "Fix the JSON by hand or move the file away to start with an empty index.",
        ),
    };
    let mut outcome = user_error(err, err.code(), reason, hint);
    outcome.details["path"] = json!(err.path().display().to_string());
    outcome
}

fn user_error(
    err: &dyn std::error::Error,
    code: &str,
    reason: &str,
    hint: &str,
) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        err.to_string(),
        json!({
            "reason": reason,
            "code": code,
            "hint": hint,
        }),
    )
}

//! Commands that only touch the local index (plus Drive lookups for `index`).

use anyhow::Result;
use serde_json::json;
use syncker_domain::{LocalPath, RemotePath, RenderMode, RenderOptions};
use tracing::{info, warn};

use crate::context::CommandContext;
use crate::outcome::ExecutionOutcome;

#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub flat: bool,
    pub hide_links: bool,
}

#[derive(Debug, Clone)]
pub struct IndexRequest {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct UnindexRequest {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct LinkRequest {
    pub drive_file: String,
    pub local_file: String,
}

#[derive(Debug, Clone)]
pub struct UnlinkRequest {
    pub file: String,
}

/// Renders the index. Lines are returned in `details.lines` for the CLI
/// to print verbatim.
pub fn list(ctx: &CommandContext, request: &ListRequest) -> Result<ExecutionOutcome> {
    let index = ctx.store()?.load()?;
    let lines = index.render(&RenderOptions {
        mode: if request.flat {
            RenderMode::Flat
        } else {
            RenderMode::Tree
        },
        hide_links: request.hide_links,
        home: ctx.home(),
    });
    let text = lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExecutionOutcome::success(
        text,
        json!({
            "passthrough": true,
            "count": lines.len(),
            "lines": lines,
        }),
    ))
}

pub fn index(ctx: &CommandContext, request: &IndexRequest) -> Result<ExecutionOutcome> {
    let path = RemotePath::parse(&request.path)?;
    let store = ctx.store()?;
    let mut index = store.load()?;
    let drive = ctx.drive()?;
    let added = index.ensure_indexed(drive.as_ref(), &path)?;
    if added.is_empty() {
        return Ok(ExecutionOutcome::success(
            format!("{path} is already indexed"),
            json!({ "path": path, "added": [] }),
        ));
    }
    store.save(&index)?;
    Ok(ExecutionOutcome::success(
        format!("indexed {path}"),
        json!({ "path": path, "added": added }),
    ))
}

pub fn unindex(ctx: &CommandContext, request: &UnindexRequest) -> Result<ExecutionOutcome> {
    let path = RemotePath::parse(&request.path)?;
    let store = ctx.store()?;
    let mut index = store.load()?;
    let unlinked = index.unindex(&path)?;
    store.save(&index)?;
    for local in &unlinked {
        info!("unlinked {local}");
    }
    Ok(ExecutionOutcome::success(
        format!("unindexed {path}"),
        json!({ "path": path, "unlinked": unlinked }),
    ))
}

pub fn link(ctx: &CommandContext, request: &LinkRequest) -> Result<ExecutionOutcome> {
    let remote = RemotePath::parse(&request.drive_file)?;
    let local = LocalPath::with_base(&request.local_file, ctx.cwd())?;
    let store = ctx.store()?;
    let mut index = store.load()?;
    let replaced = index.link(&remote, local.clone())?;
    store.save(&index)?;
    for replacement in &replaced {
        warn!("{replacement}");
    }
    Ok(ExecutionOutcome::success(
        format!("linked {remote} with {}", local.shorten(ctx.home())),
        json!({
            "remote": remote,
            "local": local,
            "replaced": replaced,
        }),
    ))
}

pub fn unlink(ctx: &CommandContext, request: &UnlinkRequest) -> Result<ExecutionOutcome> {
    let store = ctx.store()?;
    let mut index = store.load()?;
    let pair = index.unlink(&request.file, ctx.cwd())?;
    store.save(&index)?;
    Ok(ExecutionOutcome::success(
        format!(
            "unlinked {} from {}",
            pair.remote,
            pair.local.shorten(ctx.home())
        ),
        json!({
            "remote": pair.remote,
            "local": pair.local,
            "id": pair.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;
    use syncker_domain::{IndexError, RemoteError};

    use super::*;
    use crate::core::commands::testing::{with_context, Fixture};

    #[test]
    fn list_of_fresh_state_is_empty_and_creates_the_index() {
        with_context(Fixture::Reports, |ctx, state| {
            let outcome = list(ctx, &ListRequest::default()).expect("list");
            assert!(outcome.is_ok());
            assert_eq!(outcome.message, "");
            assert_eq!(outcome.details["count"], 0);
            assert!(state.join("index.json").exists());
        });
    }

    #[test]
    fn index_then_list_as_tree() {
        with_context(Fixture::Reports, |ctx, _| {
            let outcome = index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports/Q1.pdf".into(),
                },
            )
            .expect("index");
            assert_eq!(outcome.message, "indexed gdrive:/Reports/Q1.pdf");
            assert_eq!(
                outcome.details["added"],
                json!(["gdrive:/Reports", "gdrive:/Reports/Q1.pdf"])
            );

            let again = index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports/Q1.pdf".into(),
                },
            )
            .expect("index again");
            assert!(again.message.contains("already indexed"));

            let listed = list(ctx, &ListRequest::default()).expect("list");
            assert_eq!(listed.message, "Reports\n\u{2502} Q1.pdf");
        });
    }

    #[test]
    fn failed_index_leaves_the_document_untouched() {
        with_context(Fixture::Reports, |ctx, state| {
            list(ctx, &ListRequest::default()).expect("seed index file");
            let before = fs::read_to_string(state.join("index.json")).expect("read");
            let err = index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports/missing.pdf".into(),
                },
            )
            .expect_err("missing remote file");
            assert!(matches!(
                err.downcast_ref::<IndexError>(),
                Some(IndexError::PathNotFound { .. })
            ));
            let after = fs::read_to_string(state.join("index.json")).expect("read");
            assert_eq!(before, after);
        });
    }

    #[test]
    fn index_without_credentials_is_an_authentication_error() {
        with_context(Fixture::NoCredentials, |ctx, _| {
            let err = index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports".into(),
                },
            )
            .expect_err("no credentials");
            let remote = err
                .downcast_ref::<IndexError>()
                .and_then(|err| match err {
                    IndexError::Remote(remote) => Some(remote),
                    _ => None,
                })
                .expect("remote error");
            assert!(matches!(remote, RemoteError::Authentication(_)));
        });
    }

    #[test]
    fn link_unlink_round_trip() {
        with_context(Fixture::Reports, |ctx, _| {
            index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports/Q1.pdf".into(),
                },
            )
            .expect("index");
            let linked = link(
                ctx,
                &LinkRequest {
                    drive_file: "gdrive:/Reports/Q1.pdf".into(),
                    local_file: "q1.pdf".into(),
                },
            )
            .expect("link");
            let local = ctx.cwd().join("q1.pdf");
            assert_eq!(linked.details["local"], Value::String(local.display().to_string()));
            assert_eq!(linked.details["replaced"], json!([]));

            let unlinked = unlink(
                ctx,
                &UnlinkRequest {
                    file: "q1.pdf".into(),
                },
            )
            .expect("unlink");
            assert_eq!(unlinked.details["remote"], "gdrive:/Reports/Q1.pdf");

            let err = unlink(
                ctx,
                &UnlinkRequest {
                    file: "gdrive:/Reports/Q1.pdf".into(),
                },
            )
            .expect_err("already unlinked");
            assert!(matches!(
                err.downcast_ref::<IndexError>(),
                Some(IndexError::NotLinked { .. })
            ));
        });
    }

    #[test]
    fn relinking_reports_the_replacement() {
        with_context(Fixture::Reports, |ctx, _| {
            index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports/Q1.pdf".into(),
                },
            )
            .expect("index");
            for local_file in ["a.pdf", "b.pdf"] {
                link(
                    ctx,
                    &LinkRequest {
                        drive_file: "gdrive:/Reports/Q1.pdf".into(),
                        local_file: local_file.into(),
                    },
                )
                .expect("link");
            }
            let listed = list(
                ctx,
                &ListRequest {
                    flat: true,
                    hide_links: false,
                },
            )
            .expect("list");
            assert!(listed.message.starts_with("gdrive:/Reports/\ngdrive:/Reports/Q1.pdf ["));
            assert!(listed.message.ends_with("b.pdf]"));
            assert!(!listed.message.contains("a.pdf"));
        });
    }

    #[test]
    fn unindex_cascades_links() {
        with_context(Fixture::Reports, |ctx, _| {
            index(
                ctx,
                &IndexRequest {
                    path: "gdrive:/Reports/Q1.pdf".into(),
                },
            )
            .expect("index");
            link(
                ctx,
                &LinkRequest {
                    drive_file: "gdrive:/Reports/Q1.pdf".into(),
                    local_file: "q1.pdf".into(),
                },
            )
            .expect("link");
            let outcome = unindex(
                ctx,
                &UnindexRequest {
                    path: "gdrive:/Reports".into(),
                },
            )
            .expect("unindex");
            assert_eq!(outcome.details["unlinked"].as_array().map(Vec::len), Some(1));
            let listed = list(ctx, &ListRequest::default()).expect("list");
            assert_eq!(listed.details["count"], 0);

            let err = unindex(
                ctx,
                &UnindexRequest {
                    path: "gdrive:/".into(),
                },
            )
            .expect_err("root");
            assert!(matches!(
                err.downcast_ref::<IndexError>(),
                Some(IndexError::RootUnindexable)
            ));
        });
    }
}

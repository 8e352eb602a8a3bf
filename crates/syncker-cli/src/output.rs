use atty::Stream;
use color_eyre::Result;
use serde_json::Value;
use syncker_core::{diag, CommandInfo, CommandStatus, ExecutionOutcome};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

/// Prints `outcome` and returns the process exit code.
pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = outcome.status.exit_code();
    let style_out = Style::new(opts.no_color, atty::is(Stream::Stdout));
    let style_err = Style::new(opts.no_color, atty::is(Stream::Stderr));

    if opts.json {
        let payload = syncker_core::to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    match outcome.status {
        CommandStatus::Ok => {
            if opts.quiet {
                return Ok(code);
            }
            if is_passthrough(&outcome.details) {
                for line in passthrough_lines(&style_out, outcome) {
                    println!("{line}");
                }
            } else {
                let message = syncker_core::format_status_message(info, &outcome.message);
                println!("{}", style_out.status(outcome.status, &message));
                if let Some(hint) = hint_from_details(&outcome.details) {
                    println!("{}", style_out.info(&format!("Tip: {hint}")));
                }
            }
        }
        CommandStatus::UserError | CommandStatus::Failure => {
            let header = format!("{}  {}", error_code(&outcome.details), outcome.message);
            eprintln!("{}", style_err.error_header(&header));
            eprintln!();
            eprintln!("Why:");
            for reason in collect_why_bullets(&outcome.details, &outcome.message) {
                eprintln!("  • {reason}");
            }
            let fixes = collect_fix_bullets(&outcome.details);
            if !fixes.is_empty() {
                eprintln!();
                eprintln!("Fix:");
                for fix in fixes {
                    eprintln!("{}", style_err.fix_bullet(&format!("  • {fix}")));
                }
            }
        }
    }
    Ok(code)
}

fn is_passthrough(details: &Value) -> bool {
    details
        .get("passthrough")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Structured `lines` when present, so glyphs and folders can be styled;
/// the plain message otherwise.
fn passthrough_lines(style: &Style, outcome: &ExecutionOutcome) -> Vec<String> {
    let Some(lines) = outcome.details.get("lines").and_then(Value::as_array) else {
        return if outcome.message.is_empty() {
            Vec::new()
        } else {
            vec![outcome.message.clone()]
        };
    };
    lines
        .iter()
        .map(|line| {
            let prefix = line.get("prefix").and_then(Value::as_str).unwrap_or_default();
            let label = line.get("label").and_then(Value::as_str).unwrap_or_default();
            let folder = line.get("folder").and_then(Value::as_bool).unwrap_or(false);
            let label = if folder {
                style.folder(label)
            } else {
                label.to_string()
            };
            format!("{}{label}", style.guide(prefix))
        })
        .collect()
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details.get("hint").and_then(Value::as_str)
}

fn error_code(details: &Value) -> &str {
    details
        .get("code")
        .and_then(Value::as_str)
        .filter(|code| code.starts_with("SK"))
        .unwrap_or(diag::GENERIC)
}

fn collect_why_bullets(details: &Value, fallback: &str) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some(reason) = details
        .get("reason")
        .and_then(Value::as_str)
        .and_then(reason_display)
    {
        push_unique(&mut bullets, reason);
    }
    if let Some(status) = details.get("status").and_then(Value::as_u64) {
        push_unique(&mut bullets, format!("Drive answered with HTTP {status}"));
    }
    if let Some(path) = details.get("path").and_then(Value::as_str) {
        push_unique(&mut bullets, format!("Path: {path}"));
    }
    if let Some(issues) = details.get("issues").and_then(Value::as_array) {
        for issue in issues.iter().filter_map(Value::as_str) {
            push_unique(&mut bullets, issue);
        }
    }
    if bullets.is_empty() {
        bullets.push(fallback.to_string());
    }
    bullets
}

fn collect_fix_bullets(details: &Value) -> Vec<String> {
    let mut fixes = Vec::new();
    if let Some(hint) = hint_from_details(details) {
        push_unique(&mut fixes, hint);
    }
    if fixes.is_empty() {
        fixes.push("Re-run with --help for usage or inspect the output above.".to_string());
    }
    fixes
}

fn push_unique(vec: &mut Vec<String>, text: impl Into<String>) {
    let entry = text.into();
    if entry.trim().is_empty() {
        return;
    }
    if !vec.iter().any(|existing| existing == &entry) {
        vec.push(entry);
    }
}

fn reason_display(reason: &str) -> Option<&'static str> {
    match reason {
        "not_indexed" => Some("The Drive path is not in the local index."),
        "not_linked" => Some("No link exists for this file."),
        "path_not_found" => Some("Drive has no file or folder at that path."),
        "authentication" => Some("Drive credentials are missing or no longer valid."),
        "missing_client_secrets" => Some("No OAuth client is configured."),
        "remote_api" => Some("Google Drive rejected the request."),
        "remote_transport" => Some("Google Drive could not be reached."),
        "corrupt_index" => Some("The index file is not valid JSON."),
        _ => None,
    }
}

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::context::CommandContext;
use crate::diagnostics;
use crate::drive::{self, exchange_code, save_token, ClientSecrets, DRIVE_SCOPE};
use crate::outcome::ExecutionOutcome;
use crate::store::ensure_state_dir;

const MISSING_SECRETS_MESSAGE: &str =
    "OAuth client secret is not present, generate one using the Google Cloud Console";

#[derive(Debug, Clone, Default)]
pub struct AuthRequest;

/// Runs the consent flow and stores the resulting user token.
pub fn auth(ctx: &CommandContext, _request: &AuthRequest) -> Result<ExecutionOutcome> {
    let state = ctx.config().state();
    ensure_state_dir(state.dir())?;
    let secrets_path = state.client_secrets_file();
    if !secrets_path.exists() {
        return Ok(ExecutionOutcome::user_error(
            MISSING_SECRETS_MESSAGE,
            json!({
                "reason": "missing_client_secrets",
                "code": diagnostics::state::CLIENT_SECRETS,
                "path": secrets_path.display().to_string(),
                "hint": format!(
                    "download a desktop-app OAuth client and save it as {}",
                    secrets_path.display()
                ),
            }),
        ));
    }
    let secrets = match ClientSecrets::load(&secrets_path) {
        Ok(secrets) => secrets,
        Err(err) => {
            return Ok(ExecutionOutcome::user_error(
                format!("{err:#}"),
                json!({
                    "reason": "invalid_client_secrets",
                    "code": diagnostics::state::CLIENT_SECRETS,
                    "path": secrets_path.display().to_string(),
                    "hint": "download the client secrets again from the Google Cloud Console",
                }),
            ))
        }
    };

    let scopes = [DRIVE_SCOPE];
    let authorization = ctx.consent().authorize(&secrets, &scopes)?;
    let http = drive::http_client(ctx.config().drive())?;
    let token = exchange_code(&http, &secrets, &authorization, &scopes)?;
    let token_file = state.token_file();
    save_token(&token_file, &token)?;
    info!(path = %token_file.display(), "stored user credentials");
    Ok(ExecutionOutcome::success(
        "authentication succeeded",
        json!({ "token_file": token_file.display().to_string() }),
    ))
}

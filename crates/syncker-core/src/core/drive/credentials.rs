use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use syncker_domain::{CredentialProvider, RemoteError};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::store::write_atomic;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens count as expired this long before Google says they are.
const REFRESH_MARGIN: Duration = Duration::minutes(5);

const REAUTH_HINT: &str = "run `syncker auth` to reauthenticate";

/// OAuth user credentials in the authorized-user `token.json` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiry: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl StoredToken {
    /// A usable access token at `now`; tokens without an expiry never expire.
    #[must_use]
    pub fn fresh_token(&self, now: OffsetDateTime) -> Option<&str> {
        let token = self.token.as_deref()?;
        match self.expiry {
            Some(expiry) if expiry - REFRESH_MARGIN <= now => None,
            _ => Some(token),
        }
    }

    fn apply(&mut self, response: TokenResponse, now: OffsetDateTime) {
        self.token = Some(response.access_token);
        self.expiry = response
            .expires_in
            .map(|seconds| now + Duration::seconds(seconds));
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(ToOwned::to_owned).collect();
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) expires_in: Option<i64>,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Posts `form` to an OAuth token endpoint.
pub(crate) fn request_token(
    http: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, RemoteError> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .map_err(|err| RemoteError::Transport(err.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .map_err(|err| RemoteError::Transport(err.to_string()));
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<TokenErrorResponse>(&body)
        .map(|err| err.error_description.unwrap_or(err.error))
        .unwrap_or_else(|_| status.to_string());
    if status.is_client_error() {
        Err(RemoteError::Authentication(format!(
            "the token endpoint refused the request ({message}), {REAUTH_HINT}"
        )))
    } else {
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Reads `token.json`.
pub fn load_token(path: &Path) -> Result<StoredToken, RemoteError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RemoteError::Authentication(
                "User token is not present, run `syncker auth` to perform authentication".into(),
            ));
        }
        Err(err) => {
            return Err(RemoteError::Authentication(format!(
                "unable to read {}: {err}",
                path.display()
            )));
        }
    };
    serde_json::from_str(&contents).map_err(|err| {
        RemoteError::Authentication(format!(
            "{} is not a valid token file ({err}), {REAUTH_HINT}",
            path.display()
        ))
    })
}

/// Writes `token.json` atomically.
pub fn save_token(path: &Path, token: &StoredToken) -> anyhow::Result<()> {
    let mut contents = serde_json::to_vec_pretty(token)?;
    contents.push(b'\n');
    write_atomic(path, &contents)
}

/// Credentials backed by the token file in the state directory; expired
/// tokens are refreshed and written back.
pub struct TokenFileCredentials {
    path: PathBuf,
    http: Client,
    cached: RefCell<Option<StoredToken>>,
}

impl TokenFileCredentials {
    #[must_use]
    pub fn new(path: PathBuf, http: Client) -> Self {
        Self {
            path,
            http,
            cached: RefCell::new(None),
        }
    }

    fn refresh(&self, stored: &mut StoredToken, now: OffsetDateTime) -> Result<(), RemoteError> {
        let Some(refresh_token) = stored.refresh_token.clone() else {
            return Err(RemoteError::Authentication(format!(
                "User token is not valid, {REAUTH_HINT}"
            )));
        };
        info!("refreshing Drive credentials");
        let response = request_token(
            &self.http,
            &stored.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
                ("client_id", &stored.client_id),
                ("client_secret", &stored.client_secret),
            ],
        )?;
        stored.apply(response, now);
        save_token(&self.path, stored).map_err(|err| {
            RemoteError::Authentication(format!(
                "unable to store refreshed credentials in {}: {err:#}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), "stored refreshed token");
        Ok(())
    }
}

impl CredentialProvider for TokenFileCredentials {
    fn access_token(&self) -> Result<String, RemoteError> {
        let now = OffsetDateTime::now_utc();
        let mut cached = self.cached.borrow_mut();
        let mut stored = match cached.take() {
            Some(stored) => stored,
            None => load_token(&self.path)?,
        };
        if stored.fresh_token(now).is_none() {
            self.refresh(&mut stored, now)?;
        }
        let token = stored
            .fresh_token(now)
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                RemoteError::Authentication(format!("User token is not valid, {REAUTH_HINT}"))
            })?;
        *cached = Some(stored);
        Ok(token)
    }
}

/// Builds a [`StoredToken`] from a code-exchange response.
pub(crate) fn token_from_exchange(
    client_id: &str,
    client_secret: &str,
    token_uri: &str,
    scopes: &[&str],
    response: TokenResponse,
    now: OffsetDateTime,
) -> StoredToken {
    let mut stored = StoredToken {
        token: None,
        refresh_token: None,
        token_uri: token_uri.to_string(),
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        scopes: scopes.iter().map(|scope| (*scope).to_string()).collect(),
        expiry: None,
        extra: Map::new(),
    };
    stored.apply(response, now);
    stored
}

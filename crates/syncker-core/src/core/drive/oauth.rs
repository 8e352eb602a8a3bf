//! Installed-app OAuth flow: the user approves access in a browser and
//! Google redirects back to a short-lived listener on the loopback address.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::blocking::Client;
use serde::Deserialize;
use syncker_domain::RemoteError;
use time::OffsetDateTime;
use tracing::{debug, info};
use url::Url;

use super::credentials::{request_token, token_from_exchange, StoredToken, DEFAULT_TOKEN_URI};
use crate::effects::ConsentFlow;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const STATE_LEN: usize = 30;
const COMPLETED_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// The OAuth client registered in the Google Cloud Console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Reads a `client_secrets.json` downloaded from the console.
    ///
    /// # Errors
    /// Returns an error if the file is unreadable or has no client block.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file: SecretsFile = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not a client secrets file", path.display()))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow!("{} has no \"installed\" client", path.display()))
    }
}

/// What the consent screen hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
}

/// Builds the consent-screen URL.
///
/// # Errors
/// Returns an error if the client's `auth_uri` is not a URL.
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[&str],
    state: &str,
) -> Result<Url> {
    let mut url = Url::parse(&secrets.auth_uri)
        .with_context(|| format!("invalid auth_uri {}", secrets.auth_uri))?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", state)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    Ok(url)
}

/// Extracts the authorization code from a redirect request target.
///
/// Returns `Ok(None)` for requests that are not the redirect at all
/// (browsers also ask for `/favicon.ico`).
pub(crate) fn parse_redirect(target: &str, state: &str) -> Result<Option<String>, RemoteError> {
    let base = Url::parse("http://localhost/").map_err(|err| RemoteError::Transport(err.to_string()))?;
    let Ok(url) = base.join(target) else {
        return Ok(None);
    };
    let mut code = None;
    let mut returned_state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => returned_state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        return Err(RemoteError::Authentication(format!(
            "authorization was not granted: {error}"
        )));
    }
    let Some(code) = code else {
        return Ok(None);
    };
    if returned_state.as_deref() != Some(state) {
        return Err(RemoteError::Authentication(
            "authorization response carried an unexpected state; try again".into(),
        ));
    }
    Ok(Some(code))
}

/// Trades an authorization code for user credentials.
pub fn exchange_code(
    http: &Client,
    secrets: &ClientSecrets,
    authorization: &AuthorizationCode,
    scopes: &[&str],
) -> Result<StoredToken, RemoteError> {
    let response = request_token(
        http,
        &secrets.token_uri,
        &[
            ("grant_type", "authorization_code"),
            ("code", &authorization.code),
            ("redirect_uri", &authorization.redirect_uri),
            ("client_id", &secrets.client_id),
            ("client_secret", &secrets.client_secret),
        ],
    )?;
    if response.refresh_token.is_none() {
        debug!("token endpoint returned no refresh token");
    }
    Ok(token_from_exchange(
        &secrets.client_id,
        &secrets.client_secret,
        &secrets.token_uri,
        scopes,
        response,
        OffsetDateTime::now_utc(),
    ))
}

/// Prints the consent URL and waits for the browser redirect on
/// `127.0.0.1`.
pub struct LoopbackConsent;

impl ConsentFlow for LoopbackConsent {
    fn authorize(&self, secrets: &ClientSecrets, scopes: &[&str]) -> Result<AuthorizationCode> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .context("failed to open a loopback port for the OAuth redirect")?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://localhost:{port}/");
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        let url = authorization_url(secrets, &redirect_uri, scopes, &state)?;
        eprintln!("Please visit this URL to authorize this application: {url}");
        info!(port, "waiting for the OAuth redirect");

        for stream in listener.incoming() {
            let mut stream = stream.context("failed to accept the OAuth redirect")?;
            let Some(target) = read_request_target(&stream)? else {
                continue;
            };
            match parse_redirect(&target, &state) {
                Ok(Some(code)) => {
                    respond(&mut stream, "200 OK", COMPLETED_PAGE)?;
                    return Ok(AuthorizationCode { code, redirect_uri });
                }
                Ok(None) => respond(&mut stream, "404 Not Found", "")?,
                Err(err) => {
                    respond(&mut stream, "400 Bad Request", &err.to_string())?;
                    return Err(err.into());
                }
            }
        }
        Err(anyhow!("the OAuth redirect listener closed unexpectedly"))
    }
}

fn read_request_target(stream: &TcpStream) -> Result<Option<String>> {
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line)?;
    Ok(line.split_whitespace().nth(1).map(ToOwned::to_owned))
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) -> io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}

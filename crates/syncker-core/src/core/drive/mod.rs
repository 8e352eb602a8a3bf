//! Google Drive access: the REST client, stored credentials and the
//! consent flow that produces them.

mod client;
mod credentials;
mod oauth;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::DriveConfig;

pub use client::DriveClient;
pub use credentials::{load_token, save_token, StoredToken, TokenFileCredentials};
pub use oauth::{
    authorization_url, exchange_code, AuthorizationCode, ClientSecrets, LoopbackConsent,
    DRIVE_SCOPE,
};

const USER_AGENT: &str = concat!("syncker/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for Drive and OAuth endpoints.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(config: &DriveConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()
        .context("failed to build http client")
}

use std::sync::Arc;

use anyhow::Result;
use syncker_domain::RemoteDrive;

use crate::config::Config;
use crate::drive::{self, AuthorizationCode, ClientSecrets, DriveClient, TokenFileCredentials};

/// Opens a Drive session for a command.
pub trait DriveConnector: Send + Sync {
    fn connect(&self, config: &Config) -> Result<Box<dyn RemoteDrive>>;
}

/// Obtains an OAuth authorization code from the user.
pub trait ConsentFlow: Send + Sync {
    fn authorize(&self, secrets: &ClientSecrets, scopes: &[&str]) -> Result<AuthorizationCode>;
}

pub trait Effects: Send + Sync {
    fn drive(&self) -> &dyn DriveConnector;
    fn consent(&self) -> &dyn ConsentFlow;
}

pub type SharedEffects = Arc<dyn Effects>;

pub struct SystemEffects {
    drive: Arc<SystemDrive>,
    consent: Arc<drive::LoopbackConsent>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            drive: Arc::new(SystemDrive),
            consent: Arc::new(drive::LoopbackConsent),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn drive(&self) -> &dyn DriveConnector {
        self.drive.as_ref()
    }

    fn consent(&self) -> &dyn ConsentFlow {
        self.consent.as_ref()
    }
}

struct SystemDrive;

impl DriveConnector for SystemDrive {
    fn connect(&self, config: &Config) -> Result<Box<dyn RemoteDrive>> {
        let http = drive::http_client(config.drive())?;
        let credentials = TokenFileCredentials::new(config.state().token_file(), http.clone());
        Ok(Box::new(DriveClient::new(
            http,
            config.drive(),
            Box::new(credentials),
        )))
    }
}

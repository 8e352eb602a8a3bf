/// Stable diagnostic codes attached to every user-facing error.
pub mod codes {
    pub const INVALID_PATH: &str = "SK101";
    pub const NOT_A_FOLDER: &str = "SK102";
    pub const NOT_A_FILE: &str = "SK103";
    pub const NOT_INDEXED: &str = "SK104";
    pub const PATH_NOT_FOUND: &str = "SK105";
    pub const ROOT_UNINDEXABLE: &str = "SK106";
    pub const NOT_LINKED: &str = "SK201";
    pub const INVALID_LOCAL_PATH: &str = "SK202";
    pub const AUTHENTICATION: &str = "SK401";
    pub const REMOTE_API: &str = "SK402";
    pub const REMOTE_TRANSPORT: &str = "SK403";
}

/// Errors raised while resolving or mutating the local Drive index.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("\"{path}\" is not a Drive path")]
    InvalidPath { path: String },
    #[error("\"{name}\" is not a folder")]
    NotAFolder { name: String },
    #[error("\"{path}\" is a folder, not a file")]
    NotAFile { path: String },
    #[error("\"{path}\" (folder/file: {segment}) is not indexed")]
    NotIndexed { path: String, segment: String },
    #[error("{path} does not exist")]
    PathNotFound { path: String },
    #[error("cannot unindex the Drive root folder")]
    RootUnindexable,
    #[error("{path} is not linked with any {counterpart} files")]
    NotLinked {
        path: String,
        counterpart: &'static str,
    },
    #[error("\"{path}\" is not a usable local path: {reason}")]
    InvalidLocalPath { path: String, reason: String },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl IndexError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } => codes::INVALID_PATH,
            Self::NotAFolder { .. } => codes::NOT_A_FOLDER,
            Self::NotAFile { .. } => codes::NOT_A_FILE,
            Self::NotIndexed { .. } => codes::NOT_INDEXED,
            Self::PathNotFound { .. } => codes::PATH_NOT_FOUND,
            Self::RootUnindexable => codes::ROOT_UNINDEXABLE,
            Self::NotLinked { .. } => codes::NOT_LINKED,
            Self::InvalidLocalPath { .. } => codes::INVALID_LOCAL_PATH,
            Self::Remote(err) => err.code(),
        }
    }
}

/// Failures surfaced by the remote store or the credential provider.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{0}")]
    Authentication(String),
    #[error("Drive API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Drive request failed: {0}")]
    Transport(String),
}

impl RemoteError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => codes::AUTHENTICATION,
            Self::Api { .. } => codes::REMOTE_API,
            Self::Transport(_) => codes::REMOTE_TRANSPORT,
        }
    }

    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

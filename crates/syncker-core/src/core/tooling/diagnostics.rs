//! Diagnostic codes owned by the core crate. Index, link and remote codes
//! live next to their error types in `syncker_domain::codes`.

pub mod local {
    pub const MISSING_LOCAL_FILE: &str = "SK301";
    pub const DESTINATION_EXISTS: &str = "SK302";
    pub const LOCAL_IO: &str = "SK303";
    pub const UNSAFE_NAME: &str = "SK304";
}

pub mod state {
    pub const STATE_DIR: &str = "SK501";
    pub const CORRUPT_INDEX: &str = "SK502";
    pub const CLIENT_SECRETS: &str = "SK503";
}

pub const GENERIC: &str = "SK000";

pub mod context;
pub mod settings;

pub(crate) use settings::EnvSnapshot;
pub use settings::{
    Config, DriveConfig, GlobalOptions, StateConfig, DEFAULT_DRIVE_API, DEFAULT_UPLOAD_API,
};

pub mod config;
pub mod config_loader;
pub mod error;
pub mod manifest;
pub mod traits;

pub use config::*;
pub use config_loader::{ConfigLoader, ConfigValidationResult, CONFIG_FILENAME};
pub use error::*;
pub use manifest::{detect_package, PackageInfo, MANIFEST_FILES};
pub use traits::*;

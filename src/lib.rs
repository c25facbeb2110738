pub mod cli;
mod logging;
pub mod validation;

pub use logging::{file_log::FileLog, multilog::MultiLogger};

/// Image Customizer version as provided by environment variables at build time
pub const IMAGE_CUSTOMIZER_VERSION: &str = match option_env!("IMAGE_CUSTOMIZER_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

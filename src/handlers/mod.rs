pub mod config;
pub mod cv;
pub mod interview;
pub mod personas;

pub use config::*;
pub use cv::*;
pub use interview::*;
pub use personas::*;

use crate::error::AppError;
use actix_web::web;

/// JSON body extractor that reports malformed bodies in the standard error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

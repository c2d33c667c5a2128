// Export our modules for use by the browser crate and tests
pub mod app;
pub mod availability;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod push;
pub mod worker;

#[cfg(test)]
mod testing;

pub use app::{App, Services};
pub use config::AppConfig;
pub use domain::{Category, Platform};
pub use error::{AppError, Result};

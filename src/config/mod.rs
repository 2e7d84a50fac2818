//! Installation configuration.

pub mod settings;

pub use settings::{AppConfig, APP_KEY_ENV};

pub(crate) mod atomic;
pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod gate;
pub mod generator;
pub mod identity;
pub mod logging;
pub mod vault;

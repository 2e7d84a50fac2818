//! One module per subcommand; each exposes `execute`.

pub mod add;
pub mod completions;
pub mod delete;
pub mod export;
pub mod generate;
pub mod get;
pub mod import;
pub mod init;
pub mod list;
pub mod reset_password;
pub mod signup;

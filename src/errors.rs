use thiserror::Error;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Caller errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Crypto errors ---
    #[error("Authentication failed: wrong secret or corrupted data")]
    AuthenticationFailed,

    #[error("Malformed sealed blob: {0}")]
    MalformedBlob(String),

    #[error("Master secret record cannot be opened: wrong application key or corrupted record")]
    GateCorrupted,

    // --- Vault errors ---
    #[error("{0} not found")]
    NotFound(String),

    #[error("An entry for '{service}' with username '{username}' already exists")]
    DuplicateEntry { service: String, username: String },

    // --- Collaborator errors ---
    #[error("Storage unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Coarse classification of a [`VaultError`], exposed to the calling shell
/// alongside the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    AuthenticationFailed,
    MalformedBlob,
    GateCorrupted,
    NotFound,
    DuplicateEntry,
    UpstreamUnavailable,
    PersistenceError,
    Config,
    Io,
    Command,
}

impl VaultError {
    /// The tag half of the "kind + message" result surface.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::MalformedBlob(_) => ErrorKind::MalformedBlob,
            Self::GateCorrupted => ErrorKind::GateCorrupted,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateEntry { .. } => ErrorKind::DuplicateEntry,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::PersistenceError(_) => ErrorKind::PersistenceError,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::CommandFailed(_) | Self::UserCancelled => ErrorKind::Command,
        }
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            VaultError::AuthenticationFailed.kind(),
            ErrorKind::AuthenticationFailed
        );
        assert_eq!(
            VaultError::DuplicateEntry {
                service: "github".into(),
                username: "alice".into(),
            }
            .kind(),
            ErrorKind::DuplicateEntry
        );
        assert_eq!(VaultError::UserCancelled.kind(), ErrorKind::Command);
    }

    #[test]
    fn authentication_message_does_not_name_the_cause() {
        let msg = VaultError::AuthenticationFailed.to_string();
        assert!(msg.contains("wrong secret or corrupted data"));
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One move/rename operation: move `path` into directory `dest`, giving it
/// the name `newname`. Matches the provider's file-manager wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub path: String,
    pub dest: String,
    pub newname: String,
}

impl MoveRequest {
    /// Absolute path the moved object ends up at.
    pub fn final_path(&self) -> String {
        let dest = self.dest.trim_end_matches('/');
        format!("{}/{}", dest, self.newname)
    }
}

/// Error surfaced by the remote-storage provider. The executor only cares
/// about two specific conditions (already-exists on create, not-found on
/// rollback moves); everything else is carried through for the log.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("remote call failed (errno {code}): {message}")]
    Api { code: i64, message: String },

    /// The whole call failed to complete (network, auth); individual items
    /// may still be retryable one at a time.
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, RemoteError::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// Minimal view of one entry returned by `list_directory`.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub fsid: i64,
    pub path: String,
    pub size: i64,
    pub is_dir: bool,
    pub content_hash: String,
    pub server_mtime: i64,
}

/// The remote-storage surface the engines drive. Implementations live
/// outside the core: an HTTP client in the CLI, a scripted mock in tests.
pub trait RemoteFs {
    fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError>;
    fn create_directory(&self, path: &str) -> Result<(), RemoteError>;
    fn move_or_rename(&self, requests: &[MoveRequest]) -> Result<(), RemoteError>;
    fn delete_batch(&self, paths: &[String]) -> Result<(), RemoteError>;
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Remote error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    #[error("Invalid taxonomy: {0}")]
    Taxonomy(String),

    #[error("{0}")]
    Other(String),
}

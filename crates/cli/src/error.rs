#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trip not found: {0}")]
    TripNotFound(String),

    #[error("trip id prefix `{0}` matches more than one trip")]
    AmbiguousTripId(String),

    #[error("database schema v{db} is newer than this build supports (v{code})")]
    SchemaTooNew { db: u32, code: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

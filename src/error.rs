use thiserror::Error;

#[derive(Debug, Error)]
pub enum LapwatchError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Storage error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },
}

pub type Result<T> = std::result::Result<T, LapwatchError>;

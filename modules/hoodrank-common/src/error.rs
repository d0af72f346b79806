use thiserror::Error;

pub type Result<T> = std::result::Result<T, HoodrankError>;

#[derive(Error, Debug)]
pub enum HoodrankError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Expected a JSON array of objects, got: {0}")]
    Shape(String),
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Git discover error: {0}")]
    Git(#[from] Box<gix::discover::Error>),
    #[error("Command error: {0}")]
    Command(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

// Manual From implementation for unboxed to boxed conversion
impl From<gix::discover::Error> for StatsError {
    fn from(err: gix::discover::Error) -> Self {
        StatsError::Git(Box::new(err))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Msg(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error("io error, {0}")]
    Io(#[from] std::io::Error),
    #[error("json error, {0}")]
    Json(#[from] serde_json::Error),
    #[error("http error, {0}")]
    Http(#[from] reqwest::Error),
    /// Push payload could not be interpreted
    #[error("invalid payload, {0}")]
    InvalidPayload(String),
}

impl From<&str> for Error {
    #[inline]
    fn from(e: &str) -> Self {
        Error::Msg(e.to_string())
    }
}

impl From<String> for Error {
    #[inline]
    fn from(e: String) -> Self {
        Error::Msg(e)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

use tickface_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no form item with message key {key}")]
    UnknownMessageKey { key: String },
    #[error("no form item with id {id}")]
    UnknownId { id: String },
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

tickface_common::impl_context!();

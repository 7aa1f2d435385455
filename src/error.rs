use std::{io, sync::mpsc::SendError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::TallyEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum TallyError {
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Document schema error: {0}")]
    Schema(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Service error: {0}")]
    Service(String),
}

impl From<io::Error> for TallyError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => TallyError::NotFound(format!("{x}")),
            _ => TallyError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<toml::de::Error> for TallyError {
    fn from(src: toml::de::Error) -> TallyError {
        TallyError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for TallyError {
    fn from(src: toml::ser::Error) -> TallyError {
        TallyError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<SendError<TallyEvent>> for TallyError {
    fn from(x: SendError<TallyEvent>) -> Self {
        TallyError::Service(format!(
            "Channel send error, could not transmit state update event {:?}",
            x.0
        ))
    }
}

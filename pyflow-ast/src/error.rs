//! Tree codec error types

use crate::span::FileId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Failed to decode module tree for {file_id}: {message}")]
    Decode { file_id: FileId, message: String },

    #[error("Failed to encode module tree: {message}")]
    Encode { message: String },

    #[error("Malformed tree: {message}")]
    Malformed { message: String },
}

impl ParseError {
    pub fn decode(file_id: FileId, message: impl Into<String>) -> Self {
        Self::Decode {
            file_id,
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// File the error belongs to, when known
    pub fn file_id(&self) -> Option<FileId> {
        match self {
            ParseError::Decode { file_id, .. } => Some(*file_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ParseError::decode(FileId::new(2), "expected value");
        assert_eq!(
            err.to_string(),
            "Failed to decode module tree for file:2: expected value"
        );
        assert_eq!(err.file_id(), Some(FileId::new(2)));
        assert_eq!(ParseError::encode("boom").file_id(), None);
    }
}

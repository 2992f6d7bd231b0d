use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Prompt is empty")]
    EmptyInput,
    #[error("A generation is already in progress")]
    GenerationInFlight,
    #[error("Unknown version: {0}")]
    UnknownVersion(String),
    #[error("Attachment is {size} bytes, the limit is {limit}")]
    AttachmentTooLarge { size: u64, limit: u64 },
    #[error("Failed to read attachment: {0}")]
    Attachment(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The backend answered, but reported a failure in its payload.
    #[error("{0}")]
    Backend(String),
    #[error("Generation service responded with status {0}")]
    Status(u16),
    #[error("Could not reach the generation service: {0}")]
    Transport(String),
}

impl GenerationError {
    pub fn cause(&self) -> String {
        return self.to_string();
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewSyncError {
    #[error("Preview renderer responded with status {0}")]
    Status(u16),
    #[error("Could not reach the preview renderer: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for PreviewSyncError {
    fn from(err: reqwest::Error) -> Self {
        PreviewSyncError::Transport(err.to_string())
    }
}

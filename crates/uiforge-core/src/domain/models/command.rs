use std::path::PathBuf;

/// User commands accepted by the session controller loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SubmitPrompt(String),
    SelectVersion(String),
    EditCode(String),
    ResetSession,
    SetAdminMode(bool),
    SetFullscreen(bool),
    AttachImage(PathBuf),
    /// Probes the backend the next prompt would use.
    CheckBackend,
}

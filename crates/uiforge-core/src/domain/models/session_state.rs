use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::Author;
use super::Message;
use super::Version;

pub const GREETING_TEXT: &str = "Hi! Describe the interface you want and I'll generate the code for it. You can edit the result, jump between versions, or ask for changes.";

pub const EMPTY_PROMPT_TEXT: &str =
    "Please describe the interface you want before sending, an empty request can't be generated.";

pub const WORKING_TEXT: &str = "Generating your interface, this can take a little while...";

/// Snapshot of a generation session. Owned and mutated only by the
/// session controller; everyone else sees published clones.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct SessionState {
    pub messages: Vec<Message>,
    /// Shared with the version store, cloning a snapshot doesn't copy it.
    pub versions: Arc<Vec<Version>>,
    pub selected_version_id: Option<String>,
    pub active_code: String,
    pub is_generating: bool,
    pub is_admin_mode: bool,
    pub is_fullscreen: bool,
}

impl SessionState {
    pub fn initial(is_admin_mode: bool) -> SessionState {
        return SessionState {
            messages: vec![Message::new(Author::Ai, GREETING_TEXT)],
            versions: Arc::default(),
            selected_version_id: None,
            active_code: String::new(),
            is_generating: false,
            is_admin_mode,
            is_fullscreen: false,
        };
    }

    pub fn selected_version(&self) -> Option<&Version> {
        let id = self.selected_version_id.as_ref()?;
        return self.versions.iter().find(|version| &version.id == id);
    }

    pub fn last_message(&self) -> Option<&Message> {
        return self.messages.last();
    }

    /// True when the active code diverges from the selected version.
    pub fn has_unsaved_edit(&self) -> bool {
        match self.selected_version() {
            Some(version) => version.code != self.active_code,
            None => !self.active_code.is_empty(),
        }
    }
}

impl Default for SessionState {
    fn default() -> SessionState {
        return SessionState::initial(false);
    }
}

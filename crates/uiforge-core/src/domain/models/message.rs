#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::Author;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default, Debug)]
pub enum MessageKind {
    #[default]
    Normal,
    /// Posted when a generation starts.
    Working,
    Success,
    Error,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Message {
    pub id: String,
    pub author: Author,
    pub text: String,
    pub kind: MessageKind,
    /// Base64 encoded image attachment.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message::new_with_kind(author, MessageKind::Normal, text);
    }

    pub fn new_with_kind(author: Author, kind: MessageKind, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            author,
            text: text.to_string(),
            kind,
            image: None,
            created_at: Utc::now(),
        };
    }

    pub fn with_image(mut self, encoded: String) -> Message {
        self.image = Some(encoded);
        return self;
    }

    pub fn kind(&self) -> MessageKind {
        return self.kind.clone();
    }

    pub fn has_image(&self) -> bool {
        return self.image.is_some();
    }
}

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Immutable code snapshot produced by a successful generation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Version {
    pub id: String,
    /// Starts at 1 and grows by exactly one per snapshot within a session.
    pub sequence_index: u64,
    pub code: String,
}

impl Version {
    pub fn new(sequence_index: u64, code: &str) -> Version {
        return Version {
            id: Uuid::new_v4().to_string(),
            sequence_index,
            code: code.to_string(),
        };
    }

    pub fn label(&self) -> String {
        return format!("v{}", self.sequence_index);
    }
}

use std::sync::Arc;

use crate::domain::models::Version;

/// Append-only history of code snapshots for one session, with a movable
/// selection pointer. The history is shared with published snapshots and only
/// copied when appending while a snapshot still holds it.
#[derive(Debug, Default, Clone)]
pub struct VersionStore {
    versions: Arc<Vec<Version>>,
    selected: Option<String>,
}

impl VersionStore {
    pub fn new() -> VersionStore {
        return VersionStore::default();
    }

    pub fn append(&mut self, code: &str) -> Version {
        let version = Version::new(self.next_index(), code);
        Arc::make_mut(&mut self.versions).push(version.clone());
        return version;
    }

    pub fn get(&self, id: &str) -> Option<&Version> {
        return self.versions.iter().find(|version| version.id == id);
    }

    pub fn all(&self) -> &[Version] {
        return self.versions.as_slice();
    }

    pub fn shared(&self) -> Arc<Vec<Version>> {
        return self.versions.clone();
    }

    /// Moves the selection. Unknown ids leave the pointer where it was.
    pub fn select(&mut self, id: &str) -> Option<&Version> {
        let idx = self.versions.iter().position(|version| version.id == id)?;
        self.selected = Some(id.to_string());
        return self.versions.get(idx);
    }

    pub fn selected(&self) -> Option<&Version> {
        let id = self.selected.as_deref()?;
        return self.get(id);
    }

    pub fn selected_id(&self) -> Option<String> {
        return self.selected.clone();
    }

    pub fn latest(&self) -> Option<&Version> {
        return self.versions.last();
    }

    pub fn len(&self) -> usize {
        return self.versions.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.versions.is_empty();
    }

    /// Drops the whole history. Only a session reset may call this.
    pub(crate) fn clear(&mut self) {
        self.versions = Arc::default();
        self.selected = None;
    }

    fn next_index(&self) -> u64 {
        return self.versions.len() as u64 + 1;
    }
}

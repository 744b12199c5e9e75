use super::LikedSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-side liked sets keyed by username.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikeStore {
    #[serde(default)]
    pub users: BTreeMap<String, LikedSet>,
}

impl LikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn liked(&self, username: &str) -> LikedSet {
        self.users.get(username).cloned().unwrap_or_default()
    }

    /// Store a user's set, dropping the entry entirely when it becomes empty.
    pub fn set_liked(&mut self, username: &str, liked: LikedSet) {
        if liked.is_empty() {
            self.users.remove(username);
        } else {
            self.users.insert(username.to_string(), liked);
        }
    }
}

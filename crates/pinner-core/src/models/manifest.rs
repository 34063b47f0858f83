use serde::{Deserialize, Serialize};

/// Derived JSON document listing every thumbnail identifier of one release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub thumbnails: Vec<String>,
}

impl Manifest {
    /// Pre-existing identifiers first, newly pinned ones appended, order preserved.
    pub fn compose(existing: &[String], new: &[String]) -> Self {
        Self {
            thumbnails: existing.iter().chain(new.iter()).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty()
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

//! Small value types shared by several entity kinds.

use serde::{Deserialize, Serialize};

/// Reference to an image asset on the game's asset server.
///
/// `file` is the server-side path without extension, e.g.
/// `/items/equipment/phaser_type2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Icon {
    /// Asset path as delivered by the server.
    #[serde(default)]
    pub file: String,
}

impl Icon {
    /// Build an icon from an asset path.
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }

    /// Whether the server sent an empty path.
    pub const fn is_empty(&self) -> bool {
        self.file.is_empty()
    }
}

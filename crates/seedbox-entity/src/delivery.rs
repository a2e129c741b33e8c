//! How a delivered byte stream is meant to be consumed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether bytes are served for inline playback or as a saved file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Inline delivery (media players, previews).
    Stream,
    /// Forced download with a `Content-Disposition: attachment` header.
    Attachment,
}

impl Disposition {
    /// Returns true when the response should carry an attachment header.
    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::Attachment)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => write!(f, "stream"),
            Self::Attachment => write!(f, "attachment"),
        }
    }
}

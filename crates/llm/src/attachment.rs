//! Attachments
//!
//! Attachment references carried on a user turn. Content is never
//! transmitted; each kind produces a one-line description that the session
//! includes in the composed request content.

use serde::{Deserialize, Serialize};

/// A reference to content attached to a user turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Attachment {
    /// An image on disk, described by path.
    Image { path: String },
    /// A regular file on disk, described by path.
    File { path: String },
    /// A link to external content.
    Link { url: String },
}

impl Attachment {
    /// Human-readable placeholder text for the composed request content.
    pub fn describe(&self) -> String {
        match self {
            Attachment::Image { path } => format!("[attached image: {path}]"),
            Attachment::File { path } => format!("[attached file: {path}]"),
            Attachment::Link { url } => format!("[linked content: {url}]"),
        }
    }
}

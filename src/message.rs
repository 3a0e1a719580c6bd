//! Transcript entries
//!
//! A message is created once and never edited; the transcript only ever
//! appends new ones.

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Server,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::User => "You",
            Origin::Server => "Server",
        }
    }
}

/// A single chat entry. The text is plain text, never markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    origin: Origin,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
        }
    }

    pub fn server(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Server,
            text: text.into(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

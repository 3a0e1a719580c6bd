use std::sync::{Arc, Mutex, MutexGuard};

use crate::message::Message;

/// Append-only store for chat entries, owned by the UI shell.
pub trait TranscriptStore: Send + Sync {
    fn append(&self, message: Message);

    /// Copy of all entries in append order
    fn entries(&self) -> Vec<Message>;

    fn len(&self) -> usize;
}

/// In-memory transcript. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Arc<Mutex<Vec<Message>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        // Appends cannot leave the vector half-written, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TranscriptStore for Transcript {
    fn append(&self, message: Message) {
        self.lock().push(message);
    }

    fn entries(&self) -> Vec<Message> {
        self.lock().clone()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

//! Message catalog — uniform random selection from pre-authored strings.

use rand::seq::SliceRandom;

use rooster_core::error::{Result, RoosterError};

/// A fixed, non-empty catalog of broadcast messages.
pub struct MessageCatalog {
    messages: Vec<String>,
}

impl MessageCatalog {
    /// Build a catalog. An empty catalog (or one containing empty strings)
    /// is a configuration error — `next_message` must never return empty
    /// text.
    pub fn new(messages: Vec<String>) -> Result<Self> {
        if messages.is_empty() {
            return Err(RoosterError::Config("message catalog is empty".into()));
        }
        if messages.iter().any(|m| m.trim().is_empty()) {
            return Err(RoosterError::Config(
                "message catalog contains an empty string".into(),
            ));
        }
        Ok(Self { messages })
    }

    /// Pick one message uniformly at random.
    pub fn next_message(&self) -> &str {
        self.messages
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(&self.messages[0])
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

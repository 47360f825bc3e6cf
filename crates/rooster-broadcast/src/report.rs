//! Per-pass delivery accounting.

use rooster_core::types::ChatId;

/// Aggregated outcome of one broadcast pass. Held transiently for logging
/// and the admin acknowledgment; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients in the snapshot.
    pub attempted: usize,
    /// Successful sends.
    pub delivered: usize,
    /// Failed recipients with the reason each one failed.
    pub failed: Vec<(ChatId, String)>,
}

impl BroadcastReport {
    /// A report for a pass that had nobody to send to.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn record_delivered(&mut self) {
        self.delivered += 1;
    }

    pub fn record_failed(&mut self, chat_id: ChatId, reason: String) {
        self.failed.push((chat_id, reason));
    }

    /// One-line summary for logs and the manual-trigger reply.
    pub fn summary(&self) -> String {
        format!(
            "attempted {}, delivered {}, failed {}",
            self.attempted,
            self.delivered,
            self.failed.len()
        )
    }
}

impl std::fmt::Display for BroadcastReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

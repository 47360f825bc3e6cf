//! Membership reconciliation — drops subscribers the transport layer
//! reports as gone (blocked the bot, left the chat). This is the only
//! directory mutation driven by transport signals rather than commands.

use std::sync::Arc;

use rooster_core::error::Result;
use rooster_core::types::{MembershipEvent, MembershipStatus};
use rooster_directory::Directory;

pub struct Reconciler {
    directory: Arc<Directory>,
}

impl Reconciler {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }

    /// React to one membership-change notification. Removal composes with
    /// the directory's own idempotency: a repeat notification for an
    /// already-removed recipient is a no-op.
    pub fn handle(&self, event: MembershipEvent) -> Result<()> {
        match event.status {
            MembershipStatus::Gone => {
                tracing::info!("recipient {} is gone, unsubscribing", event.chat_id);
                self.directory.remove(event.chat_id)
            }
            MembershipStatus::Active => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rooster_core::types::{ChatId, Subscriber};

    fn gone(id: i64) -> MembershipEvent {
        MembershipEvent {
            chat_id: ChatId(id),
            status: MembershipStatus::Gone,
        }
    }

    #[test]
    fn test_gone_removes_subscriber() {
        let directory = Arc::new(Directory::open_in_memory().unwrap());
        directory.add(&Subscriber::new(1)).unwrap();
        directory.add(&Subscriber::new(2)).unwrap();

        Reconciler::new(directory.clone()).handle(gone(1)).unwrap();
        assert!(!directory.contains(ChatId(1)).unwrap());
        assert!(directory.contains(ChatId(2)).unwrap());
    }

    #[test]
    fn test_repeat_notification_is_noop() {
        let directory = Arc::new(Directory::open_in_memory().unwrap());
        directory.add(&Subscriber::new(1)).unwrap();
        let reconciler = Reconciler::new(directory.clone());

        reconciler.handle(gone(1)).unwrap();
        reconciler.handle(gone(1)).unwrap();
        assert_eq!(directory.len().unwrap(), 0);
    }

    #[test]
    fn test_active_is_ignored() {
        let directory = Arc::new(Directory::open_in_memory().unwrap());
        directory.add(&Subscriber::new(1)).unwrap();

        Reconciler::new(directory.clone())
            .handle(MembershipEvent {
                chat_id: ChatId(1),
                status: MembershipStatus::Active,
            })
            .unwrap();
        assert!(directory.contains(ChatId(1)).unwrap());
    }
}

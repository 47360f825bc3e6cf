//! Collaborator traits — the seams between the broadcast core and the
//! outside world. The Telegram client implements `Transport`; the image
//! search client implements `ImageSearch`; tests swap in hand-rolled mocks.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ChatId;

/// Chat transport: deliver text or a captioned photo to one recipient.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain text to a recipient.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Send a photo by URL with a caption.
    async fn send_photo(&self, chat_id: ChatId, image_url: &str, caption: &str) -> Result<()>;
}

/// External image search. Errors and empty results are treated identically
/// by callers (no image); implementations should not retry.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Look up image URLs matching a topic.
    async fn search(&self, topic: &str) -> Result<Vec<String>>;
}

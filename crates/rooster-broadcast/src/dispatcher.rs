//! The broadcast dispatcher — one pass over the current subscriber
//! snapshot, bounded concurrent fan-out, failures recorded per recipient.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use rooster_content::{next_image, MessageCatalog};
use rooster_core::traits::{ImageSearch, Transport};
use rooster_core::types::ChatId;
use rooster_directory::Directory;

use crate::report::BroadcastReport;

/// Runs broadcast passes. Holds no mutable state of its own, so scheduled
/// and manually triggered passes may overlap freely — each works on its own
/// directory snapshot.
pub struct Dispatcher {
    directory: Arc<Directory>,
    catalog: Arc<MessageCatalog>,
    transport: Arc<dyn Transport>,
    images: Option<Arc<dyn ImageSearch>>,
    default_topic: String,
    max_in_flight: usize,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<Directory>,
        catalog: Arc<MessageCatalog>,
        transport: Arc<dyn Transport>,
        images: Option<Arc<dyn ImageSearch>>,
        default_topic: impl Into<String>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            directory,
            catalog,
            transport,
            images,
            default_topic: default_topic.into(),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Execute one broadcast pass.
    ///
    /// Image policy: one image is fetched per pass and shared by every
    /// recipient (one search call per broadcast, less variety). A storage
    /// failure on the snapshot aborts this pass only — it is logged and an
    /// empty report is returned. Per-recipient send failures are isolated
    /// and collected; this function never fails.
    pub async fn run_broadcast(&self, topic_hint: Option<&str>) -> BroadcastReport {
        let recipients = match self.directory.list_all() {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!("broadcast skipped, directory snapshot failed: {e}");
                return BroadcastReport::empty();
            }
        };

        if recipients.is_empty() {
            tracing::info!("broadcast pass: no subscribers");
            return BroadcastReport::empty();
        }

        let text = self.catalog.next_message().to_string();
        let topic = topic_hint.unwrap_or(&self.default_topic);
        let image_url = match &self.images {
            Some(images) => next_image(images.as_ref(), topic).await,
            None => None,
        };

        let mut report = BroadcastReport {
            attempted: recipients.len(),
            ..Default::default()
        };

        let outcomes: Vec<(ChatId, Result<(), String>)> = stream::iter(recipients)
            .map(|recipient| {
                let transport = Arc::clone(&self.transport);
                let text = text.clone();
                let image_url = image_url.clone();
                async move {
                    let chat_id = recipient.chat_id;
                    let result = match &image_url {
                        Some(url) => transport.send_photo(chat_id, url, &text).await,
                        None => transport.send_text(chat_id, &text).await,
                    };
                    (chat_id, result.map_err(|e| e.to_string()))
                }
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        for (chat_id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.record_delivered(),
                Err(reason) => {
                    tracing::warn!("send to {chat_id} failed: {reason}");
                    report.record_failed(chat_id, reason);
                }
            }
        }

        tracing::info!("broadcast pass done: {}", report.summary());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rooster_core::error::{Result, RoosterError};
    use rooster_core::types::Subscriber;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that records sends and fails for a configured set of chats.
    struct MockTransport {
        fail_for: HashSet<i64>,
        sent: Mutex<Vec<(i64, String, bool)>>,
    }

    impl MockTransport {
        fn new(fail_for: impl IntoIterator<Item = i64>) -> Self {
            Self {
                fail_for: fail_for.into_iter().collect(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(i64, String, bool)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
            if self.fail_for.contains(&chat_id.0) {
                return Err(RoosterError::Transport("bot was blocked".into()));
            }
            self.sent.lock().unwrap().push((chat_id.0, text.into(), false));
            Ok(())
        }

        async fn send_photo(&self, chat_id: ChatId, _url: &str, caption: &str) -> Result<()> {
            if self.fail_for.contains(&chat_id.0) {
                return Err(RoosterError::Transport("bot was blocked".into()));
            }
            self.sent.lock().unwrap().push((chat_id.0, caption.into(), true));
            Ok(())
        }
    }

    struct CountingSearch {
        calls: AtomicUsize,
        result: Result<Vec<String>>,
    }

    impl CountingSearch {
        fn ok(urls: Vec<String>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(urls),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(RoosterError::Enrichment("search api down".into())),
            }
        }
    }

    #[async_trait]
    impl ImageSearch for CountingSearch {
        async fn search(&self, _topic: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(urls) => Ok(urls.clone()),
                Err(e) => Err(RoosterError::Enrichment(e.to_string())),
            }
        }
    }

    fn dispatcher_with(
        subscribers: &[i64],
        transport: Arc<MockTransport>,
        images: Option<Arc<dyn ImageSearch>>,
    ) -> Dispatcher {
        let directory = Arc::new(Directory::open_in_memory().unwrap());
        for id in subscribers {
            directory.add(&Subscriber::new(*id)).unwrap();
        }
        let catalog = Arc::new(MessageCatalog::new(vec!["good morning".into()]).unwrap());
        Dispatcher::new(directory, catalog, transport, images, "morning", 4)
    }

    #[tokio::test]
    async fn test_failing_recipient_does_not_abort_batch() {
        let transport = Arc::new(MockTransport::new([2]));
        let dispatcher = dispatcher_with(&[1, 2, 3], transport.clone(), None);

        let report = dispatcher.run_broadcast(None).await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ChatId(2));
        assert!(report.failed[0].1.contains("blocked"));

        let mut delivered: Vec<i64> = transport.sent().iter().map(|(id, _, _)| *id).collect();
        delivered.sort();
        assert_eq!(delivered, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_empty_directory_contacts_nothing() {
        let transport = Arc::new(MockTransport::new([]));
        let search = Arc::new(CountingSearch::ok(vec!["https://img/a.jpg".into()]));
        let dispatcher = dispatcher_with(&[], transport.clone(), Some(search.clone()));

        let report = dispatcher.run_broadcast(None).await;
        assert_eq!(report, BroadcastReport::empty());
        assert!(transport.sent().is_empty());
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_search_failure_degrades_to_text() {
        let transport = Arc::new(MockTransport::new([]));
        let search = Arc::new(CountingSearch::failing());
        let dispatcher = dispatcher_with(&[1, 2], transport.clone(), Some(search.clone()));

        let report = dispatcher.run_broadcast(None).await;
        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());
        // Every send went out as plain text.
        assert!(transport.sent().iter().all(|(_, _, is_photo)| !is_photo));
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_image_fetch_per_pass() {
        let transport = Arc::new(MockTransport::new([]));
        let search = Arc::new(CountingSearch::ok(vec!["https://img/a.jpg".into()]));
        let dispatcher = dispatcher_with(&[1, 2, 3], transport.clone(), Some(search.clone()));

        let report = dispatcher.run_broadcast(Some("sunrise")).await;
        assert_eq!(report.delivered, 3);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        // All recipients got the photo variant with the text as caption.
        assert!(transport.sent().iter().all(|(_, caption, is_photo)| {
            *is_photo && caption == "good morning"
        }));
    }

    #[tokio::test]
    async fn test_concurrent_passes_are_independent() {
        let transport = Arc::new(MockTransport::new([]));
        let dispatcher = Arc::new(dispatcher_with(&[1, 2, 3], transport.clone(), None));

        let a = tokio::spawn({
            let d = Arc::clone(&dispatcher);
            async move { d.run_broadcast(None).await }
        });
        let b = tokio::spawn({
            let d = Arc::clone(&dispatcher);
            async move { d.run_broadcast(None).await }
        });

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(ra.delivered, 3);
        assert_eq!(rb.delivered, 3);
        assert_eq!(transport.sent().len(), 6);
    }
}

//! Command routing for the polling loop.
//!
//! The subscribe flow is an explicit per-conversation state machine
//! (AwaitingPassword -> Authorized | Rejected) persisted in the directory,
//! keyed by chat id. Storage failures abort the single command, never the
//! process.

use std::sync::Arc;

use rooster_broadcast::{Dispatcher, Reconciler};
use rooster_core::error::Result;
use rooster_core::traits::Transport;
use rooster_core::types::{AuthState, ChatId, Subscriber};
use rooster_directory::Directory;
use rooster_telegram::TelegramEvent;

pub struct CommandRouter {
    directory: Arc<Directory>,
    dispatcher: Arc<Dispatcher>,
    reconciler: Reconciler,
    transport: Arc<dyn Transport>,
    password: String,
}

impl CommandRouter {
    pub fn new(
        directory: Arc<Directory>,
        dispatcher: Arc<Dispatcher>,
        transport: Arc<dyn Transport>,
        password: String,
    ) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&directory));
        Self {
            directory,
            dispatcher,
            reconciler,
            transport,
            password,
        }
    }

    /// Route one polled event. Errors are handled here; the polling loop
    /// keeps running regardless of what a single event did.
    pub async fn handle(&self, event: TelegramEvent) {
        let outcome = match event {
            TelegramEvent::Membership(event) => self.reconciler.handle(event),
            TelegramEvent::Message {
                chat_id,
                first_name,
                username,
                text,
            } => {
                self.handle_message(chat_id, first_name, username, text.trim())
                    .await
            }
        };
        if let Err(e) = outcome {
            tracing::error!("command handling failed: {e}");
        }
    }

    async fn handle_message(
        &self,
        chat_id: ChatId,
        first_name: Option<String>,
        username: Option<String>,
        text: &str,
    ) -> Result<()> {
        match text.split_whitespace().next() {
            Some("/start") => self.start(chat_id, first_name, username).await,
            Some("/stop") => self.stop(chat_id).await,
            Some("/sendnow") => self.send_now(chat_id).await,
            _ => self.continue_conversation(chat_id, first_name, username, text).await,
        }
    }

    async fn start(
        &self,
        chat_id: ChatId,
        first_name: Option<String>,
        username: Option<String>,
    ) -> Result<()> {
        if self.password.is_empty() {
            // No gate configured: subscribe right away.
            self.subscribe(chat_id, first_name, username).await
        } else {
            self.directory
                .set_auth_state(chat_id, AuthState::AwaitingPassword)?;
            self.reply(chat_id, "Enter the password to subscribe.").await;
            Ok(())
        }
    }

    async fn stop(&self, chat_id: ChatId) -> Result<()> {
        self.directory.remove(chat_id)?;
        self.reply(chat_id, "You are unsubscribed. Send /start to come back.")
            .await;
        Ok(())
    }

    async fn send_now(&self, chat_id: ChatId) -> Result<()> {
        if self.directory.auth_state(chat_id)? != Some(AuthState::Authorized) {
            self.reply(chat_id, "This command needs authorization — use /start first.")
                .await;
            return Ok(());
        }
        // Manual trigger: same entry point as the scheduler, run
        // synchronously so the caller gets the report back. Partial
        // delivery still acknowledges — failures are counts, not errors.
        let report = self.dispatcher.run_broadcast(None).await;
        self.reply(chat_id, &format!("Broadcast done: {report}")).await;
        Ok(())
    }

    async fn continue_conversation(
        &self,
        chat_id: ChatId,
        first_name: Option<String>,
        username: Option<String>,
        text: &str,
    ) -> Result<()> {
        match self.directory.auth_state(chat_id)? {
            Some(AuthState::AwaitingPassword) => {
                if text == self.password {
                    self.subscribe(chat_id, first_name, username).await
                } else {
                    self.directory.set_auth_state(chat_id, AuthState::Rejected)?;
                    self.reply(chat_id, "Wrong password. Send /start to try again.")
                        .await;
                    Ok(())
                }
            }
            // Not mid-conversation: nothing to do for free-form text.
            _ => Ok(()),
        }
    }

    async fn subscribe(
        &self,
        chat_id: ChatId,
        first_name: Option<String>,
        username: Option<String>,
    ) -> Result<()> {
        self.directory
            .add(&Subscriber::new(chat_id).with_name(first_name, username))?;
        self.directory.set_auth_state(chat_id, AuthState::Authorized)?;
        self.reply(chat_id, "Subscribed! You will get the daily broadcast.")
            .await;
        Ok(())
    }

    /// Best-effort reply; a failed acknowledgment is logged, not escalated.
    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            tracing::warn!("reply to {chat_id} failed: {e}");
        }
    }
}

//! Domain types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Opaque recipient identifier — a Telegram chat or user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A directory entry: recipient plus optional display metadata.
/// Metadata is refreshed on repeat subscribe; only `chat_id` is identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: ChatId,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

impl Subscriber {
    pub fn new(chat_id: impl Into<ChatId>) -> Self {
        Self {
            chat_id: chat_id.into(),
            first_name: None,
            username: None,
        }
    }

    pub fn with_name(mut self, first_name: Option<String>, username: Option<String>) -> Self {
        self.first_name = first_name;
        self.username = username;
        self
    }
}

/// Terminal vs. live membership as reported by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    /// The recipient can still receive messages.
    Active,
    /// The recipient blocked the bot or left the chat.
    Gone,
}

/// A membership-change notification from the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipEvent {
    pub chat_id: ChatId,
    pub status: MembershipStatus,
}

/// Per-conversation authorization state for the subscribe flow.
/// Replaces the source bot's nested one-shot password handlers with an
/// explicit state machine keyed by chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    AwaitingPassword,
    Authorized,
    Rejected,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::AwaitingPassword => "awaiting_password",
            AuthState::Authorized => "authorized",
            AuthState::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_password" => Some(AuthState::AwaitingPassword),
            "authorized" => Some(AuthState::Authorized),
            "rejected" => Some(AuthState::Rejected),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_state_round_trip() {
        for state in [
            AuthState::AwaitingPassword,
            AuthState::Authorized,
            AuthState::Rejected,
        ] {
            assert_eq!(AuthState::parse(state.as_str()), Some(state));
        }
        assert_eq!(AuthState::parse("bogus"), None);
    }

    #[test]
    fn test_chat_id_display() {
        assert_eq!(ChatId(-100123).to_string(), "-100123");
    }
}

//! Telegram Bot API wire types and their conversion into engine events.

use serde::{Deserialize, Serialize};

use rooster_core::types::{ChatId, MembershipEvent, MembershipStatus};

/// Standard Bot API response envelope.
#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub my_chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

/// `my_chat_member` payload — the bot's own membership changed in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: TelegramChat,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMember {
    pub status: String,
}

/// What the engine consumes from the polling stream.
#[derive(Debug, Clone)]
pub enum TelegramEvent {
    /// An incoming text message (command or conversation reply).
    Message {
        chat_id: ChatId,
        first_name: Option<String>,
        username: Option<String>,
        text: String,
    },
    /// The bot's membership in a chat changed.
    Membership(MembershipEvent),
}

impl TelegramUpdate {
    /// Convert one raw update into an engine event, skipping bot-authored
    /// messages and non-text payloads.
    pub fn into_event(self) -> Option<TelegramEvent> {
        if let Some(member) = self.my_chat_member {
            let status = match member.new_chat_member.status.as_str() {
                "kicked" | "left" => MembershipStatus::Gone,
                _ => MembershipStatus::Active,
            };
            return Some(TelegramEvent::Membership(MembershipEvent {
                chat_id: ChatId(member.chat.id),
                status,
            }));
        }

        let msg = self.message?;
        let text = msg.text?;
        let from = msg.from?;
        if from.is_bot {
            return None;
        }
        Some(TelegramEvent::Message {
            chat_id: ChatId(msg.chat.id),
            first_name: Some(from.first_name),
            username: from.username,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_json(json: &str) -> TelegramUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_message_becomes_event() {
        let update = update_json(
            r#"{
                "update_id": 1,
                "message": {
                    "message_id": 10,
                    "from": {"id": 5, "is_bot": false, "first_name": "Ada", "username": "ada"},
                    "chat": {"id": 5, "type": "private"},
                    "text": "/start",
                    "date": 0
                }
            }"#,
        );
        match update.into_event() {
            Some(TelegramEvent::Message { chat_id, text, username, .. }) => {
                assert_eq!(chat_id, ChatId(5));
                assert_eq!(text, "/start");
                assert_eq!(username.as_deref(), Some("ada"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_bot_messages_are_skipped() {
        let update = update_json(
            r#"{
                "update_id": 2,
                "message": {
                    "message_id": 11,
                    "from": {"id": 6, "is_bot": true, "first_name": "OtherBot"},
                    "chat": {"id": 6, "type": "private"},
                    "text": "beep",
                    "date": 0
                }
            }"#,
        );
        assert!(update.into_event().is_none());
    }

    #[test]
    fn test_kicked_maps_to_gone() {
        let update = update_json(
            r#"{
                "update_id": 3,
                "my_chat_member": {
                    "chat": {"id": 7, "type": "private"},
                    "new_chat_member": {"status": "kicked"}
                }
            }"#,
        );
        match update.into_event() {
            Some(TelegramEvent::Membership(event)) => {
                assert_eq!(event.chat_id, ChatId(7));
                assert_eq!(event.status, MembershipStatus::Gone);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_rejoin_maps_to_active() {
        let update = update_json(
            r#"{
                "update_id": 4,
                "my_chat_member": {
                    "chat": {"id": 8, "type": "private"},
                    "new_chat_member": {"status": "member"}
                }
            }"#,
        );
        match update.into_event() {
            Some(TelegramEvent::Membership(event)) => {
                assert_eq!(event.status, MembershipStatus::Active);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_non_text_update_is_skipped() {
        let update = update_json(
            r#"{
                "update_id": 5,
                "message": {
                    "message_id": 12,
                    "from": {"id": 9, "is_bot": false, "first_name": "Ada"},
                    "chat": {"id": 9, "type": "private"},
                    "date": 0
                }
            }"#,
        );
        assert!(update.into_event().is_none());
    }
}

//! # Rooster Telegram
//! Telegram Bot API transport — message sending plus long polling for
//! commands and membership-change notifications.

pub mod client;
pub mod updates;

pub use client::{TelegramClient, TelegramEventStream};
pub use updates::{TelegramEvent, TelegramUpdate};

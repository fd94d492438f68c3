//! Telegram Bot API transport.
//!
//! Everything the bot does with the outside world goes through
//! [`TelegramApi`], so the flow can be driven by a fake in tests.

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{
    CallbackQuery, Chat, ChatMember, Document, InlineButton, InlineKeyboard, Message, ParseMode,
    SendOptions, Update, User,
};

use crate::error::TransportError;
use async_trait::async_trait;

/// A file to upload with `sendDocument`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub file_name: String,
    pub content: Vec<u8>,
    pub caption: Option<String>,
    pub parse_mode: Option<ParseMode>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Long-poll for updates after `offset`
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: u64,
    ) -> Result<Vec<Update>, TransportError>;

    /// Returns the id of the sent message
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
    ) -> Result<i64, TransportError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError>;

    async fn answer_callback_query(&self, query_id: &str) -> Result<(), TransportError>;

    /// Resolve `file_id` and fetch the file's bytes
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError>;

    async fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> Result<(), TransportError>;

    /// Membership status of `user_id` in `chat` ("member", "left", ...)
    async fn get_chat_member_status(
        &self,
        chat: &str,
        user_id: i64,
    ) -> Result<String, TransportError>;
}

// Recording stand-in for the Bot API, shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use renamebot::bot::{Event, EventKind, FlowController, MembershipGate, Sender};
use renamebot::config::RenameConfig;
use renamebot::error::TransportError;
use renamebot::session::{Clock, SessionStore};
use renamebot::telegram::{
    Document, OutgoingDocument, ParseMode, SendOptions, TelegramApi, Update,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

pub const USER: i64 = 4242;
pub const CHAT: i64 = 4242;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub text: String,
    pub options: SendOptions,
}

#[derive(Debug, Clone)]
pub struct Edit {
    pub message_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

#[derive(Default)]
struct Recorded {
    messages: Vec<SentMessage>,
    edits: Vec<Edit>,
    deleted: Vec<i64>,
    documents: Vec<OutgoingDocument>,
    answered: Vec<String>,
    downloads: Vec<String>,
}

pub struct FakeTelegram {
    recorded: Mutex<Recorded>,
    next_id: AtomicI64,
    file_content: Vec<u8>,
    fail_download: bool,
    fail_send_document: bool,
    fail_send_message: bool,
    member_status: Option<String>,
    // Dropped from this store when the "Processing" status goes out,
    // as if the sweeper got there first
    evict_on_processing: Option<SessionStore>,
}

impl FakeTelegram {
    pub fn new(file_content: &[u8]) -> Self {
        Self {
            recorded: Mutex::new(Recorded::default()),
            next_id: AtomicI64::new(1000),
            file_content: file_content.to_vec(),
            fail_download: false,
            fail_send_document: false,
            fail_send_message: false,
            member_status: None,
            evict_on_processing: None,
        }
    }

    pub fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn failing_send_document(mut self) -> Self {
        self.fail_send_document = true;
        self
    }

    /// Every `sendMessage` fails, error replies included
    pub fn failing_send_message(mut self) -> Self {
        self.fail_send_message = true;
        self
    }

    pub fn with_member_status(mut self, status: &str) -> Self {
        self.member_status = Some(status.to_string());
        self
    }

    pub fn evicting_from(mut self, store: SessionStore) -> Self {
        self.evict_on_processing = Some(store);
        self
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.recorded.lock().unwrap().messages.clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    pub fn edits(&self) -> Vec<Edit> {
        self.recorded.lock().unwrap().edits.clone()
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.recorded.lock().unwrap().deleted.clone()
    }

    pub fn documents(&self) -> Vec<OutgoingDocument> {
        self.recorded.lock().unwrap().documents.clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.recorded.lock().unwrap().answered.clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.recorded.lock().unwrap().downloads.clone()
    }
}

#[async_trait]
impl TelegramApi for FakeTelegram {
    async fn get_updates(
        &self,
        _offset: Option<i64>,
        _timeout: u64,
    ) -> Result<Vec<Update>, TransportError> {
        Ok(vec![])
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
    ) -> Result<i64, TransportError> {
        if text.starts_with("⏳ Processing") {
            if let Some(store) = &self.evict_on_processing {
                store.delete(USER).await;
            }
        }

        if self.fail_send_message {
            return Err(TransportError::Api {
                method: "sendMessage",
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }

        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap().messages.push(SentMessage {
            message_id,
            chat_id,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(message_id)
    }

    async fn edit_message_text(
        &self,
        _chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError> {
        self.recorded.lock().unwrap().edits.push(Edit {
            message_id,
            text: text.to_string(),
            parse_mode,
        });
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        self.recorded.lock().unwrap().deleted.push(message_id);
        Ok(())
    }

    async fn answer_callback_query(&self, query_id: &str) -> Result<(), TransportError> {
        self.recorded
            .lock()
            .unwrap()
            .answered
            .push(query_id.to_string());
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        self.recorded
            .lock()
            .unwrap()
            .downloads
            .push(file_id.to_string());
        if self.fail_download {
            return Err(TransportError::Api {
                method: "getFile",
                description: "Bad Request: file is too big".to_string(),
            });
        }
        Ok(self.file_content.clone())
    }

    async fn send_document(
        &self,
        _chat_id: i64,
        document: OutgoingDocument,
    ) -> Result<(), TransportError> {
        if self.fail_send_document {
            return Err(TransportError::Api {
                method: "sendDocument",
                description: "Request Entity Too Large".to_string(),
            });
        }
        self.recorded.lock().unwrap().documents.push(document);
        Ok(())
    }

    async fn get_chat_member_status(
        &self,
        _chat: &str,
        _user_id: i64,
    ) -> Result<String, TransportError> {
        match &self.member_status {
            Some(status) => Ok(status.clone()),
            None => Err(TransportError::Api {
                method: "getChatMember",
                description: "Bad Request: user not found".to_string(),
            }),
        }
    }
}

pub fn controller(
    api: Arc<FakeTelegram>,
    store: SessionStore,
    clock: Arc<dyn Clock>,
    gate: MembershipGate,
) -> FlowController {
    FlowController::new(api, store, clock, gate, RenameConfig::default())
}

fn sender() -> Sender {
    Sender {
        user_id: USER,
        chat_id: CHAT,
        first_name: "Dana".to_string(),
    }
}

pub fn text(message_id: i64, body: &str) -> Event {
    let update: Update = serde_json::from_value(serde_json::json!({
        "update_id": message_id,
        "message": {
            "message_id": message_id,
            "from": {"id": USER, "first_name": "Dana"},
            "chat": {"id": CHAT},
            "text": body
        }
    }))
    .unwrap();
    Event::from_update(update).unwrap()
}

pub fn document(message_id: i64, file_id: &str, file_name: &str, size: u64) -> Event {
    Event {
        from: sender(),
        message_id: Some(message_id),
        kind: EventKind::Document(Document {
            file_id: file_id.to_string(),
            file_name: Some(file_name.to_string()),
            mime_type: None,
            file_size: Some(size),
        }),
    }
}

/// A document the client sent without a file name
pub fn unnamed_document(message_id: i64, file_id: &str) -> Event {
    Event {
        from: sender(),
        message_id: Some(message_id),
        kind: EventKind::Document(Document {
            file_id: file_id.to_string(),
            file_name: None,
            mime_type: Some("application/octet-stream".to_string()),
            file_size: Some(3),
        }),
    }
}

pub fn callback(query_id: &str, data: &str, message_id: i64) -> Event {
    Event {
        from: sender(),
        message_id: None,
        kind: EventKind::Callback {
            query_id: query_id.to_string(),
            data: data.to_string(),
            message_id: Some(message_id),
        },
    }
}

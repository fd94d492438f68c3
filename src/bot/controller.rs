use super::access::MembershipGate;
use super::event::{Command, Event, EventKind, Sender};
use super::keyboard::{follow_up_keyboard, CallbackAction};
use super::messages;
use crate::config::RenameConfig;
use crate::error::FlowError;
use crate::rename::{compose_file_name, extension_of, format_size, validate_name};
use crate::session::{Clock, Session, SessionStore};
use crate::telegram::{Document, OutgoingDocument, ParseMode, SendOptions, TelegramApi};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Which part of the flow an error came from, for picking the reply and
/// deciding what happens to the pending upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Upload,
    Rename,
    Other,
}

/// Drives each user through upload -> name -> delivery.
///
/// [`FlowController::handle`] is the only entry point and never fails:
/// errors from the steps below are logged and turned into replies there.
pub struct FlowController {
    api: Arc<dyn TelegramApi>,
    store: SessionStore,
    clock: Arc<dyn Clock>,
    gate: MembershipGate,
    rename: RenameConfig,
    started_at: DateTime<Utc>,
}

impl FlowController {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        store: SessionStore,
        clock: Arc<dyn Clock>,
        gate: MembershipGate,
        rename: RenameConfig,
    ) -> Self {
        let started_at = clock.now();
        Self {
            api,
            store,
            clock,
            gate,
            rename,
            started_at,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn handle(&self, event: Event) {
        debug!("Handling {}", event);

        let Event {
            from,
            message_id,
            kind,
        } = event;

        let (stage, result) = match kind {
            EventKind::Command(command) => {
                (Stage::Other, self.on_command(&from, message_id, command).await)
            }
            EventKind::Document(document) => {
                (Stage::Upload, self.on_document(&from, message_id, document).await)
            }
            EventKind::Text(text) => (Stage::Rename, self.on_text(&from, message_id, &text).await),
            EventKind::Callback {
                query_id,
                data,
                message_id: button_message,
            } => {
                let result = self.on_callback(&from, &data, button_message).await;
                if let Err(e) = self.api.answer_callback_query(&query_id).await {
                    warn!("Failed to answer callback {}: {}", query_id, e);
                }
                (Stage::Other, result)
            }
            EventKind::Unsupported => (Stage::Other, self.on_unsupported(&from, message_id).await),
        };

        if let Err(err) = result {
            self.fail(&from, message_id, stage, err).await;
        }
    }

    /// Boundary: log, clean up and tell the user.
    async fn fail(&self, from: &Sender, message_id: Option<i64>, stage: Stage, err: FlowError) {
        let clear = !err.keeps_session()
            && match stage {
                Stage::Rename => true,
                Stage::Upload => matches!(err, FlowError::Transport(_)),
                Stage::Other => false,
            };
        if clear && self.store.delete(from.user_id).await.is_some() {
            debug!("Cleared pending upload for user {} after error", from.user_id);
        }

        let text = match (&err, stage) {
            (FlowError::Validation(v), _) => {
                debug!("User {} sent an invalid name: {}", from.user_id, v);
                messages::rejected(v)
            }
            (FlowError::SessionExpired, _) => {
                info!("Upload for user {} expired before rename", from.user_id);
                messages::SESSION_EXPIRED.to_string()
            }
            (_, Stage::Upload) => {
                error!("Error handling document from user {}: {}", from.user_id, err);
                messages::UPLOAD_FAILED.to_string()
            }
            (_, Stage::Rename) => {
                error!("Error renaming file for user {}: {}", from.user_id, err);
                messages::RENAME_FAILED.to_string()
            }
            (_, Stage::Other) => {
                error!("Error handling event from user {}: {}", from.user_id, err);
                messages::GENERIC_FAILURE.to_string()
            }
        };

        if let Err(e) = self.reply(from, message_id, &text, SendOptions::default()).await {
            error!("Failed to report error to user {}: {}", from.user_id, e);
        }
    }

    async fn reply(
        &self,
        from: &Sender,
        message_id: Option<i64>,
        text: &str,
        mut options: SendOptions,
    ) -> Result<i64, FlowError> {
        if let Some(id) = message_id {
            options = options.reply_to(id);
        }
        Ok(self.api.send_message(from.chat_id, text, &options).await?)
    }

    /// `false` (after telling the user) when the membership gate says no
    async fn admit(&self, from: &Sender, message_id: Option<i64>) -> Result<bool, FlowError> {
        if self.gate.allows(self.api.as_ref(), from.user_id).await {
            return Ok(true);
        }
        let channel = self.gate.required_channel().unwrap_or_default();
        self.reply(
            from,
            message_id,
            &messages::join_channel(channel),
            SendOptions::markdown(),
        )
        .await?;
        Ok(false)
    }

    async fn on_command(
        &self,
        from: &Sender,
        message_id: Option<i64>,
        command: Command,
    ) -> Result<(), FlowError> {
        match command {
            Command::Start | Command::Help => {
                info!("User {} ({}) started bot", from.user_id, from.first_name);
                if self.admit(from, message_id).await? {
                    self.reply(
                        from,
                        message_id,
                        &messages::welcome(&from.first_name),
                        SendOptions::markdown(),
                    )
                    .await?;
                }
            }
            Command::Cancel => {
                let text = match self.store.delete(from.user_id).await {
                    Some(session) => {
                        info!(
                            "User {} cancelled rename of {}",
                            from.user_id, session.original_name
                        );
                        messages::CANCELLED
                    }
                    None => messages::NOTHING_TO_CANCEL,
                };
                self.reply(from, message_id, text, SendOptions::default())
                    .await?;
            }
            Command::Status => {
                let uptime = self.clock.now() - self.started_at;
                let text = messages::status(uptime, self.store.len().await, self.gate.channel());
                self.reply(from, message_id, &text, SendOptions::markdown())
                    .await?;
            }
        }
        Ok(())
    }

    async fn on_document(
        &self,
        from: &Sender,
        message_id: Option<i64>,
        document: Document,
    ) -> Result<(), FlowError> {
        if !self.admit(from, message_id).await? {
            return Ok(());
        }

        let original_name = document
            .file_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| FlowError::InvalidUpload("document has no file name".into()))?;

        let extension = extension_of(&original_name).to_string();
        let mime_type = document.mime_type.unwrap_or_else(|| {
            mime_guess::from_path(&original_name)
                .first_raw()
                .unwrap_or(FALLBACK_MIME)
                .to_string()
        });
        let file_size = document.file_size.unwrap_or(0);
        let size_text = format_size(file_size);

        let session = Session {
            user_id: from.user_id,
            chat_id: from.chat_id,
            file_ref: document.file_id,
            original_name,
            extension,
            file_size,
            mime_type,
            received_at: self.clock.now(),
        };
        let ack = messages::file_received(
            &session.original_name,
            &size_text,
            &session.extension,
            &session.mime_type,
        );

        info!(
            "User {} uploaded: {} ({})",
            from.user_id, session.original_name, size_text
        );
        self.store.put(session).await;

        self.reply(from, message_id, &ack, SendOptions::markdown())
            .await?;
        Ok(())
    }

    async fn on_text(
        &self,
        from: &Sender,
        message_id: Option<i64>,
        text: &str,
    ) -> Result<(), FlowError> {
        let Some(session) = self.store.get(from.user_id).await else {
            self.reply(from, message_id, messages::GUIDANCE, SendOptions::default())
                .await?;
            return Ok(());
        };

        let base = validate_name(text, self.rename.max_name_chars)?;
        let new_name =
            compose_file_name(&base, &session.extension, self.rename.sanitize_extension);

        let status_id = self
            .reply(
                from,
                message_id,
                &messages::processing(&session.original_name, &new_name),
                SendOptions::markdown(),
            )
            .await?;

        let delivered = self
            .deliver(from, status_id, &session.original_name, &new_name)
            .await;

        if let Err(e) = self.api.delete_message(from.chat_id, status_id).await {
            warn!("Failed to delete status message {}: {}", status_id, e);
        }
        delivered?;

        self.store.delete(from.user_id).await;
        info!(
            "User {} renamed: {} -> {}",
            from.user_id, session.original_name, new_name
        );

        let next = SendOptions::markdown().with_keyboard(follow_up_keyboard());
        if let Err(e) = self
            .api
            .send_message(from.chat_id, messages::WHAT_NEXT, &next)
            .await
        {
            warn!("Failed to offer next action to user {}: {}", from.user_id, e);
        }
        Ok(())
    }

    /// Download the pending file and send it back under `new_name`.
    async fn deliver(
        &self,
        from: &Sender,
        status_id: i64,
        original_name: &str,
        new_name: &str,
    ) -> Result<(), FlowError> {
        // The sweeper may have dropped it while we were talking to Telegram
        let session = self
            .store
            .get(from.user_id)
            .await
            .ok_or(FlowError::SessionExpired)?;

        let content = self.api.download_file(&session.file_ref).await?;

        self.api
            .edit_message_text(from.chat_id, status_id, messages::UPLOADING, None)
            .await?;

        let document = OutgoingDocument {
            file_name: new_name.to_string(),
            content,
            caption: Some(messages::rename_complete(original_name, new_name)),
            parse_mode: Some(ParseMode::Markdown),
        };
        self.api.send_document(from.chat_id, document).await?;
        Ok(())
    }

    async fn on_callback(
        &self,
        from: &Sender,
        data: &str,
        button_message: Option<i64>,
    ) -> Result<(), FlowError> {
        let Some(action) = CallbackAction::parse(data) else {
            debug!("Ignoring unknown callback data {:?}", data);
            return Ok(());
        };

        let text = match action {
            CallbackAction::RenameAnother => messages::SEND_FILE_PROMPT,
            CallbackAction::Cancel => {
                if let Some(session) = self.store.delete(from.user_id).await {
                    info!(
                        "User {} cancelled rename of {}",
                        from.user_id, session.original_name
                    );
                }
                messages::CALLBACK_CANCELLED
            }
        };

        if let Some(message_id) = button_message {
            self.api
                .edit_message_text(from.chat_id, message_id, text, Some(ParseMode::Markdown))
                .await?;
        }
        Ok(())
    }

    async fn on_unsupported(
        &self,
        from: &Sender,
        message_id: Option<i64>,
    ) -> Result<(), FlowError> {
        let text = if self.store.contains(from.user_id).await {
            messages::AWAITING_NAME
        } else {
            messages::GUIDANCE
        };
        self.reply(from, message_id, text, SendOptions::default())
            .await?;
        Ok(())
    }
}

use super::types::{ApiResponse, ChatMember, File, ParseMode, SendOptions, Update};
use super::{OutgoingDocument, TelegramApi};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// Extra time allowed on top of the long-poll timeout before giving up
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    bot_token: String,
    api_base: String,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(
        bot_token: String,
        api_base: String,
        request_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.bot_token, file_path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        let resp = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        Self::read_result(method, resp, timeout).await
    }

    async fn read_result<T: DeserializeOwned>(
        method: &'static str,
        resp: reqwest::Response,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        let parsed: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            TransportError::Malformed(format!("{} returned {}: {} ({})", method, status, text, e))
        })?;

        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            error!("Telegram {} error: {}", method, description);
            return Err(TransportError::Api {
                method,
                description,
            });
        }

        parsed
            .result
            .ok_or_else(|| TransportError::Malformed(format!("{} returned no result", method)))
    }
}

fn parse_mode_str(mode: ParseMode) -> &'static str {
    match mode {
        ParseMode::Markdown => "Markdown",
    }
}

#[async_trait]
impl TelegramApi for TelegramClient {
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let mut body = json!({
            "timeout": timeout,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let limit = Duration::from_secs(timeout) + POLL_GRACE;
        self.call("getUpdates", &body, limit).await
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: &SendOptions,
    ) -> Result<i64, TransportError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(mode) = options.parse_mode {
            body["parse_mode"] = json!(parse_mode_str(mode));
        }
        if let Some(reply_to) = options.reply_to {
            body["reply_parameters"] = json!({
                "message_id": reply_to,
                "allow_sending_without_reply": true,
            });
        }
        if let Some(ref keyboard) = options.keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)?;
        }

        let sent: Value = self.call("sendMessage", &body, self.request_timeout).await?;
        sent["message_id"]
            .as_i64()
            .ok_or_else(|| TransportError::Malformed("sendMessage result has no message_id".into()))
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(parse_mode_str(mode));
        }

        let _: Value = self
            .call("editMessageText", &body, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        let _: bool = self
            .call("deleteMessage", &body, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, query_id: &str) -> Result<(), TransportError> {
        let body = json!({ "callback_query_id": query_id });
        let _: bool = self
            .call("answerCallbackQuery", &body, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let body = json!({ "file_id": file_id });
        let file: File = self.call("getFile", &body, self.request_timeout).await?;

        let path = file.file_path.ok_or_else(|| {
            TransportError::Malformed(format!("getFile returned no file_path for {}", file.file_id))
        })?;

        let resp = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.request_timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(TransportError::Api {
                method: "download",
                description: format!("HTTP {} for {}", status, path),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.request_timeout))?;
        debug!("Downloaded {} bytes for file {}", bytes.len(), file_id);
        Ok(bytes.to_vec())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> Result<(), TransportError> {
        let part = Part::bytes(document.content).file_name(document.file_name);
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(caption) = document.caption {
            form = form.text("caption", caption);
        }
        if let Some(mode) = document.parse_mode {
            form = form.text("parse_mode", parse_mode_str(mode));
        }

        let resp = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.request_timeout))?;

        let _: Value = Self::read_result("sendDocument", resp, self.request_timeout).await?;
        Ok(())
    }

    async fn get_chat_member_status(
        &self,
        chat: &str,
        user_id: i64,
    ) -> Result<String, TransportError> {
        let body = json!({
            "chat_id": chat,
            "user_id": user_id,
        });
        let member: ChatMember = self
            .call("getChatMember", &body, self.request_timeout)
            .await?;
        Ok(member.status)
    }
}

use crate::telegram::{Document, Update};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Status,
}

impl Command {
    /// Recognise `/start`, `/help`, `/cancel`, `/status`, optionally addressed
    /// as `/cmd@BotName`. Anything else is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "cancel" => Some(Command::Cancel),
            "status" => Some(Command::Status),
            _ => None,
        }
    }
}

/// Who an event came from and where replies go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user_id: i64,
    pub chat_id: i64,
    pub first_name: String,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    Command(Command),
    Document(Document),
    Text(String),
    Callback {
        query_id: String,
        data: String,
        message_id: Option<i64>,
    },
    /// Photos, stickers, voice notes and anything else without a handler
    Unsupported,
}

/// One inbound update, reduced to what the flow controller acts on
#[derive(Debug, Clone)]
pub struct Event {
    pub from: Sender,
    /// Message to reply to (absent for callbacks)
    pub message_id: Option<i64>,
    pub kind: EventKind,
}

impl Event {
    /// `None` for updates without a user, such as channel posts.
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(query) = update.callback_query {
            let message_id = query.message.as_ref().map(|m| m.message_id);
            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            return Some(Event {
                from: Sender {
                    user_id: query.from.id,
                    chat_id,
                    first_name: query.from.first_name,
                },
                message_id: None,
                kind: EventKind::Callback {
                    query_id: query.id,
                    data: query.data.unwrap_or_default(),
                    message_id,
                },
            });
        }

        let message = update.message?;
        let user = message.from?;
        let from = Sender {
            user_id: user.id,
            chat_id: message.chat.id,
            first_name: user.first_name,
        };

        let kind = if let Some(document) = message.document {
            EventKind::Document(document)
        } else if let Some(text) = message.text {
            match Command::parse(&text) {
                Some(command) => EventKind::Command(command),
                None => EventKind::Text(text),
            }
        } else {
            EventKind::Unsupported
        };

        Some(Event {
            from,
            message_id: Some(message.message_id),
            kind,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            EventKind::Command(c) => format!("command {:?}", c),
            EventKind::Document(d) => format!(
                "document {}",
                d.file_name.as_deref().unwrap_or("<unnamed>")
            ),
            EventKind::Text(_) => "text".to_string(),
            EventKind::Callback { data, .. } => format!("callback {}", data),
            EventKind::Unsupported => "unsupported message".to_string(),
        };
        write!(f, "{} from user {}", kind, self.from.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /help  "), Some(Command::Help));
        assert_eq!(Command::parse("/cancel@RenameBot"), Some(Command::Cancel));
        assert_eq!(Command::parse("/STATUS now"), Some(Command::Status));
        assert_eq!(Command::parse("/rename"), None);
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse(""), None);
    }

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_document_takes_precedence_over_caption() {
        let event = Event::from_update(update(
            r#"{"update_id": 1, "message": {
                "message_id": 5,
                "from": {"id": 10, "first_name": "Lin"},
                "chat": {"id": 10},
                "caption": "/start",
                "document": {"file_id": "abc", "file_name": "a.txt"}
            }}"#,
        ))
        .unwrap();
        assert!(matches!(event.kind, EventKind::Document(ref d) if d.file_id == "abc"));
        assert_eq!(event.message_id, Some(5));
    }

    #[test]
    fn test_text_and_command_events() {
        let event = Event::from_update(update(
            r#"{"update_id": 1, "message": {
                "message_id": 6, "from": {"id": 10, "first_name": "Lin"},
                "chat": {"id": 10}, "text": "/cancel"
            }}"#,
        ))
        .unwrap();
        assert!(matches!(event.kind, EventKind::Command(Command::Cancel)));

        let event = Event::from_update(update(
            r#"{"update_id": 2, "message": {
                "message_id": 7, "from": {"id": 10, "first_name": "Lin"},
                "chat": {"id": 10}, "text": "/unknown thing"
            }}"#,
        ))
        .unwrap();
        assert!(matches!(event.kind, EventKind::Text(ref t) if t == "/unknown thing"));
    }

    #[test]
    fn test_photo_is_unsupported() {
        let event = Event::from_update(update(
            r#"{"update_id": 1, "message": {
                "message_id": 8, "from": {"id": 10, "first_name": "Lin"},
                "chat": {"id": 10}, "photo": [{"file_id": "p"}]
            }}"#,
        ))
        .unwrap();
        assert!(matches!(event.kind, EventKind::Unsupported));
    }

    #[test]
    fn test_callback_event_uses_message_chat() {
        let event = Event::from_update(update(
            r#"{"update_id": 3, "callback_query": {
                "id": "q1", "from": {"id": 10, "first_name": "Lin"},
                "message": {"message_id": 99, "chat": {"id": 10}},
                "data": "cancel"
            }}"#,
        ))
        .unwrap();
        match event.kind {
            EventKind::Callback {
                query_id,
                data,
                message_id,
            } => {
                assert_eq!(query_id, "q1");
                assert_eq!(data, "cancel");
                assert_eq!(message_id, Some(99));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(event.from.chat_id, 10);
    }

    #[test]
    fn test_updates_without_user_are_ignored() {
        assert!(Event::from_update(update(
            r#"{"update_id": 4, "message": {"message_id": 1, "chat": {"id": -100}, "text": "post"}}"#
        ))
        .is_none());
        assert!(Event::from_update(update(r#"{"update_id": 5}"#)).is_none());
    }
}

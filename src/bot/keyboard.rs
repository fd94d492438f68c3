use crate::telegram::{InlineButton, InlineKeyboard};

/// Parsed callback data from the follow-up buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    RenameAnother,
    Cancel,
}

impl CallbackAction {
    pub fn as_data(&self) -> &'static str {
        match self {
            CallbackAction::RenameAnother => "rename_another",
            CallbackAction::Cancel => "cancel",
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "rename_another" => Some(CallbackAction::RenameAnother),
            "cancel" => Some(CallbackAction::Cancel),
            _ => None,
        }
    }
}

fn button(label: &str, action: CallbackAction) -> InlineButton {
    InlineButton {
        text: label.to_string(),
        callback_data: action.as_data().to_string(),
    }
}

/// "Rename Another" / "Cancel", side by side
pub fn follow_up_keyboard() -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![vec![
            button("🔄 Rename Another", CallbackAction::RenameAnother),
            button("❌ Cancel", CallbackAction::Cancel),
        ]],
    }
}

//! User-facing texts. Everything sent with Markdown goes through
//! [`escape`] or [`code`] first.

use crate::error::ValidationError;

pub const UPLOADING: &str = "⏳ Uploading renamed file...";
pub const WHAT_NEXT: &str = "🎉 *What would you like to do?*";
pub const SEND_FILE_PROMPT: &str = "📄 *Send me a file to rename!*";
pub const CALLBACK_CANCELLED: &str = "✅ *Cancelled!*\n\nSend /start to begin again.";
pub const CANCELLED: &str = "✅ Operation cancelled!\n\nSend /start to begin again.";
pub const NOTHING_TO_CANCEL: &str = "ℹ️ Nothing to cancel. Send me a file to rename it!";
pub const AWAITING_NAME: &str = "✏️ Please send the new name for your file:";
pub const GUIDANCE: &str = "ℹ️ Send me a file to rename it!\nUse /start for help.";
pub const SESSION_EXPIRED: &str = "❌ Session expired! Please send the file again.";
pub const UPLOAD_FAILED: &str = "❌ Error processing file. Please try again.";
pub const RENAME_FAILED: &str = "❌ Error renaming file. Please try again with /start";
pub const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again.";

/// Escape legacy-Markdown control characters outside entities
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inline code span. Backticks cannot be escaped inside one.
pub fn code(s: &str) -> String {
    format!("`{}`", s.replace('`', "'"))
}

pub fn welcome(first_name: &str) -> String {
    format!(
        "👋 Welcome, {}!\n\n\
         📄 *File Rename Bot*\n\n\
         *How to use:*\n\
         1️⃣ Send me any file\n\
         2️⃣ Enter new name (without extension)\n\
         3️⃣ Get renamed file back\n\n\
         *Commands:*\n\
         /start - Show this message\n\
         /cancel - Cancel current operation\n\
         /status - Check bot status",
        escape(first_name)
    )
}

pub fn join_channel(channel: &str) -> String {
    format!(
        "❌ *Please join our channel first!*\n\n📢 Channel: {}\n\nJoin, then send /start again.",
        escape(channel)
    )
}

pub fn status(uptime: chrono::Duration, active_sessions: usize, channel: Option<&str>) -> String {
    let secs = uptime.num_seconds().max(0);
    let mut text = format!(
        "ℹ️ *Bot Status*\n\n\
         🟢 *Status:* Online\n\
         ⏱️ *Uptime:* {}h {}m\n\
         👥 *Active Users:* {}",
        secs / 3600,
        (secs % 3600) / 60,
        active_sessions
    );
    if let Some(channel) = channel {
        text.push_str(&format!("\n\nChannel: {}", escape(channel)));
    }
    text
}

pub fn file_received(name: &str, size: &str, extension: &str, mime_type: &str) -> String {
    format!(
        "✅ *File Received!*\n\n\
         📄 *Name:* {}\n\
         📦 *Size:* {}\n\
         🔖 *Extension:* {}\n\
         📋 *Type:* {}\n\n\
         ✏️ *Now send me the new name* (without extension):",
        code(name),
        size,
        code(extension),
        code(mime_type)
    )
}

pub fn rejected(err: &ValidationError) -> String {
    match err {
        ValidationError::Empty => "❌ Name cannot be empty! Please send a valid name:".to_string(),
        ValidationError::TooLong { max } => format!(
            "❌ Name too long! Max {} characters. Please try again:",
            max
        ),
        ValidationError::NoValidCharacters => {
            "❌ Invalid characters! Use letters, numbers, spaces, - _ . only.\nPlease try again:"
                .to_string()
        }
    }
}

pub fn processing(original: &str, new_name: &str) -> String {
    format!(
        "⏳ Processing...\n\nOriginal: {}\nNew: {}",
        code(original),
        code(new_name)
    )
}

pub fn rename_complete(original: &str, new_name: &str) -> String {
    format!(
        "🎉 *Rename Complete!*\n\n📝 Original: {}\n📄 New: {}",
        code(original),
        code(new_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_escapes_name_outside_bold() {
        let text = welcome("snake_case");
        assert!(text.starts_with("👋 Welcome, snake\\_case!\n"));
        assert!(!text.contains("*Welcome"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape("snake_case *bold*"), "snake\\_case \\*bold\\*");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_code_replaces_backticks() {
        assert_eq!(code("a`b.txt"), "`a'b.txt`");
    }

    #[test]
    fn test_status_uptime_format() {
        let text = status(chrono::Duration::seconds(3 * 3600 + 25 * 60 + 10), 2, None);
        assert!(text.contains("3h 25m"));
        assert!(text.contains("*Active Users:* 2"));
        assert!(!text.contains("Channel"));

        let text = status(chrono::Duration::seconds(59), 0, Some("@files_hub"));
        assert!(text.contains("0h 0m"));
        assert!(text.contains("@files\\_hub"));
    }

    #[test]
    fn test_rejection_texts_are_distinct() {
        let texts = [
            rejected(&ValidationError::Empty),
            rejected(&ValidationError::TooLong { max: 100 }),
            rejected(&ValidationError::NoValidCharacters),
        ];
        assert!(texts[1].contains("100"));
        assert_ne!(texts[0], texts[2]);
    }
}

use crate::telegram::TelegramApi;
use tracing::{error, warn};

const MEMBER_STATUSES: [&str; 3] = ["member", "administrator", "creator"];

/// Optional "must have joined the channel" check in front of the flow.
#[derive(Debug, Clone, Default)]
pub struct MembershipGate {
    channel: Option<String>,
    enforce: bool,
}

impl MembershipGate {
    pub fn new(channel: Option<String>, enforce: bool) -> Self {
        Self { channel, enforce }
    }

    pub fn open() -> Self {
        Self::default()
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The channel to show in the join prompt when enforcement is on
    pub fn required_channel(&self) -> Option<&str> {
        if self.enforce {
            self.channel.as_deref()
        } else {
            None
        }
    }

    /// Whether `user_id` may use the bot. A failed lookup counts as "no".
    pub async fn allows(&self, api: &dyn TelegramApi, user_id: i64) -> bool {
        let Some(channel) = self.required_channel() else {
            return true;
        };

        match api.get_chat_member_status(channel, user_id).await {
            Ok(status) => {
                let allowed = MEMBER_STATUSES.contains(&status.as_str());
                if !allowed {
                    warn!("User {} is not in {} (status: {})", user_id, channel, status);
                }
                allowed
            }
            Err(e) => {
                error!("Channel check error for user {}: {}", user_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::telegram::MockTelegramApi;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn open_gate_never_calls_transport() {
        let api = MockTelegramApi::new();
        assert!(MembershipGate::open().allows(&api, 1).await);

        // Channel configured but not enforced: informational only
        let gate = MembershipGate::new(Some("@files_hub".into()), false);
        assert!(gate.allows(&api, 1).await);
    }

    #[tokio::test]
    async fn enforced_gate_accepts_members_and_admins() {
        let mut api = MockTelegramApi::new();
        api.expect_get_chat_member_status()
            .with(eq("@files_hub"), eq(7))
            .returning(|_, _| Ok("administrator".to_string()));
        api.expect_get_chat_member_status()
            .with(eq("@files_hub"), eq(8))
            .returning(|_, _| Ok("member".to_string()));

        let gate = MembershipGate::new(Some("@files_hub".into()), true);
        assert!(gate.allows(&api, 7).await);
        assert!(gate.allows(&api, 8).await);
    }

    #[tokio::test]
    async fn enforced_gate_rejects_left_users_and_lookup_failures() {
        let mut api = MockTelegramApi::new();
        api.expect_get_chat_member_status()
            .with(eq("@files_hub"), eq(1))
            .returning(|_, _| Ok("left".to_string()));
        api.expect_get_chat_member_status()
            .with(eq("@files_hub"), eq(2))
            .returning(|_, _| {
                Err(TransportError::Api {
                    method: "getChatMember",
                    description: "Bad Request: member list is inaccessible".into(),
                })
            });

        let gate = MembershipGate::new(Some("@files_hub".into()), true);
        assert!(!gate.allows(&api, 1).await);
        assert!(!gate.allows(&api, 2).await);
    }
}

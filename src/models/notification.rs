//! Notification envelope broadcast on the cluster channel (spec.md §3, §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum NotificationCommand {
    ApiUpdated,
    ApiRemoved,
    ApiAdded,
    GroupReload,
    KeySpaceUpdate,
    OAuthRevokeToken,
    OAuthRevokeAllTokens,
    OAuthRevokeRefresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub command: NotificationCommand,
    pub payload: String,
    pub signature: String,
}

impl Notification {
    /// Sign `payload` with HMAC-SHA256 over a shared secret, matching the
    /// `{command, payload, signature}` wire envelope (spec.md §6). The pub/sub
    /// transport itself is out of scope (spec.md §1); this only produces the
    /// envelope a transport would carry.
    pub fn sign(command: NotificationCommand, payload: String, secret: &[u8]) -> Self {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        let signature = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, mac.finalize().into_bytes());

        Self {
            command,
            payload,
            signature,
        }
    }

    pub fn verify(&self, secret: &[u8]) -> bool {
        let expected = Self::sign(self.command, self.payload.clone(), secret);
        expected.signature == self.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_notification_verifies() {
        let note = Notification::sign(NotificationCommand::GroupReload, "{}".to_string(), b"secret");
        assert!(note.verify(b"secret"));
        assert!(!note.verify(b"other"));
    }
}

use std::time::Duration;

use tokio::time::Instant;

/// How long an error stays visible before it's cleared on its own.
pub const MESSAGE_LIFETIME: Duration = Duration::from_secs(3);

/// Latest user facing message. It disappears after its lifetime or when the surface showing it
/// is dismissed, whichever comes first.
#[derive(Debug)]
pub struct TransientMessage {
    current: Option<(String, Instant)>,
    lifetime: Duration,
}

impl Default for TransientMessage {
    fn default() -> Self {
        Self::new(MESSAGE_LIFETIME)
    }
}

impl TransientMessage {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            current: None,
            lifetime,
        }
    }

    /// Replaces whatever was shown before.
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some((message.into(), now + self.lifetime));
    }

    pub fn current(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((message, expires)) if now < *expires => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::TransientMessage;

    #[test]
    fn test_message_expires() {
        let start = Instant::now();
        let mut message = TransientMessage::default();
        message.show("Invalid MOCO domain", start);

        assert_eq!(message.current(start), Some("Invalid MOCO domain"));
        assert_eq!(
            message.current(start + Duration::from_millis(2900)),
            Some("Invalid MOCO domain")
        );
        assert_eq!(message.current(start + Duration::from_secs(3)), None);
    }

    #[test]
    fn test_dismiss_clears_before_expiry() {
        let start = Instant::now();
        let mut message = TransientMessage::default();
        message.show("Hours must be greater than 0", start);
        message.dismiss();

        assert_eq!(message.current(start), None);
    }

    #[test]
    fn test_newer_message_restarts_lifetime() {
        let start = Instant::now();
        let mut message = TransientMessage::default();
        message.show("first", start);
        message.show("second", start + Duration::from_secs(2));

        assert_eq!(
            message.current(start + Duration::from_secs(4)),
            Some("second")
        );
    }
}

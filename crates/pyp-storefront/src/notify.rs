//! Transient notifications: one at a time, gone after three seconds.

use std::time::{Duration, Instant};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    raised_at: Instant,
}

impl Notification {
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.raised_at) >= NOTIFICATION_TTL
    }
}

/// Holds the latest notification. A new one replaces the old.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    current: Option<Notification>,
}

impl Notifier {
    pub fn success(&mut self, message: impl Into<String>) {
        self.raise(message.into(), NotificationKind::Success, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.raise(message.into(), NotificationKind::Error, Instant::now());
    }

    fn raise(&mut self, message: String, kind: NotificationKind, raised_at: Instant) {
        match kind {
            NotificationKind::Success => tracing::info!(text = %message, "notification"),
            NotificationKind::Error => tracing::warn!(text = %message, "notification"),
        }
        self.current = Some(Notification {
            message,
            kind,
            raised_at,
        });
    }

    /// The live notification, if one was raised less than
    /// [`NOTIFICATION_TTL`] ago.
    #[must_use]
    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Instant::now())
    }

    #[must_use]
    pub fn current_at(&self, now: Instant) -> Option<&Notification> {
        self.current.as_ref().filter(|n| !n.is_expired(now))
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_expires_after_three_seconds() {
        let mut notifier = Notifier::default();
        let start = Instant::now();
        notifier.raise("Cart updated".to_string(), NotificationKind::Success, start);

        assert_eq!(
            notifier
                .current_at(start + Duration::from_millis(2_999))
                .map(|n| n.message.as_str()),
            Some("Cart updated")
        );
        assert!(notifier.current_at(start + NOTIFICATION_TTL).is_none());
    }

    #[test]
    fn newer_notification_replaces_older() {
        let mut notifier = Notifier::default();
        notifier.success("first");
        notifier.error("second");
        let current = notifier.current().expect("live");
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Error);

        notifier.dismiss();
        assert!(notifier.current().is_none());
    }
}

// Toast queue for status feedback - one visible at a time, auto-dismissed

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

impl NotificationLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    duration: Duration,
    shown_at: Option<Instant>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Info,
            duration: Duration::from_secs(3),
            shown_at: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
            duration: Duration::from_secs(5),
            shown_at: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Notifications {
    queue: VecDeque<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        self.queue.push_back(notification);
    }

    /// Expire the front toast once its duration has elapsed.
    pub fn tick(&mut self, now: Instant) {
        while let Some(front) = self.queue.front_mut() {
            match front.shown_at {
                None => {
                    front.shown_at = Some(now);
                    break;
                }
                Some(shown) if now.duration_since(shown) >= front.duration => {
                    self.queue.pop_front();
                }
                Some(_) => break,
            }
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.queue.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_in_order() {
        let mut notifications = Notifications::default();
        notifications.push(Notification::info("first"));
        notifications.push(Notification::error("second"));

        let t0 = Instant::now();
        notifications.tick(t0);
        assert_eq!(notifications.current().unwrap().message, "first");

        // Info lasts 3s; at 4s the error is showing
        notifications.tick(t0 + Duration::from_secs(4));
        assert_eq!(notifications.current().unwrap().message, "second");

        // Error lasts 5s from when it was first shown
        notifications.tick(t0 + Duration::from_secs(8));
        assert_eq!(notifications.current().unwrap().message, "second");
        notifications.tick(t0 + Duration::from_secs(10));
        assert!(notifications.current().is_none());
    }
}

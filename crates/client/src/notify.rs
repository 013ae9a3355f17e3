//! Process-wide notification and refresh-signal channel.
//!
//! Replaces the untyped custom window events of the historical client
//! (`appToast`, `profileUpdated`, `cartUpdated`) with one typed broadcast
//! channel. Components that render state subscribe; components that mutate
//! state publish. Publishing never blocks and never fails - if nobody is
//! listening the event is dropped, which matches toast semantics.

use std::time::Duration;

use tokio::sync::broadcast;

/// Default on-screen lifetime of a toast, matching the historical client.
const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(4);

/// Channel capacity. Slow subscribers that fall further behind than this
/// observe `RecvError::Lagged` and should resynchronize from the backend.
const CHANNEL_CAPACITY: usize = 64;

/// Visual severity of a transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notification {
    /// Build a notification with the default display duration.
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration: DEFAULT_TOAST_DURATION,
        }
    }
}

/// A cross-component refresh signal for shared server-derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The profile (credit balance, address, avatar) changed server-side;
    /// listeners displaying it should refetch.
    ProfileUpdated,
    /// The cart was mutated and refetched.
    CartUpdated,
    /// The session credential was stored, cleared, or invalidated.
    SessionChanged,
}

/// Everything that flows over the channel.
#[derive(Debug, Clone)]
pub enum Event {
    Toast(Notification),
    Signal(Signal),
}

/// Publish/subscribe handle for [`Event`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Event>,
}

impl Notifier {
    /// Create a new channel.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish a toast.
    pub fn toast(&self, notification: Notification) {
        // A send error only means there are no subscribers right now.
        let _ = self.sender.send(Event::Toast(notification));
    }

    /// Publish an informational toast.
    pub fn info(&self, message: impl Into<String>) {
        self.toast(Notification::new(message, Severity::Info));
    }

    /// Publish a success toast.
    pub fn success(&self, message: impl Into<String>) {
        self.toast(Notification::new(message, Severity::Success));
    }

    /// Publish an error toast.
    pub fn error(&self, message: impl Into<String>) {
        self.toast(Notification::new(message, Severity::Error));
    }

    /// Publish a refresh signal.
    pub fn signal(&self, signal: Signal) {
        let _ = self.sender.send(Event::Signal(signal));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toast_reaches_subscriber() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.error("insufficient stock");

        match rx.recv().await.expect("event") {
            Event::Toast(toast) => {
                assert_eq!(toast.message, "insufficient stock");
                assert_eq!(toast.severity, Severity::Error);
                assert_eq!(toast.duration, Duration::from_secs(4));
            }
            Event::Signal(signal) => panic!("unexpected signal: {signal:?}"),
        }
    }

    #[tokio::test]
    async fn test_signal_reaches_all_subscribers() {
        let notifier = Notifier::new();
        let mut rx1 = notifier.subscribe();
        let mut rx2 = notifier.subscribe();

        notifier.signal(Signal::ProfileUpdated);

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.expect("event") {
                Event::Signal(signal) => assert_eq!(signal, Signal::ProfileUpdated),
                Event::Toast(toast) => panic!("unexpected toast: {toast:?}"),
            }
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let notifier = Notifier::new();
        notifier.info("nobody is listening");
        notifier.signal(Signal::CartUpdated);
    }
}

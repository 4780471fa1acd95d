//! Non-blocking notices for the customer.
//!
//! Remote Sync failures, checkout rejections and similar events are reported
//! here instead of interrupting the caller.

use serde::Serialize;
use tokio::sync::mpsc;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the customer, typically shown as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Trait for notice handlers.
///
/// `notify` must return quickly; it is called while work is in progress.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts notices to all registered notifiers.
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.register(Box::new(notifier));
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, notice: Notice) {
        for notifier in &self.notifiers {
            notifier.notify(notice.clone());
        }
    }
}

/// Logs notices via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!(text = %notice.message, "Notice"),
            NoticeLevel::Warning => tracing::warn!(text = %notice.message, "Notice"),
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(level = ?notice.level, text = %notice.message, "Notice")
            }
        }
    }
}

/// Forwards notices over a channel, e.g. to a UI task.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingNotifier(Arc<AtomicUsize>);

    impl Notifier for CountingNotifier {
        fn notify(&self, _notice: Notice) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_registry_fans_out() {
        let count = Arc::new(AtomicUsize::new(0));
        let registry = NotifierRegistry::new()
            .with(CountingNotifier(count.clone()))
            .with(CountingNotifier(count.clone()))
            .with(LogNotifier);

        registry.notify(Notice::error("push failed"));
        assert_eq!(registry.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notice::success("Order placed"));
        assert_eq!(rx.try_recv().unwrap(), Notice::success("Order placed"));
    }

    #[test]
    fn test_channel_notifier_survives_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify(Notice::info("ignored"));
    }
}

//! User-facing notifications.

/// Fire-and-forget sink for one-line user warnings.
pub trait Notifier: Send + Sync {
    /// Show `message` to the user.
    fn warn(&self, message: &str);
}

/// Notifier that emits warnings as `tracing` events.
///
/// Events use the `cart::notify` target so a subscriber can route them to
/// the user separately from diagnostic logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "cart::notify", "{message}");
    }
}

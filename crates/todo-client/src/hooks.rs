//! Seams between the client and whatever is presenting it to a user.
//!
//! The client never talks to a UI directly. It reports user-facing failures
//! through a [`NotificationSink`] and ends sessions through a [`Navigator`],
//! both injected at construction time.

use std::sync::Arc;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Receives user-facing messages. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Sends the user back to an unauthenticated entry point.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> NotificationSink for F
where
    F: Fn(&str, Severity) + Send + Sync,
{
    fn notify(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self()
    }
}

/// Default sink: notifications become log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!(%message, "notification"),
            Severity::Warning => tracing::warn!(%message, "notification"),
            Severity::Info | Severity::Success => tracing::info!(%message, "notification"),
        }
    }
}

/// Default navigator: there is no login screen, so only log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn redirect_to_login(&self) {
        tracing::info!("Session ended; login required");
    }
}

pub type SharedNotifier = Arc<dyn NotificationSink>;
pub type SharedNavigator = Arc<dyn Navigator>;

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink: SharedNotifier = Arc::new(move |message: &str, severity: Severity| {
            captured.lock().push((message.to_string(), severity));
        });

        sink.notify("Forbidden", Severity::Error);
        assert_eq!(seen.lock().as_slice(), &[("Forbidden".to_string(), Severity::Error)]);
    }

    #[test]
    fn test_closure_navigator() {
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let captured = count.clone();
        let nav: SharedNavigator = Arc::new(move || {
            captured.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        nav.redirect_to_login();
        nav.redirect_to_login();
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}

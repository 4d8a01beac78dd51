use super::Notifier;
use notify_rust::{Notification, Timeout};

/// Notifier backed by the desktop notification service.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str, timeout_ms: u32) -> anyhow::Result<()> {
        let timeout = if timeout_ms == 0 {
            Timeout::Never
        } else {
            Timeout::Milliseconds(timeout_ms)
        };
        Notification::new()
            .summary(title)
            .body(body)
            .timeout(timeout)
            .show()?;
        Ok(())
    }
}

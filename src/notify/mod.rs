//! Notification boundary and the policy deciding what, if anything, to
//! raise for an announcement.

use log::{info, warn};

use crate::registry::appimage::display_name;
use crate::types::{RegisteredPackage, UpdateAction};

pub mod desktop;
pub use desktop::DesktopNotifier;

/// Raises a user-facing notification.  `timeout_ms == 0` means the
/// notification stays until the user dismisses it.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, timeout_ms: u32) -> anyhow::Result<()>;
}

/// Decide what to notify for one version announcement.
///
/// The self-update case wins over everything else: when the announced
/// descriptor (unescaped) equals the daemon's own, the selected package is
/// irrelevant.  Otherwise a selected match yields a package notification
/// and no match yields nothing.
pub fn decide(
    announced_descriptor: &str,
    version: &str,
    own_descriptor: &str,
    selected: Option<RegisteredPackage>,
) -> UpdateAction {
    if announced_descriptor == own_descriptor {
        return UpdateAction::SelfUpdate;
    }
    match selected {
        Some(package) => UpdateAction::Package {
            path: package.path,
            version: version.to_string(),
        },
        None => UpdateAction::Nothing,
    }
}

/// Turn a policy decision into a notification call.
pub fn dispatch(action: &UpdateAction, notifier: &dyn Notifier, timeout_ms: u32) {
    let result = match action {
        UpdateAction::SelfUpdate => {
            // Performing the self-update is not implemented; the user has to
            // act on this one, so it never auto-dismisses.
            info!("update available for the running daemon itself");
            notifier.notify(
                "Update available",
                "An update for the update watcher is available; it must be applied manually for now.",
                0,
            )
        }
        UpdateAction::Package { path, version } => notifier.notify(
            "Update available",
            &format!(
                "{}\ncan be updated to version {}",
                display_name(path),
                version
            ),
            timeout_ms,
        ),
        UpdateAction::Nothing => return,
    };
    if let Err(e) = result {
        warn!("notification failed: {}", e);
    }
}

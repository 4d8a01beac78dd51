//! Topic grammar for version announcements.
//!
//! Announcements are published under a fixed namespace:
//!
//! ```text
//! <namespace>/<escaped update descriptor>/<field>[/...]
//! ```
//!
//! The descriptor segment is percent-escaped so that URI-shaped descriptors
//! survive as a single topic level.  Only the `version` field carries a
//! payload this daemon acts on; other fields are ignored.

use std::borrow::Cow;

/// Topic field that carries a version payload.
pub const VERSION_FIELD: &str = "version";

/// Escape a descriptor for use as a single topic segment.
pub fn escape(descriptor: &str) -> String {
    urlencoding::encode(descriptor).into_owned()
}

/// Reverse [`escape`].  A segment that does not decode to valid UTF-8
/// yields an empty string, which matches nothing.
pub fn unescape(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_default()
}

/// Subscription filter covering every field published for `own_descriptor`.
///
/// Returns `None` when the escaped descriptor is empty; subscribing to
/// `<namespace>//#` would match announcements for every package, so an
/// empty descriptor produces no subscription at all.
pub fn subscription_filter(namespace: &str, own_descriptor: &str) -> Option<String> {
    let escaped = escape(own_descriptor);
    if escaped.is_empty() {
        return None;
    }
    Some(format!("{}/{}/#", namespace, escaped))
}

/// A topic parsed into its announcement parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// The descriptor segment exactly as published (still escaped).
    pub descriptor_segment: String,
    /// The field segment, e.g. `version`.
    pub field: String,
}

/// Split an announcement topic into descriptor segment and field.
///
/// Returns `None` for topics outside the namespace or with fewer than two
/// segments after the namespace prefix; such messages are irrelevant, not
/// errors.
pub fn parse(namespace: &str, topic: &str) -> Option<Announcement> {
    let rest = topic.strip_prefix(namespace)?.strip_prefix('/')?;
    let mut segments = rest.split('/');
    let descriptor_segment = segments.next()?.to_string();
    let field = segments.next()?.to_string();
    Some(Announcement {
        descriptor_segment,
        field,
    })
}

//! Data structures used throughout the update watcher.
//!
//! The wire type is deserialised with [`serde`](https://serde.rs/) from the
//! JSON payload of announcement messages.  The registry types are built
//! fresh on every scan of the local registration directory and are never
//! cached between scans.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Deserialize;

/// JSON payload of a version announcement.
///
/// Publishers may attach additional fields (release notes, channel names);
/// they are ignored here.  A payload without a `version` field decodes to an
/// empty string, which downstream treats as "no signal" rather than as a
/// decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionAnnouncement {
    #[serde(default)]
    pub version: String,
}

/// Update information embedded in a package at build time.
///
/// The raw form is whatever string the package carries (commonly URI-shaped
/// and sometimes percent-escaped).  All comparisons go through the
/// canonical, unescaped form; escaped forms from different encoders must
/// never be compared to each other directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDescriptor(String);

impl UpdateDescriptor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The unescaped form used for equality across encoding boundaries.
    pub fn canonical(&self) -> String {
        crate::topic::unescape(&self.0)
    }

    pub fn as_raw(&self) -> &str {
        &self.0
    }
}

/// A locally registered package that carries update information.
#[derive(Debug, Clone)]
pub struct RegisteredPackage {
    /// Absolute path of the installed executable.
    pub path: PathBuf,
    /// Update information embedded in the executable.
    pub descriptor: UpdateDescriptor,
    /// Modification time of the executable, used for recency selection.
    pub modified: SystemTime,
}

/// Outcome of the notification policy for one announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// The announcement concerns the running daemon itself.  Performing the
    /// self-update is not implemented; only a persistent notification is
    /// raised.
    SelfUpdate,
    /// The announcement matched an installed package.
    Package { path: PathBuf, version: String },
    /// Nothing matched; no notification.
    Nothing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_version_decodes_to_empty() {
        let ann: VersionAnnouncement = serde_json::from_str("{}").unwrap();
        assert_eq!(ann.version, "");
    }

    #[test]
    fn payload_ignores_unknown_fields() {
        let ann: VersionAnnouncement =
            serde_json::from_str(r#"{"version":"2.0","channel":"stable","notes":"x"}"#).unwrap();
        assert_eq!(ann.version, "2.0");
    }

    #[test]
    fn descriptor_canonical_form_unescapes() {
        let d = UpdateDescriptor::new("zsync%7Chttp%3A%2F%2Fx%2Fy");
        assert_eq!(d.canonical(), "zsync|http://x/y");
    }
}

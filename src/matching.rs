//! Correlates an announced descriptor with locally registered packages.

use crate::registry::RegistryScanner;
use crate::topic;
use crate::types::RegisteredPackage;

/// All registered packages whose embedded descriptor equals the announced
/// one.  `announced_segment` is the still-escaped topic segment; comparison
/// happens on unescaped forms only.  An empty result is a normal outcome.
pub fn matching_packages(
    scanner: &RegistryScanner,
    announced_segment: &str,
) -> Vec<RegisteredPackage> {
    let target = topic::unescape(announced_segment);
    scanner
        .scan()
        .into_iter()
        .filter(|package| package.descriptor.canonical() == target)
        .collect()
}

/// The match the notification should reference: newest modification time
/// wins; among equally new packages the lexicographically smallest path
/// wins, so selection is deterministic.
pub fn most_recent(matches: Vec<RegisteredPackage>) -> Option<RegisteredPackage> {
    matches
        .into_iter()
        .max_by(|a, b| a.modified.cmp(&b.modified).then(b.path.cmp(&a.path)))
}

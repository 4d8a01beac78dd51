//! Watches a pub/sub channel for version announcements and raises desktop
//! notifications for updates available to locally installed packages.

pub mod config;
pub mod matching;
pub mod notify;
pub mod registry;
pub mod topic;
pub mod types;
pub mod watcher;

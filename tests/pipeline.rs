//! End-to-end pipeline tests: an inbound announcement travels through topic
//! parsing, a scan of a real registration directory, descriptor matching,
//! and the notification policy, ending at a recording notifier.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use upwatch::notify::Notifier;
use upwatch::registry::{RegistryScanner, UpdateSource, EXEC_LOCATION_KEY};
use upwatch::topic;
use upwatch::watcher::{handle_message, Watcher};

struct MapSource(HashMap<PathBuf, String>);

impl UpdateSource for MapSource {
    fn read_update_information(&self, path: &Path) -> anyhow::Result<String> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no update information"))
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<(String, String, u32)>>);

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str, timeout_ms: u32) -> anyhow::Result<()> {
        self.0
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), timeout_ms));
        Ok(())
    }
}

/// Registers `name` in `dir` as an installed package carrying `descriptor`.
fn install(dir: &Path, name: &str, descriptor: &str, map: &mut HashMap<PathBuf, String>) {
    let exec = dir.join(name);
    std::fs::File::create(&exec).unwrap();
    let mut entry =
        std::fs::File::create(dir.join(format!("appimagekit_{}.desktop", name))).unwrap();
    writeln!(entry, "[Desktop Entry]").unwrap();
    writeln!(entry, "Name={}", name).unwrap();
    writeln!(entry, "{}={}", EXEC_LOCATION_KEY, exec.display()).unwrap();
    map.insert(exec, descriptor.to_string());
}

fn watcher_over(
    dir: &Path,
    map: HashMap<PathBuf, String>,
    own_descriptor: &str,
) -> (Watcher, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let watcher = Watcher {
        own_descriptor: own_descriptor.to_string(),
        namespace: "ns".to_string(),
        scanner: RegistryScanner::new(dir.to_path_buf(), Arc::new(MapSource(map))),
        notifier: notifier.clone(),
        notify_timeout_ms: 120_000,
    };
    (watcher, notifier)
}

fn version_topic(descriptor: &str) -> String {
    format!("ns/{}/version", topic::escape(descriptor))
}

#[test]
fn announcement_notifies_about_matching_package() {
    let tmp = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    install(tmp.path(), "a.AppImage", "http://x/y", &mut map);
    let (watcher, notifier) = watcher_over(tmp.path(), map, "http://me/z");

    handle_message(
        &watcher,
        &version_topic("http://x/y"),
        br#"{"version":"2.0"}"#,
    );

    let calls = notifier.0.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "Update available");
    assert!(calls[0].1.starts_with("a\n"));
    assert!(calls[0].1.contains("2.0"));
    assert_eq!(calls[0].2, 120_000);
}

#[test]
fn payload_without_version_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    install(tmp.path(), "a.AppImage", "http://x/y", &mut map);
    let (watcher, notifier) = watcher_over(tmp.path(), map, "http://me/z");

    handle_message(&watcher, &version_topic("http://x/y"), b"{}");

    assert!(notifier.0.lock().unwrap().is_empty());
}

#[test]
fn malformed_payload_is_dropped() {
    let tmp = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    install(tmp.path(), "a.AppImage", "http://x/y", &mut map);
    let (watcher, notifier) = watcher_over(tmp.path(), map, "http://me/z");

    handle_message(&watcher, &version_topic("http://x/y"), b"version 2.0");

    assert!(notifier.0.lock().unwrap().is_empty());
}

#[test]
fn unknown_descriptor_is_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    install(tmp.path(), "a.AppImage", "http://x/y", &mut map);
    let (watcher, notifier) = watcher_over(tmp.path(), map, "http://me/z");

    handle_message(
        &watcher,
        &version_topic("http://other/pkg"),
        br#"{"version":"2.0"}"#,
    );

    assert!(notifier.0.lock().unwrap().is_empty());
}

#[test]
fn fields_other_than_version_pass_through() {
    let tmp = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    install(tmp.path(), "a.AppImage", "http://x/y", &mut map);
    let (watcher, notifier) = watcher_over(tmp.path(), map, "http://me/z");

    let topic_name = format!("ns/{}/downloads", topic::escape("http://x/y"));
    handle_message(&watcher, &topic_name, br#"{"version":"2.0"}"#);

    assert!(notifier.0.lock().unwrap().is_empty());
}

#[test]
fn own_descriptor_announcement_is_persistent() {
    let tmp = tempfile::tempdir().unwrap();
    let (watcher, notifier) = watcher_over(tmp.path(), HashMap::new(), "http://me/z");

    handle_message(
        &watcher,
        &version_topic("http://me/z"),
        br#"{"version":"2.0"}"#,
    );

    let calls = notifier.0.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, 0);
}

#[test]
fn newest_matching_package_is_referenced() {
    let tmp = tempfile::tempdir().unwrap();
    let mut map = HashMap::new();
    install(tmp.path(), "old.AppImage", "http://x/y", &mut map);
    install(tmp.path(), "new.AppImage", "http://x/y", &mut map);
    let (watcher, notifier) = watcher_over(tmp.path(), map, "http://me/z");

    handle_message(
        &watcher,
        &version_topic("http://x/y"),
        br#"{"version":"2.0"}"#,
    );

    // "new" wins either way: created later, and on an mtime tie the
    // lexicographically smaller path is selected.
    let calls = notifier.0.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.starts_with("new\n"));
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use ini::Ini;
use log::{debug, warn};

use crate::types::{RegisteredPackage, UpdateDescriptor};

pub mod appimage;
pub use appimage::AppImageSource;

/// Desktop-entry key naming the installed executable.
pub const EXEC_LOCATION_KEY: &str = "X-ExecLocation";

/// Prefix marking desktop entries written by the integration step.
const ENTRY_PREFIX: &str = "appimagekit_";

/// Reads the update information embedded in an installed package.
pub trait UpdateSource: Send + Sync {
    /// Returns the raw embedded descriptor string for the executable at
    /// `path`.  An executable without update information is an error.
    fn read_update_information(&self, path: &Path) -> anyhow::Result<String>;
}

/// Enumerates locally registered packages and their embedded descriptors.
///
/// Every call to [`scan`](RegistryScanner::scan) re-reads the registration
/// directory from scratch so the result always reflects the currently
/// installed state.  There is deliberately no cache: announcements are rare
/// and installs may happen at any time.
pub struct RegistryScanner {
    dir: PathBuf,
    source: Arc<dyn UpdateSource>,
}

impl RegistryScanner {
    pub fn new(dir: PathBuf, source: Arc<dyn UpdateSource>) -> Self {
        Self { dir, source }
    }

    /// One record per registration entry that names a still-existing
    /// executable carrying update information.  Entries that fail any of
    /// those conditions are skipped, never fatal.
    pub fn scan(&self) -> Vec<RegisteredPackage> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "registry: cannot read {}: {}",
                    self.dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut packages = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(ENTRY_PREFIX) || !name.ends_with(".desktop") {
                continue;
            }

            let entry_path = entry.path();
            let ini = match Ini::load_from_file(&entry_path) {
                Ok(ini) => ini,
                Err(e) => {
                    warn!("registry: cannot parse {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            let exec = match ini.get_from(Some("Desktop Entry"), EXEC_LOCATION_KEY) {
                Some(exec) if !exec.is_empty() => PathBuf::from(exec),
                _ => {
                    warn!(
                        "registry: {} has no {} key",
                        entry_path.display(),
                        EXEC_LOCATION_KEY
                    );
                    continue;
                }
            };

            let metadata = match fs::metadata(&exec) {
                Ok(metadata) => metadata,
                Err(_) => {
                    warn!(
                        "registry: {} refers to missing file {}",
                        entry_path.display(),
                        exec.display()
                    );
                    continue;
                }
            };

            let descriptor = match self.source.read_update_information(&exec) {
                Ok(ui) if !ui.is_empty() => UpdateDescriptor::new(ui),
                Ok(_) => {
                    debug!("registry: {} carries no update information", exec.display());
                    continue;
                }
                Err(e) => {
                    debug!(
                        "registry: cannot read update information from {}: {}",
                        exec.display(),
                        e
                    );
                    continue;
                }
            };

            packages.push(RegisteredPackage {
                path: exec,
                descriptor,
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        packages
    }
}

use super::UpdateSource;
use anyhow::{anyhow, Result};
use object::{Object, ObjectSection};
use std::fs;
use std::path::Path;

/// ELF section holding the embedded update information.
const UPDATE_INFO_SECTION: &str = ".upd_info";

/// Reads update information straight out of AppImage executables.
///
/// Type-2 AppImages are ELF binaries with the update information stored in
/// a dedicated section, zero-padded to its reserved size.
pub struct AppImageSource;

impl UpdateSource for AppImageSource {
    fn read_update_information(&self, path: &Path) -> Result<String> {
        let data = fs::read(path)?;
        let file = object::File::parse(&*data)?;
        let section = file
            .section_by_name(UPDATE_INFO_SECTION)
            .ok_or_else(|| anyhow!("{} has no {} section", path.display(), UPDATE_INFO_SECTION))?;
        let bytes = section.data()?;
        // The section is fixed-size; the string ends at the first NUL.
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).trim().to_string())
    }
}

/// Human-readable name for an installed package, derived from its file
/// name: extension stripped, separators mapped to spaces.
pub fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name
        .strip_suffix(".AppImage")
        .or_else(|| name.strip_suffix(".appimage"))
        .unwrap_or(&name);
    name.replace(['_', '-'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_suffix_and_separators() {
        assert_eq!(
            display_name(Path::new("/opt/Some_Editor-1.2.AppImage")),
            "Some Editor 1.2"
        );
        assert_eq!(display_name(Path::new("/a.AppImage")), "a");
        assert_eq!(display_name(Path::new("plain")), "plain");
    }

    #[test]
    fn non_elf_files_have_no_update_information() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("not-an-appimage");
        fs::write(&path, b"just text").unwrap();
        assert!(AppImageSource.read_update_information(&path).is_err());
    }
}

//! Plugin discovery - scan the plugin directory for descriptor files

use std::fs::DirEntry;
use std::path::{Path, PathBuf};

use crate::Result;

/// Descriptor file extension
pub const DESCRIPTOR_EXTENSION: &str = "json";

/// Package-level file that is never loaded as a plugin
pub const INIT_FILE: &str = "mod.json";

/// A descriptor file found in the plugin directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPlugin {
    /// Plugin identifier, taken from the file stem
    pub id: String,
    /// Path to the descriptor file
    pub path: PathBuf,
}

/// Scan a plugin directory for descriptor files
///
/// Returns one entry per `<id>.json` file, sorted by file name so load order
/// does not depend on the filesystem. Directories, other extensions and
/// [`INIT_FILE`] are skipped. A missing directory yields no plugins.
///
/// # Errors
///
/// Returns error if the directory exists but cannot be read
pub fn discover_plugins(dir: &Path) -> Result<Vec<DiscoveredPlugin>> {
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "plugin directory does not exist, skipping");
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let Some(path) = entry_path(entry) else {
            continue;
        };
        if !path.is_file() {
            continue;
        }

        let Some(id) = descriptor_id(&path) else {
            continue;
        };

        tracing::debug!(plugin_id = %id, path = %path.display(), "discovered plugin");
        results.push(DiscoveredPlugin { id, path });
    }

    results.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(results)
}

/// Path of a directory entry, or `None` after logging an unreadable one
fn entry_path(entry: std::io::Result<DirEntry>) -> Option<PathBuf> {
    match entry {
        Ok(entry) => Some(entry.path()),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unreadable plugin directory entry");
            None
        }
    }
}

fn descriptor_id(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXTENSION) {
        return None;
    }
    if path.file_name().and_then(|n| n.to_str()) == Some(INIT_FILE) {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let results = discover_plugins(dir.path()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn skip_nonexistent_dir() {
        let results = discover_plugins(Path::new("/nonexistent/path")).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn discover_sorted_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.json"), "{}").unwrap();
        std::fs::write(dir.path().join("alpha.json"), "{}").unwrap();

        let ids: Vec<String> = discover_plugins(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[test]
    fn unreadable_entry_is_skipped() {
        let entry = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(entry_path(entry).is_none());

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("live.json"), "{}").unwrap();
        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap();
        assert_eq!(entry_path(entry), Some(dir.path().join("live.json")));
    }

    #[test]
    fn skip_init_other_extensions_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mod.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        std::fs::write(dir.path().join(".hidden.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();
        std::fs::write(dir.path().join("template.json"), "{}").unwrap();

        let results = discover_plugins(dir.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "template");
        assert_eq!(results[0].path, dir.path().join("template.json"));
    }
}

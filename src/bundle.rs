//! Remote plugin bundle installer
//!
//! Downloads the `main` branch snapshot of a repository as a ZIP archive,
//! extracts it into a staging directory and replaces the local plugin
//! directory with the archive's `<repo_temp>/functions` folder. The staging
//! directory is removed on every exit path.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::ZipArchive;

use crate::{Error, Result};

/// Path appended to the repository URL to get the branch snapshot
pub const ARCHIVE_SUFFIX: &str = "archive/refs/heads/main.zip";

/// Folder inside the repository that holds plugin descriptors
pub const FUNCTIONS_DIR: &str = "functions";

/// Outcome of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// URL the archive was fetched from
    pub archive_url: String,
    /// Number of regular files copied into the target directory
    pub files_copied: usize,
}

/// Build the archive URL for a repository
#[must_use]
pub fn archive_url(repo_url: &str) -> String {
    format!("{}/{ARCHIVE_SUFFIX}", repo_url.trim_end_matches('/'))
}

/// Download the repository snapshot and install its `functions` folder
///
/// Nothing is written to disk when the download fails.
///
/// # Errors
///
/// Returns error on transport failure, a non-2xx status, a corrupt archive,
/// a missing `<repo_temp>/functions` folder, or a filesystem failure
pub async fn install(
    client: &reqwest::Client,
    repo_url: &str,
    repo_temp: &str,
    staging_dir: &Path,
    target_dir: &Path,
) -> Result<InstallReport> {
    let url = archive_url(repo_url);
    tracing::info!(url = %url, "downloading plugin bundle");

    let bytes = fetch_archive(client, &url).await?;
    tracing::debug!(url = %url, bytes = bytes.len(), "bundle downloaded");

    let repo_temp = repo_temp.to_string();
    let staging_dir = staging_dir.to_path_buf();
    let target_dir = target_dir.to_path_buf();
    let files_copied = tokio::task::spawn_blocking(move || {
        install_from_archive(&bytes, &repo_temp, &staging_dir, &target_dir)
    })
    .await
    .map_err(|e| Error::Bundle(format!("install task failed: {e}")))??;

    Ok(InstallReport {
        archive_url: url,
        files_copied,
    })
}

/// Fetch an archive, failing on any non-2xx status
///
/// # Errors
///
/// Returns error on transport failure or a non-success status
pub async fn fetch_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Bundle(format!("download of {url} returned HTTP {status}")));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Extract `archive` and install its `functions` folder into `target_dir`
///
/// Returns the number of files copied.
///
/// # Errors
///
/// Returns error if the archive is corrupt, the `functions` folder is
/// missing, or a filesystem operation fails. `target_dir` is only touched
/// once extraction has succeeded.
pub fn install_from_archive(
    archive: &[u8],
    repo_temp: &str,
    staging_dir: &Path,
    target_dir: &Path,
) -> Result<usize> {
    let _staging = StagingGuard::new(staging_dir)?;

    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    zip.extract(staging_dir)?;
    tracing::debug!(
        path = %staging_dir.display(),
        entries = zip.len(),
        "bundle extracted"
    );

    let repo_dir = staging_dir.join(repo_temp);
    let functions_dir = repo_dir.join(FUNCTIONS_DIR);
    if !functions_dir.is_dir() {
        return Err(Error::Bundle(format!(
            "'{FUNCTIONS_DIR}' folder not found in {}",
            repo_dir.display()
        )));
    }

    replace_dir(&functions_dir, target_dir)
}

/// Replace `target` with a recursive copy of `source`
///
/// The copy is assembled in a sibling directory and swapped in once complete,
/// so a failed copy or swap leaves `target` as it was.
fn replace_dir(source: &Path, target: &Path) -> Result<usize> {
    let incoming = sibling(target, "incoming");
    remove_if_exists(&incoming)?;

    let copied = match copy_tree(source, &incoming) {
        Ok(copied) => copied,
        Err(e) => {
            discard(&incoming);
            return Err(e);
        }
    };

    if let Err(e) = swap_in(&incoming, target) {
        discard(&incoming);
        return Err(e);
    }

    tracing::info!(path = %target.display(), files = copied, "plugin directory replaced");
    Ok(copied)
}

/// Move `incoming` to `target`, keeping the old `target` until the move lands
fn swap_in(incoming: &Path, target: &Path) -> Result<()> {
    let previous = sibling(target, "previous");
    remove_if_exists(&previous)?;

    let had_target = target.exists();
    if had_target {
        std::fs::rename(target, &previous)?;
    }

    if let Err(e) = std::fs::rename(incoming, target) {
        if had_target
            && let Err(restore) = std::fs::rename(&previous, target)
        {
            tracing::error!(
                path = %target.display(),
                error = %restore,
                "failed to restore previous plugin directory"
            );
        }
        return Err(e.into());
    }

    if had_target {
        tracing::info!(path = %target.display(), "removing previous plugin directory");
        discard(&previous);
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Best-effort removal of a scratch directory
fn discard(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch directory");
    }
}

/// Copy a directory tree, preserving file permissions
fn copy_tree(source: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Bundle(format!("unexpected path in bundle: {e}")))?;
        let dest_path = dest.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
        } else if file_type.is_file() {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest_path)?;
            copied += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular bundle entry");
        }
    }

    Ok(copied)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "plugins".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.{suffix}"))
}

/// Removes the staging directory when dropped
struct StagingGuard<'a> {
    path: &'a Path,
}

impl<'a> StagingGuard<'a> {
    fn new(path: &'a Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "removing stale staging directory");
            std::fs::remove_dir_all(path)?;
        }
        std::fs::create_dir_all(path)?;
        Ok(Self { path })
    }
}

impl Drop for StagingGuard<'_> {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        tracing::debug!(path = %self.path.display(), "cleaning up staging directory");
        if let Err(e) = std::fs::remove_dir_all(self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staging directory");
        }
    }
}

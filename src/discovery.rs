//! Kubeconfig discovery.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::model::ClusterTarget;

pub const KUBECONFIG_SUFFIX: &str = ".kubeconfig";

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("No kubeconfig found under {}", .0.display())]
    NoConfigsFound(PathBuf),

    #[error("Failed to scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

fn is_kubeconfig(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|name| name.ends_with(KUBECONFIG_SUFFIX))
}

/// Recursively collects every `*.kubeconfig` file under `root`.
///
/// Symlinks are followed and entries are visited in file-name order. The
/// first unreadable entry aborts the scan.
///
/// # Errors
///
/// [`DiscoveryError::Walk`] on any filesystem error, and
/// [`DiscoveryError::NoConfigsFound`] if nothing matched.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut configs = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;

        if entry.file_type().is_file() && is_kubeconfig(entry.file_name()) {
            debug!(path = %entry.path().display(), "Found kubeconfig");
            configs.push(entry.into_path());
        }
    }

    if configs.is_empty() {
        return Err(DiscoveryError::NoConfigsFound(root.to_path_buf()));
    }

    info!(count = configs.len(), root = %root.display(), "Discovered kubeconfigs");
    Ok(configs)
}

/// [`discover`], mapped to one [`ClusterTarget`] per kubeconfig.
pub fn discover_targets(root: &Path, output_root: &Path) -> Result<Vec<ClusterTarget>, DiscoveryError> {
    Ok(discover(root)?
        .into_iter()
        .map(|path| ClusterTarget::new(path, output_root))
        .collect())
}

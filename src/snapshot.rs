//! Snapshot writer.
//!
//! Artifacts are never deleted or truncated. When an artifact with the same
//! identity already exists, the writer either leaves a timestamped sibling
//! next to it or, in diff mode, a `.diff` file against the existing content.

use chrono::Local;
use similar::{ChangeTag, TextDiff};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const YAML: &str = ".yaml";
pub const OUT: &str = ".out";
pub const LOG: &str = ".log";
pub const DIFF: &str = ".diff";

/// Sortable, timezone-aware and free of characters that are awkward in file names.
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%z";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What [`SnapshotWriter::write`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No artifact existed; the content was written under the base name.
    Created(PathBuf),
    /// An artifact existed; the content went to a timestamped sibling.
    Versioned(PathBuf),
    /// An artifact existed; a line diff against it was written.
    Diffed(PathBuf),
    /// Diff mode found nothing to record. The path is the existing artifact.
    Unchanged(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Created(p)
            | WriteOutcome::Versioned(p)
            | WriteOutcome::Diffed(p)
            | WriteOutcome::Unchanged(p) => p,
        }
    }

    /// Whether a file was written.
    pub fn wrote(&self) -> bool {
        !matches!(self, WriteOutcome::Unchanged(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotWriter {
    diff_mode: bool,
}

impl SnapshotWriter {
    pub fn new(diff_mode: bool) -> Self {
        Self { diff_mode }
    }

    pub fn diff_mode(&self) -> bool {
        self.diff_mode
    }

    /// Persists `content` as `<dir>/<base_name><extension>`.
    ///
    /// `extension` includes its leading dot. The directory is created if
    /// missing. Every file is created exclusively, so concurrent or repeated
    /// writes of one identity each land in their own file: a timestamped
    /// sibling gets a `_2`, `_3`, ... suffix when its name is already taken.
    pub async fn write(
        &self,
        dir: &Path,
        base_name: &str,
        content: &str,
        extension: &str,
    ) -> Result<WriteOutcome, SnapshotError> {
        create_dir(dir).await?;

        let path = dir.join(format!("{}{}", base_name, extension));
        if create_new(&path, content).await? {
            debug!(path = %path.display(), "Created artifact");
            return Ok(WriteOutcome::Created(path));
        }

        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        if !self.diff_mode {
            let stem = format!("{}_{}", base_name, stamp);
            let sibling = create_unique(dir, &stem, extension, content).await?;
            debug!(path = %sibling.display(), "Versioned artifact");
            return Ok(WriteOutcome::Versioned(sibling));
        }

        let previous = fs::read_to_string(&path)
            .await
            .map_err(|source| SnapshotError::Read {
                path: path.clone(),
                source,
            })?;
        if previous == content {
            debug!(path = %path.display(), "Artifact unchanged");
            return Ok(WriteOutcome::Unchanged(path));
        }

        let stem = format!("{}_diff_{}", base_name, stamp);
        let diff = render_line_diff(&previous, content);
        let diff_path = create_unique(dir, &stem, DIFF, &diff).await?;
        debug!(path = %diff_path.display(), "Diffed artifact");
        Ok(WriteOutcome::Diffed(diff_path))
    }

    /// Creates an empty directory for output written by someone else (e.g.
    /// `kubectl`): `<parent>/<name>` if it does not exist yet, a timestamped
    /// sibling otherwise.
    pub async fn fresh_dir(&self, parent: &Path, name: &str) -> Result<PathBuf, SnapshotError> {
        create_dir(parent).await?;

        let dir = parent.join(name);
        if claim_dir(&dir).await? {
            return Ok(dir);
        }

        let stamp = Local::now().format(TIMESTAMP_FORMAT);
        let stem = format!("{}_{}", name, stamp);
        let mut n = 1;
        loop {
            let dir = parent.join(numbered(&stem, n, ""));
            if claim_dir(&dir).await? {
                return Ok(dir);
            }
            n += 1;
        }
    }
}

async fn create_dir(dir: &Path) -> Result<(), SnapshotError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|source| SnapshotError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

/// `false` if `dir` already exists.
async fn claim_dir(dir: &Path) -> Result<bool, SnapshotError> {
    match fs::create_dir(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(SnapshotError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

fn numbered(stem: &str, n: usize, extension: &str) -> String {
    if n == 1 {
        format!("{}{}", stem, extension)
    } else {
        format!("{}_{}{}", stem, n, extension)
    }
}

/// Writes `content` to the first free name among `<stem><ext>`,
/// `<stem>_2<ext>`, `<stem>_3<ext>`, ...
async fn create_unique(
    dir: &Path,
    stem: &str,
    extension: &str,
    content: &str,
) -> Result<PathBuf, SnapshotError> {
    let mut n = 1;
    loop {
        let path = dir.join(numbered(stem, n, extension));
        if create_new(&path, content).await? {
            return Ok(path);
        }
        n += 1;
    }
}

/// Writes `content` to `path` only if nothing is there yet; `false` if the
/// name is taken.
async fn create_new(path: &Path, content: &str) -> Result<bool, SnapshotError> {
    let write_err = |source: std::io::Error| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_err(e)),
    };
    file.write_all(content.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    Ok(true)
}

/// Line diff of `old` against `new`: inserted lines start with `+`, deleted
/// lines with `-`, equal lines are copied as-is.
pub fn render_line_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut out = String::with_capacity(old.len().max(new.len()));

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => out.push('-'),
            ChangeTag::Insert => out.push('+'),
            ChangeTag::Equal => {}
        }
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }

    out
}

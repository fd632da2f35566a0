//! Output sinks: where fetched items end up.
//!
//! A sink is owned by the single aggregator task, so implementations need no
//! internal locking. The only primitive the pipeline relies on is "create a
//! named entry and write its bytes", followed by one [`Sink::finish`] call.
//!
//! - [`archive`] - zip archive, duplicate entry names are kept side by side
//! - [`directory`] - one file per item, a duplicate name overwrites the earlier file

pub mod archive;
pub mod directory;

pub use archive::ArchiveSink;
pub use directory::DirectorySink;

use crate::error::SinkError;
use std::path::{Component, Path, PathBuf};

/// Destination for one gallery run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Zip archive at the given path (created or truncated)
    Archive(PathBuf),
    /// Directory at the given path (created if missing)
    Directory(PathBuf),
}

impl Destination {
    /// Path of the archive file or directory
    pub fn path(&self) -> &Path {
        match self {
            Destination::Archive(path) | Destination::Directory(path) => path,
        }
    }

    /// Create the destination container.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Create`] when the archive file or directory cannot
    /// be created. This is the only fatal sink failure.
    pub async fn open(&self) -> Result<Box<dyn Sink>, SinkError> {
        match self {
            Destination::Archive(path) => Ok(Box::new(ArchiveSink::create(path)?)),
            Destination::Directory(path) => Ok(Box::new(DirectorySink::create(path).await?)),
        }
    }
}

/// A container accepting named byte payloads
#[async_trait::async_trait]
pub trait Sink: Send {
    /// Write `payload` as an entry called `name`.
    async fn write_entry(&mut self, name: &str, payload: &[u8]) -> Result<(), SinkError>;

    /// Flush and close the destination. Called once, after the last entry.
    async fn finish(self: Box<Self>) -> Result<(), SinkError>;
}

/// Reject entry names that are not a single plain path component.
pub(crate) fn validate_entry_name(name: &str) -> Result<(), SinkError> {
    let invalid = |reason| SinkError::InvalidEntryName {
        name: name.to_string(),
        reason,
    };

    if name.contains(['/', '\\']) {
        return Err(invalid("path separators are not allowed"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (None, _) => Err(invalid("name is empty")),
        _ => Err(invalid("must be a single plain path component")),
    }
}

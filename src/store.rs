use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::emit;
use crate::error::{Error, Result};
use crate::ser::to_value;

/// Nesting limit applied when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// File name offered for download when the configured path has none.
pub const DEFAULT_FILENAME: &str = "config.yaml";

/// Mode of a config file created where none existed.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Whether a config file has been written yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Empty,
    Configured,
}

/// Raw content of the config file, ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// The single config file at a fixed path.
///
/// Writes replace the whole file through a rename, so a reader sees either the
/// previous document or the new one in full.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    max_depth: usize,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: PathBuf::from(path.as_ref()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn state(&self) -> StoreState {
        if self.path.is_file() {
            StoreState::Configured
        } else {
            StoreState::Empty
        }
    }

    /// Renders `document` without writing it.
    ///
    /// Applies the same checks as [`FileStore::write`]: the document must be a
    /// mapping no deeper than the configured limit.
    pub fn render<T>(&self, document: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        let value = to_value(document)?;
        if value.as_mapping().is_none() {
            return Err(Error::NotAMapping(value.type_name()));
        }
        let depth = value.depth();
        if depth > self.max_depth {
            return Err(Error::TooDeep {
                depth,
                limit: self.max_depth,
            });
        }
        Ok(emit::render(&value))
    }

    /// Replaces the config file with the serialization of `document`.
    ///
    /// The text is rendered in full before anything touches the disk; a failed
    /// call leaves the previous file as it was.
    pub fn write<T>(&self, document: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let text = self.render(document)?;
        self.replace(text.as_bytes())?;
        info!(path = %self.path.display(), bytes = text.len(), "config written");
        Ok(())
    }

    fn replace(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // The temp file must live on the same filesystem for the rename to be atomic
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;

        // Temp files are created 0600; keep the replaced file's mode instead
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = match fs::metadata(&self.path) {
                Ok(meta) if meta.is_file() => meta.permissions().mode() & 0o7777,
                _ => NEW_FILE_MODE,
            };
            tmp.as_file().set_permissions(fs::Permissions::from_mode(mode))?;
        }

        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Returns the config file's content and the name to offer it under.
    pub fn read(&self) -> Result<ConfigFile> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config written yet");
                return Err(Error::NotFound(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        debug!(path = %self.path.display(), bytes = bytes.len(), "config read");
        Ok(ConfigFile {
            bytes,
            filename: self.filename(),
        })
    }

    /// Reads the config file back into a typed document.
    pub fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        crate::de::from_fs(&self.path)
    }

    fn filename(&self) -> String {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_FILENAME)
            .to_owned()
    }
}

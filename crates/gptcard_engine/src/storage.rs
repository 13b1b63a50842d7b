//! Extension local storage, persisted as a RON file.
//!
//! Holds the completion settings written by the options page and the
//! one-shot `insert_template` written when a card is created from a
//! template. The content script only ever clears the template.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use card_logging::{card_info, card_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::GptConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse storage file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize storage: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageContents {
    pub gpt_config: GptConfig,
    pub insert_template: String,
}

#[derive(Debug)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    contents: StorageContents,
}

impl LocalStorage {
    /// Storage that lives only as long as the process.
    pub fn in_memory(contents: StorageContents) -> Self {
        Self {
            path: None,
            contents,
        }
    }

    /// Loads `path`; a missing file is an empty storage.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let contents = read_contents(&path)?;
        Ok(Self {
            path: Some(path),
            contents,
        })
    }

    pub fn gpt_config(&self) -> &GptConfig {
        &self.contents.gpt_config
    }

    pub fn insert_template(&self) -> &str {
        &self.contents.insert_template
    }

    pub fn set_insert_template(&mut self, template: impl Into<String>) -> Result<(), StorageError> {
        self.contents.insert_template = template.into();
        self.save()
    }

    /// Takes the pending template and clears it at the source.
    ///
    /// Returns `None` when no template is stored. A file-backed storage is
    /// re-read first, so a template written by another party after
    /// [`LocalStorage::open`] is seen. The cleared state is written before
    /// the template is handed out.
    pub fn take_insert_template(&mut self) -> Result<Option<String>, StorageError> {
        let Some(path) = self.path.as_deref() else {
            if self.contents.insert_template.is_empty() {
                return Ok(None);
            }
            return Ok(Some(std::mem::take(&mut self.contents.insert_template)));
        };
        let mut current = read_contents(path)?;
        let template = std::mem::take(&mut current.insert_template);
        if template.is_empty() {
            self.contents.insert_template.clear();
            return Ok(None);
        }
        // Other fields are written back as found on disk.
        write_contents(path, &current)?;
        self.contents.insert_template.clear();
        Ok(Some(template))
    }

    /// Re-reads the backing file. Returns true if the completion settings changed.
    pub fn reload(&mut self) -> Result<bool, StorageError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        let contents = read_contents(path)?;
        let changed = contents.gpt_config != self.contents.gpt_config;
        self.contents = contents;
        Ok(changed)
    }

    fn save(&self) -> Result<(), StorageError> {
        match self.path.as_deref() {
            Some(path) => write_contents(path, &self.contents),
            None => Ok(()),
        }
    }
}

fn write_contents(path: &Path, contents: &StorageContents) -> Result<(), StorageError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(contents, pretty)
        .map_err(|err| StorageError::Serialize(err.to_string()))?;
    write_atomically(path, &content)
}

fn read_contents(path: &Path) -> Result<StorageContents, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            card_info!("No storage file at {:?}, starting empty", path);
            return Ok(StorageContents::default());
        }
        Err(err) => return Err(err.into()),
    };
    if text.trim().is_empty() {
        card_warn!("Storage file {:?} is empty", path);
        return Ok(StorageContents::default());
    }
    ron::from_str(&text).map_err(|err| StorageError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Writes a temp file next to `path`, then renames it over `path`.
fn write_atomically(path: &Path, content: &str) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| StorageError::Io(err.error))?;
    Ok(())
}

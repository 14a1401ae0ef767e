//! JSON document store
//!
//! The store is a single JSON file holding every collection. A process-wide
//! reader/writer lock guards the file:
//!
//! - [`DocumentStore::read`] loads the file under the shared lock
//! - [`DocumentStore::update`] holds the exclusive lock across the whole
//!   load → mutate → write cycle, so two writers can never both see the
//!   same "next id"
//!
//! Writes go to a temporary file in the same directory which is fsynced and
//! renamed over the target, so the file on disk is always a complete snapshot.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::document::Document;
use crate::config::StoreConfig;
use crate::types::{ChirpyError, Result};

/// Mutex-guarded whole-file JSON store
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl DocumentStore {
    /// Open the store, creating an empty document if the file is absent
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = Self {
            path: config.path,
            lock: RwLock::new(()),
        };
        store.ensure_initialized()?;
        Ok(store)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty document if the file does not exist yet
    ///
    /// An existing file must be readable and parse as a valid document.
    pub fn ensure_initialized(&self) -> Result<()> {
        let _guard = self.write_guard()?;

        match fs::read(&self.path) {
            Ok(bytes) => {
                parse_document(&bytes)?;
                debug!("Document store at {:?} is valid", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating empty document store at {:?}", self.path);
                self.write_file(&Document::empty())
            }
            Err(e) => Err(ChirpyError::StoreUnavailable(format!(
                "Failed to read {:?}: {}",
                self.path, e
            ))),
        }
    }

    /// Load a full snapshot
    pub fn load(&self) -> Result<Document> {
        self.read(|doc| Ok(doc.clone()))
    }

    /// Replace the whole document with `doc`
    pub fn replace(&self, doc: &Document) -> Result<()> {
        let mut doc = doc.clone();
        doc.normalize()?;
        doc.check_keys().map_err(ChirpyError::CorruptStore)?;

        let _guard = self.write_guard()?;
        self.write_file(&doc)
    }

    /// Run `f` against a snapshot under the shared lock
    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Document) -> Result<T>,
    {
        let _guard = self.read_guard()?;
        let doc = self.read_file()?;
        f(&doc)
    }

    /// Run one load → mutate → write cycle under the exclusive lock
    ///
    /// If `f` fails nothing is written. If the write fails the change is
    /// not committed and the error is returned as is.
    pub fn update<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _guard = self.write_guard()?;
        let mut doc = self.read_file()?;
        let value = f(&mut doc)?;
        self.write_file(&doc)?;
        Ok(value)
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ()>> {
        self.lock
            .read()
            .map_err(|e| ChirpyError::StoreUnavailable(format!("Lock poisoned: {}", e)))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ()>> {
        self.lock
            .write()
            .map_err(|e| ChirpyError::StoreUnavailable(format!("Lock poisoned: {}", e)))
    }

    fn read_file(&self) -> Result<Document> {
        let bytes = fs::read(&self.path).map_err(|e| {
            ChirpyError::StoreUnavailable(format!("Failed to read {:?}: {}", self.path, e))
        })?;
        parse_document(&bytes)
    }

    fn write_file(&self, doc: &Document) -> Result<()> {
        let data = serde_json::to_vec(doc)
            .map_err(|e| ChirpyError::StoreUnavailable(format!("Failed to encode document: {}", e)))?;

        let tmp_path = self.temp_path();
        if let Err(e) = write_synced(&tmp_path, &data) {
            remove_temp(&tmp_path);
            return Err(ChirpyError::StoreUnavailable(format!(
                "Failed to write {:?}: {}",
                tmp_path, e
            )));
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            remove_temp(&tmp_path);
            return Err(ChirpyError::StoreUnavailable(format!(
                "Failed to replace {:?}: {}",
                self.path, e
            )));
        }

        debug!("Wrote {} bytes to {:?}", data.len(), self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database.json".to_string());
        self.path
            .with_file_name(format!(".{}.tmp.{}", file_name, Uuid::new_v4()))
    }
}

fn parse_document(bytes: &[u8]) -> Result<Document> {
    let mut doc: Document = serde_json::from_slice(bytes)?;
    doc.check_keys().map_err(ChirpyError::CorruptStore)?;
    doc.normalize()?;
    Ok(doc)
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove temporary file {:?}: {}", path, e);
        }
    }
}

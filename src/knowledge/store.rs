//! Knowledge Store - JSON file persistence for the knowledge base
//!
//! The whole base is read once at startup and rewritten in full after every
//! successful append. The new contents go to a sibling temp file that is
//! renamed over the old one, so a failed write leaves the previous file
//! intact. There is no locking; two processes sharing one file race and the
//! last writer wins.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::KnowledgeBase;

/// Errors from loading or saving a knowledge base
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("knowledge base not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed knowledge base {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("knowledge base already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },
}

/// Read and parse the knowledge base at `path`
pub fn load(path: impl AsRef<Path>) -> Result<KnowledgeBase, StorageError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let base: KnowledgeBase =
        serde_json::from_str(&contents).map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Loaded {} knowledge entries from {}", base.len(), path.display());
    Ok(base)
}

/// Serialize the whole knowledge base to `path`, replacing the file
pub fn save(path: impl AsRef<Path>, base: &KnowledgeBase) -> Result<(), StorageError> {
    let path = path.as_ref();
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(base).map_err(|source| StorageError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, json.as_bytes()).map_err(io_err)?;

    info!("Saved {} knowledge entries to {}", base.len(), path.display());
    Ok(())
}

/// Hidden sibling the new contents are staged in before the rename
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("knowledge_base.json");
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path_for(path);

    let staged = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = staged.and_then(|_| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Create an empty knowledge base file. Refuses to clobber an existing file
/// unless `force` is set.
pub fn init(path: impl AsRef<Path>, force: bool) -> Result<(), StorageError> {
    let path = path.as_ref();
    if path.exists() && !force {
        return Err(StorageError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    debug!("Initializing empty knowledge base at {}", path.display());
    save(path, &KnowledgeBase::new())
}

/// Durable storage for a knowledge base.
///
/// The session controller persists only through this trait.
pub trait KnowledgeStore {
    fn load(&self) -> Result<KnowledgeBase, StorageError>;

    fn save(&self, base: &KnowledgeBase) -> Result<(), StorageError>;

    /// Human-readable location, used in messages
    fn location(&self) -> String;
}

/// Knowledge store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KnowledgeStore for JsonFileStore {
    fn load(&self) -> Result<KnowledgeBase, StorageError> {
        load(&self.path)
    }

    fn save(&self, base: &KnowledgeBase) -> Result<(), StorageError> {
        save(&self.path, base)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

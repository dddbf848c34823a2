//! Attachment store contract and filesystem implementation.
//!
//! # Responsibility
//! - Persist uploaded submission files under opaque keys.
//! - Keep hostile upload names from ever touching a filesystem path.
//!
//! # Invariants
//! - Keys are a generated uuid prefix plus the sanitized upload name, so
//!   two uploads of the same file never collide.
//! - `get` refuses keys containing path separators; a key is one path
//!   component, never a path.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static UNSAFE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid file name regex"));

/// Longest sanitized name kept in a key, in characters.
const SANITIZED_NAME_MAX_CHARS: usize = 120;

pub type StorageResult<T> = Result<T, AttachmentError>;

/// Failure while storing or fetching attachment bytes.
#[derive(Debug)]
pub enum AttachmentError {
    /// No bytes stored under this key.
    Missing { key: String },
    /// Key is empty or contains path separators.
    InvalidKey { key: String },
    /// Filesystem failure while reading or writing.
    Io { key: String, source: io::Error },
}

impl Display for AttachmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { key } => write!(f, "attachment bytes missing for key `{key}`"),
            Self::InvalidKey { key } => write!(f, "invalid attachment key `{key}`"),
            Self::Io { key, source } => {
                write!(f, "attachment storage failure for key `{key}`: {source}")
            }
        }
    }
}

impl Error for AttachmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Missing { .. } | Self::InvalidKey { .. } => None,
        }
    }
}

/// Stored attachment reference kept on the submission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    /// Opaque storage key.
    pub key: String,
    /// Upload name as the student provided it, for download headers.
    pub original_name: String,
}

/// Byte storage for submission attachments.
pub trait AttachmentStore {
    /// Stores `bytes` under a fresh key derived from `original_name`.
    fn put(&self, original_name: &str, bytes: &[u8]) -> StorageResult<StoredAttachment>;

    /// Fetches the bytes stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Vec<u8>>;
}

/// Attachment store writing one file per key under a root directory.
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn put(&self, original_name: &str, bytes: &[u8]) -> StorageResult<StoredAttachment> {
        let key = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));

        fs::create_dir_all(&self.root).map_err(|source| AttachmentError::Io {
            key: key.clone(),
            source,
        })?;
        fs::write(self.root.join(&key), bytes).map_err(|source| AttachmentError::Io {
            key: key.clone(),
            source,
        })?;

        Ok(StoredAttachment {
            key,
            original_name: original_name.to_string(),
        })
    }

    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        if key.is_empty() || key.contains(['/', '\\']) {
            return Err(AttachmentError::InvalidKey {
                key: key.to_string(),
            });
        }

        match fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(AttachmentError::Missing {
                key: key.to_string(),
            }),
            Err(source) => Err(AttachmentError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Reduces an upload name to one safe path component.
///
/// Directory parts are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// an underscore, and overlong names are cut. An empty result falls back
/// to `attachment`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let safe = UNSAFE_NAME_RE.replace_all(base, "_");
    let capped: String = safe.chars().take(SANITIZED_NAME_MAX_CHARS).collect();

    if capped.is_empty() {
        return "attachment".to_string();
    }
    capped
}

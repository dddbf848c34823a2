//! Attachment byte storage.
//!
//! # Responsibility
//! - Define the opaque put/get contract submissions use for uploaded files.
//! - Provide the filesystem implementation with key sanitization.
//!
//! # Invariants
//! - Keys are opaque to callers; only the store knows how they map to
//!   bytes. The original file name travels separately on the submission.
//! - A failed `put` aborts the submission that requested it; there is no
//!   partial success.

mod attachment;

pub use attachment::{
    AttachmentError, AttachmentStore, FsAttachmentStore, StorageResult, StoredAttachment,
};

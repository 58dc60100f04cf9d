//! Form persistence subsystem
//!
//! The persistence gateway is an explicitly constructed client handed to
//! the controllers as `Arc<dyn FormStore>`. It has an explicit lifecycle:
//! open (or construct) first, `close()` last.
//!
//! # Guarantees
//!
//! - Operations addressed to one form apply in issue order
//! - Every file read validates a CRC32 checksum
//! - File writes are atomic (temp file + rename)

mod checksum;
mod errors;
mod file;
mod gateway;
mod memory;

pub use checksum::compute_checksum;
pub use errors::{StorageError, StorageResult};
pub use file::FileFormStore;
pub use gateway::{FormRecord, FormStore};
pub use memory::MemoryFormStore;

//! Scheduling-request persistence: document model, store trait, conflict
//! retry, and the in-memory reference backend.

pub mod document;
pub mod error;
pub mod memory;
pub mod retry;
pub mod store;

pub use document::ScheduleDocument;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use retry::{CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, with_conflict_retry};
pub use store::{BoxFuture, RequestStore, VersionedDocument};

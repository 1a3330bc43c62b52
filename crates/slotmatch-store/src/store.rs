//! RequestStore trait definition.
//!
//! The request store is the only shared mutable resource in the system.
//! All mutations are read-modify-write under optimistic concurrency: every
//! read carries an etag, and a replace succeeds only if the document still
//! matches it. Callers resolve [`StoreError::Conflict`] by re-reading and
//! retrying (see [`crate::retry`]).

use std::future::Future;
use std::pin::Pin;

use slotmatch_core::CandidateSlot;

use crate::document::ScheduleDocument;
use crate::error::StoreResult;

/// A boxed future for async trait methods, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A document together with the version tag it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDocument {
    /// The document contents.
    pub document: ScheduleDocument,
    /// Opaque version tag for conditional replacement.
    pub etag: String,
}

/// Storage backend for scheduling requests.
///
/// Implementations must be `Send + Sync`; the service shares one instance
/// across concurrent requests. Documents are expected to expire through a
/// backend retention TTL rather than explicit deletion.
pub trait RequestStore: Send + Sync {
    /// Persists a new document under its token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the token already exists.
    ///
    /// [`StoreError::Conflict`]: crate::error::StoreError::Conflict
    fn create(&self, document: ScheduleDocument) -> BoxFuture<'_, StoreResult<()>>;

    /// Reads the document for `token` together with its current etag.
    fn read<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StoreResult<VersionedDocument>>;

    /// Replaces the document if it still matches `etag`, returning the new
    /// etag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the document changed since it
    /// was read at `etag`.
    ///
    /// [`StoreError::Conflict`]: crate::error::StoreError::Conflict
    fn replace_if_match<'a>(
        &'a self,
        etag: &'a str,
        document: ScheduleDocument,
    ) -> BoxFuture<'a, StoreResult<String>>;

    /// Finds every document other than `exclude_token` whose candidate
    /// list still contains `candidate` (compared by decoded timestamps).
    fn find_holding_candidate<'a>(
        &'a self,
        candidate: &'a CandidateSlot,
        exclude_token: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<VersionedDocument>>>;
}

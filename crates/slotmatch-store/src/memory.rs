//! In-memory request store.
//!
//! Reference backend with counter-based etags. Backs the service tests and
//! local development; a hosted document store with native etags slots in
//! behind the same [`RequestStore`] trait.

use std::collections::HashMap;

use slotmatch_core::CandidateSlot;
use tokio::sync::Mutex;

use crate::document::ScheduleDocument;
use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, RequestStore, VersionedDocument};

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    document: ScheduleDocument,
}

impl Entry {
    fn etag(&self) -> String {
        self.version.to_string()
    }

    fn versioned(&self) -> VersionedDocument {
        VersionedDocument {
            document: self.document.clone(),
            etag: self.etag(),
        }
    }
}

/// An in-memory [`RequestStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestStore for MemoryStore {
    fn create(&self, document: ScheduleDocument) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().await;
            if entries.contains_key(&document.token) {
                return Err(StoreError::conflict(&document.token));
            }
            entries.insert(
                document.token.clone(),
                Entry {
                    version: 1,
                    document,
                },
            );
            Ok(())
        })
    }

    fn read<'a>(&'a self, token: &'a str) -> BoxFuture<'a, StoreResult<VersionedDocument>> {
        Box::pin(async move {
            let entries = self.entries.lock().await;
            entries
                .get(token)
                .map(Entry::versioned)
                .ok_or_else(|| StoreError::not_found(token))
        })
    }

    fn replace_if_match<'a>(
        &'a self,
        etag: &'a str,
        document: ScheduleDocument,
    ) -> BoxFuture<'a, StoreResult<String>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().await;
            let entry = entries
                .get_mut(&document.token)
                .ok_or_else(|| StoreError::not_found(&document.token))?;
            if entry.etag() != etag {
                return Err(StoreError::conflict(&document.token));
            }
            entry.version += 1;
            entry.document = document;
            Ok(entry.etag())
        })
    }

    fn find_holding_candidate<'a>(
        &'a self,
        candidate: &'a CandidateSlot,
        exclude_token: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<VersionedDocument>>> {
        Box::pin(async move {
            let entries = self.entries.lock().await;
            let mut matches: Vec<VersionedDocument> = entries
                .values()
                .filter(|entry| {
                    entry.document.token != exclude_token
                        && entry.document.holds_candidate(candidate)
                })
                .map(Entry::versioned)
                .collect();
            matches.sort_by(|a, b| a.document.token.cmp(&b.document.token));
            Ok(matches)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn document(token: &str) -> ScheduleDocument {
        ScheduleDocument {
            token: token.to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            start_time: "09:00".to_string(),
            end_time: "18:00".to_string(),
            selected_days: Vec::new(),
            duration_minutes: 60,
            participants: vec!["a@example.com".to_string()],
            time_zone: "Tokyo Standard Time".to_string(),
            confirmed: false,
            candidates: Vec::new(),
            event_ids: BTreeMap::new(),
        }
    }

    fn candidate(start: &str, end: &str) -> CandidateSlot {
        format!("{start}, {end}").parse().unwrap()
    }

    #[tokio::test]
    async fn create_then_read() {
        let store = MemoryStore::new();
        store.create(document("tok")).await.unwrap();
        let read = store.read("tok").await.unwrap();
        assert_eq!(read.document.token, "tok");
        assert_eq!(read.etag, "1");
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let store = MemoryStore::new();
        store.create(document("tok")).await.unwrap();
        let err = store.create(document("tok")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn read_unknown_token_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.read("missing").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn replace_bumps_etag() {
        let store = MemoryStore::new();
        store.create(document("tok")).await.unwrap();
        let read = store.read("tok").await.unwrap();

        let mut updated = read.document.clone();
        updated.confirmed = true;
        let new_etag = store.replace_if_match(&read.etag, updated).await.unwrap();
        assert_ne!(new_etag, read.etag);
        assert!(store.read("tok").await.unwrap().document.confirmed);
    }

    #[tokio::test]
    async fn stale_etag_conflicts() {
        let store = MemoryStore::new();
        store.create(document("tok")).await.unwrap();
        let first = store.read("tok").await.unwrap();

        // Another writer wins the race.
        store
            .replace_if_match(&first.etag, first.document.clone())
            .await
            .unwrap();

        let err = store
            .replace_if_match(&first.etag, first.document)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn find_holding_candidate_excludes_selector() {
        let store = MemoryStore::new();
        let window = candidate("2025-01-10T10:00:00", "2025-01-10T11:00:00");

        let mut selecting = document("selector");
        selecting.candidates = vec![window];
        let mut competing = document("competitor");
        competing.candidates = vec![window];
        let mut unrelated = document("unrelated");
        unrelated.candidates = vec![candidate("2025-01-10T14:00:00", "2025-01-10T15:00:00")];

        store.create(selecting).await.unwrap();
        store.create(competing).await.unwrap();
        store.create(unrelated).await.unwrap();

        let held = store.find_holding_candidate(&window, "selector").await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].document.token, "competitor");
    }
}

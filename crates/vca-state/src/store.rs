//! # Credential Repository
//!
//! [`CredentialRepository`] is the persistence seam for credential records.
//! Mutations go through [`CredentialRepository::try_update`], which runs
//! read, validate and write under one lock, so each record changes
//! atomically. Records are independent; there is no cross-record locking.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use vca_core::{ContentDigest, CredentialId};

use crate::error::CredentialError;
use crate::record::CredentialRecord;

/// Storage for credential records.
pub trait CredentialRepository: Send + Sync {
    /// Store a new record.
    ///
    /// # Errors
    ///
    /// `CredentialError::DuplicateId` if the id is taken.
    fn insert(&self, record: CredentialRecord) -> Result<(), CredentialError>;

    fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, CredentialError>;

    /// The earliest-inserted record whose `vc_hash` is `hash`.
    fn find_by_hash(&self, hash: &ContentDigest)
        -> Result<Option<CredentialRecord>, CredentialError>;

    /// Atomically read-validate-update one record.
    ///
    /// The closure works on a copy; the copy is written back only when it
    /// returns `Ok`, so a failed update leaves the record untouched.
    ///
    /// # Errors
    ///
    /// `CredentialError::NotFound` for an unknown id, or the closure's error.
    fn try_update(
        &self,
        id: &CredentialId,
        f: &mut dyn FnMut(&mut CredentialRecord) -> Result<(), CredentialError>,
    ) -> Result<CredentialRecord, CredentialError>;

    /// All records in insertion order.
    fn list(&self) -> Result<Vec<CredentialRecord>, CredentialError>;
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<CredentialId, CredentialRecord>,
    order: Vec<CredentialId>,
}

/// Thread-safe, cloneable in-memory repository.
///
/// The lock is `parking_lot::RwLock`; it is never held across a call out
/// of this module.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records, keeping their order.
    ///
    /// # Errors
    ///
    /// `CredentialError::DuplicateId` if two records share an id.
    pub fn from_records(
        records: impl IntoIterator<Item = CredentialRecord>,
    ) -> Result<Self, CredentialError> {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialRepository for InMemoryCredentialStore {
    fn insert(&self, record: CredentialRecord) -> Result<(), CredentialError> {
        let mut guard = self.inner.write();
        if guard.records.contains_key(&record.id) {
            return Err(CredentialError::DuplicateId(record.id));
        }
        guard.order.push(record.id);
        guard.records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, CredentialError> {
        Ok(self.inner.read().records.get(id).cloned())
    }

    fn find_by_hash(
        &self,
        hash: &ContentDigest,
    ) -> Result<Option<CredentialRecord>, CredentialError> {
        let guard = self.inner.read();
        Ok(guard
            .order
            .iter()
            .filter_map(|id| guard.records.get(id))
            .find(|r| r.vc_hash.as_ref() == Some(hash))
            .cloned())
    }

    fn try_update(
        &self,
        id: &CredentialId,
        f: &mut dyn FnMut(&mut CredentialRecord) -> Result<(), CredentialError>,
    ) -> Result<CredentialRecord, CredentialError> {
        let mut guard = self.inner.write();
        let slot = guard
            .records
            .get_mut(id)
            .ok_or(CredentialError::NotFound(*id))?;
        let mut draft = slot.clone();
        f(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    fn list(&self) -> Result<Vec<CredentialRecord>, CredentialError> {
        let guard = self.inner.read();
        Ok(guard
            .order
            .iter()
            .filter_map(|id| guard.records.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{at, new_credential};
    use crate::status::CredentialStatus;
    use std::thread;

    fn issued(tag: &str) -> CredentialRecord {
        CredentialRecord::issued(new_credential(tag), at(0))
    }

    #[test]
    fn insert_and_get() {
        let store = InMemoryCredentialStore::new();
        let r = issued("a");
        store.insert(r.clone()).unwrap();
        assert_eq!(store.get(&r.id).unwrap(), Some(r));
        assert_eq!(store.get(&CredentialId::new()).unwrap(), None);
    }

    #[test]
    fn duplicate_id_rejected() {
        let store = InMemoryCredentialStore::new();
        let r = issued("a");
        store.insert(r.clone()).unwrap();
        assert_eq!(store.insert(r.clone()), Err(CredentialError::DuplicateId(r.id)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn find_by_hash_prefers_earliest() {
        let store = InMemoryCredentialStore::new();
        let first = issued("same");
        let second = issued("same");
        store.insert(first.clone()).unwrap();
        store.insert(second).unwrap();
        let found = store.find_by_hash(&first.vc_hash.unwrap()).unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn failed_update_leaves_record_unchanged() {
        let store = InMemoryCredentialStore::new();
        let r = issued("a");
        store.insert(r.clone()).unwrap();
        let err = store
            .try_update(&r.id, &mut |rec| {
                rec.approve_visibility(at(5));
                Err(CredentialError::Store("rejected".into()))
            })
            .unwrap_err();
        assert_eq!(err, CredentialError::Store("rejected".into()));
        assert!(!store.get(&r.id).unwrap().unwrap().recruiter_approved);
    }

    #[test]
    fn update_unknown_is_not_found() {
        let store = InMemoryCredentialStore::new();
        let id = CredentialId::new();
        assert_eq!(
            store.try_update(&id, &mut |_| Ok(())),
            Err(CredentialError::NotFound(id))
        );
    }

    #[test]
    fn list_keeps_insertion_order() {
        let store = InMemoryCredentialStore::new();
        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|t| {
                let r = issued(t);
                store.insert(r.clone()).unwrap();
                r.id
            })
            .collect();
        let listed: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
        let restored = InMemoryCredentialStore::from_records(store.list().unwrap()).unwrap();
        assert_eq!(restored.list().unwrap(), store.list().unwrap());
    }

    #[test]
    fn concurrent_updates_to_one_record_do_not_lose_writes() {
        let store = InMemoryCredentialStore::new();
        let r = issued("a");
        store.insert(r.clone()).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let id = r.id;
                thread::spawn(move || {
                    store
                        .try_update(&id, &mut |rec| {
                            if i % 2 == 0 {
                                rec.approve_visibility(at(i));
                            } else {
                                rec.accept_visibility(at(i));
                            }
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let rec = store.get(&r.id).unwrap().unwrap();
        assert!(rec.recruiter_approved && rec.student_accepted);
        assert_eq!(rec.status, CredentialStatus::Verified);
    }
}

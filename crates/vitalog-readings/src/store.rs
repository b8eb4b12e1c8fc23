//! Per-user reading storage.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use chrono::Utc;
use vitalog_protocol::{Reading, ReadingDraft, ReadingId, UserId};

use crate::ReadingError;

/// Persistence contract for readings.
///
/// Every operation is scoped to one user. A reading that exists but
/// belongs to another user behaves exactly like a missing one.
pub trait ReadingStore: Send + Sync + 'static {
    /// All of `user`'s readings, newest first.
    fn list(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<Reading>, ReadingError>> + Send;

    /// Stores a new reading for `user`.
    fn create(
        &self,
        user: UserId,
        draft: ReadingDraft,
    ) -> impl Future<Output = Result<Reading, ReadingError>> + Send;

    /// Replaces the measured values of one of `user`'s readings.
    ///
    /// `id` and `created_at` are kept.
    fn update(
        &self,
        user: UserId,
        id: ReadingId,
        draft: ReadingDraft,
    ) -> impl Future<Output = Result<Reading, ReadingError>> + Send;

    /// Deletes one of `user`'s readings.
    fn delete(
        &self,
        user: UserId,
        id: ReadingId,
    ) -> impl Future<Output = Result<(), ReadingError>> + Send;
}

/// A [`ReadingStore`] kept in memory, indexed by owner.
#[derive(Default)]
pub struct InMemoryReadingStore {
    readings: RwLock<HashMap<UserId, Vec<Reading>>>,
}

impl InMemoryReadingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> ReadingError {
        ReadingError::Unavailable("reading table lock poisoned".into())
    }
}

impl ReadingStore for InMemoryReadingStore {
    async fn list(&self, user: UserId) -> Result<Vec<Reading>, ReadingError> {
        let readings = self.readings.read().map_err(Self::poisoned)?;
        let mut list = readings.get(&user).cloned().unwrap_or_default();
        list.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(list)
    }

    async fn create(&self, user: UserId, draft: ReadingDraft) -> Result<Reading, ReadingError> {
        let reading = Reading {
            id: ReadingId::new(),
            user_id: user,
            date: draft.date,
            systolic: draft.systolic,
            diastolic: draft.diastolic,
            heart_rate: draft.heart_rate,
            notes: draft.notes,
            created_at: Utc::now(),
        };

        self.readings
            .write()
            .map_err(Self::poisoned)?
            .entry(user)
            .or_default()
            .push(reading.clone());

        tracing::debug!(user_id = %user, reading_id = %reading.id, "reading stored");
        Ok(reading)
    }

    async fn update(
        &self,
        user: UserId,
        id: ReadingId,
        draft: ReadingDraft,
    ) -> Result<Reading, ReadingError> {
        let mut readings = self.readings.write().map_err(Self::poisoned)?;
        let reading = readings
            .get_mut(&user)
            .and_then(|list| list.iter_mut().find(|r| r.id == id))
            .ok_or(ReadingError::NotFound(id))?;

        reading.date = draft.date;
        reading.systolic = draft.systolic;
        reading.diastolic = draft.diastolic;
        reading.heart_rate = draft.heart_rate;
        reading.notes = draft.notes;
        Ok(reading.clone())
    }

    async fn delete(&self, user: UserId, id: ReadingId) -> Result<(), ReadingError> {
        let mut readings = self.readings.write().map_err(Self::poisoned)?;
        let list = readings.get_mut(&user).ok_or(ReadingError::NotFound(id))?;

        let before = list.len();
        list.retain(|r| r.id != id);
        if list.len() == before {
            return Err(ReadingError::NotFound(id));
        }

        tracing::debug!(user_id = %user, reading_id = %id, "reading deleted");
        Ok(())
    }
}

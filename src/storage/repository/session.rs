// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistence of the active generation session snapshot.

use crate::models::GiftData;
use crate::storage::{PersistedStore, StorageKey};

/// Repository for the single active session snapshot.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    store: PersistedStore,
}

impl SessionRepository {
    pub fn new(store: PersistedStore) -> Self {
        Self { store }
    }

    /// Last persisted snapshot; a corrupt snapshot is discarded.
    pub fn load(&self) -> Option<GiftData> {
        self.store.get(StorageKey::CurrentGiftData)
    }

    /// Write the snapshot, or clear the key when there is no recipient.
    pub fn save(&self, data: Option<&GiftData>) {
        match data {
            Some(data) => self.store.set(StorageKey::CurrentGiftData, data),
            None => self.clear(),
        }
    }

    pub fn clear(&self) {
        self.store.remove(StorageKey::CurrentGiftData);
    }
}

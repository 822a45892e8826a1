// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage keys and on-disk layout.

use std::path::{Path, PathBuf};

use crate::config::{env_or_default, DATA_DIR_ENV, DEFAULT_DATA_DIR};

/// Fixed key of each persisted collection.
///
/// Every collection owns exactly one key; values are JSON documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// JSON array of saved gifts.
    SavedGifts,
    /// JSON array of saved recipient profiles.
    SavedRecipients,
    /// JSON object with the active recipient and suggestion batch.
    CurrentGiftData,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [
        StorageKey::SavedGifts,
        StorageKey::SavedRecipients,
        StorageKey::CurrentGiftData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::SavedGifts => "presgen-saved-gifts",
            StorageKey::SavedRecipients => "presgen-saved-recipients",
            StorageKey::CurrentGiftData => "presgen-current-gift-data",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root taken from `DATA_DIR`, falling back to `./data`.
    pub fn from_env() -> Self {
        Self::new(env_or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR))
    }

    /// Path to the embedded key/value database file.
    pub fn database(&self) -> PathBuf {
        self.root.join("presgen.redb")
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent key/value storage for saved gifts, saved recipients and the
//! active generation session.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   presgen.redb                    # redb database, table `kv`
//!     presgen-saved-gifts           # JSON array of SavedGift
//!     presgen-saved-recipients      # JSON array of SavedRecipient
//!     presgen-current-gift-data     # JSON object GiftData
//! ```
//!
//! ## Important Notes
//!
//! - Reads never fail: corrupt values are deleted and read as absent
//! - Write failures are logged, never returned
//! - Without a backend the store is a silent no-op

pub mod keys;
pub mod kv;
pub mod repository;

pub use keys::{StorageKey, StoragePaths};
pub use kv::{
    KeyValueBackend, MemoryBackend, PersistedStore, RedbBackend, StorageError, StorageResult,
};
pub use repository::{GiftSort, RecipientRegistry, SavedGiftRegistry, SessionRepository};

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the persisted store.
//!
//! Each repository owns one storage key, loads it explicitly and writes it
//! back explicitly after every mutation.

pub mod recipients;
pub mod saved_gifts;
pub mod session;

pub use recipients::RecipientRegistry;
pub use saved_gifts::{GiftSort, SavedGiftRegistry};
pub use session::SessionRepository;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Price label reconciliation.
//!
//! The model writes prices as free text and does not always respect the
//! selected budget. When the budget tier is known its canonical range wins.

use crate::models::Budget;

/// Shown when neither a budget tier nor a usable model price is available.
pub const PRICE_PLACEHOLDER: &str = "Price not available";

/// Label to display or store for a gift price.
pub fn reconcile_price_label(raw_price: &str, budget: Option<Budget>) -> String {
    if let Some(budget) = budget {
        return budget.label().to_string();
    }

    let trimmed = raw_price.trim();
    if trimmed.is_empty() {
        PRICE_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Recipients, AI-generated suggestions and saved gifts.
//!
//! All persisted types serialize with camelCase field names so the stored
//! JSON keeps the layout used by the browser client (`additionalInfo`,
//! `savedAt`, `recipientName`).
//!
//! ## Model Categories
//!
//! - **Recipients**: [`RecipientProfile`] form data and [`SavedRecipient`]
//! - **Suggestions**: batch-local [`GiftSuggestion`] values from one response
//! - **Saved gifts**: durable [`SavedGift`] records with composite ids
//! - **Session**: the [`GiftData`] snapshot restored after a reload

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pricing::reconcile_price_label;

// =============================================================================
// Recipient Attributes
// =============================================================================

/// How the user knows the recipient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    Friend,
    Family,
    Colleague,
    Partner,
    Acquaintance,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Friend => "friend",
            Relationship::Family => "family",
            Relationship::Colleague => "colleague",
            Relationship::Partner => "partner",
            Relationship::Acquaintance => "acquaintance",
        }
    }
}

/// Age bracket of the recipient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AgeRange {
    Child,
    Teen,
    YoungAdult,
    Adult,
    Senior,
}

impl AgeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::Child => "child",
            AgeRange::Teen => "teen",
            AgeRange::YoungAdult => "young-adult",
            AgeRange::Adult => "adult",
            AgeRange::Senior => "senior",
        }
    }
}

/// Spending tier selected for a recipient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    Medium,
    High,
}

impl Budget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Low => "low",
            Budget::Medium => "medium",
            Budget::High => "high",
        }
    }

    /// Canonical display range for the tier.
    pub fn label(&self) -> &'static str {
        match self {
            Budget::Low => "Under $50",
            Budget::Medium => "$50-150",
            Budget::High => "$150+",
        }
    }
}

/// Event the gift is meant for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Occasion {
    #[serde(rename = "birthday")]
    Birthday,
    #[serde(rename = "christmas")]
    Christmas,
    #[serde(rename = "anniversary")]
    Anniversary,
    #[serde(rename = "graduation")]
    Graduation,
    #[serde(rename = "wedding")]
    Wedding,
    #[serde(rename = "housewarming")]
    Housewarming,
    #[serde(rename = "thank you")]
    ThankYou,
    #[serde(rename = "just because")]
    JustBecause,
}

impl Occasion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occasion::Birthday => "birthday",
            Occasion::Christmas => "christmas",
            Occasion::Anniversary => "anniversary",
            Occasion::Graduation => "graduation",
            Occasion::Wedding => "wedding",
            Occasion::Housewarming => "housewarming",
            Occasion::ThankYou => "thank you",
            Occasion::JustBecause => "just because",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Relationship, AgeRange, Budget, Occasion);

// =============================================================================
// Recipient Models
// =============================================================================

/// Recipient form data submitted for a generation.
///
/// `interests` is ordered by importance, most important first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecipientProfile {
    pub name: String,
    pub relationship: Relationship,
    pub age: AgeRange,
    pub interests: Vec<String>,
    pub budget: Budget,
    pub occasion: Occasion,
    #[serde(default)]
    pub additional_info: String,
}

impl RecipientProfile {
    /// Key identifying "the same recipient" across separate submissions.
    ///
    /// `additional_info` is deliberately not part of it.
    pub fn signature(&self) -> String {
        [
            self.name.trim().to_lowercase(),
            self.relationship.as_str().to_string(),
            self.age.as_str().to_string(),
            self.occasion.as_str().to_string(),
            self.budget.as_str().to_string(),
            self.interests.join("|"),
        ]
        .join("::")
    }

    /// Trimmed name; interests without blanks or repeats, first occurrence wins.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        let mut seen = Vec::with_capacity(self.interests.len());
        for interest in self.interests {
            let interest = interest.trim().to_string();
            if !interest.is_empty() && !seen.contains(&interest) {
                seen.push(interest);
            }
        }
        self.interests = seen;
        self
    }
}

/// A recipient profile remembered for reuse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipient {
    pub id: String,
    #[serde(flatten)]
    pub profile: RecipientProfile,
    pub saved_at: DateTime<Utc>,
}

// =============================================================================
// Gift Models
// =============================================================================

/// One AI-produced suggestion.
///
/// `id` is only unique within the batch it arrived in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GiftSuggestion {
    pub id: u32,
    pub name: String,
    pub description: String,
    /// Free-text price range as written by the model.
    pub price: String,
    pub category: String,
    pub reason: String,
}

/// A suggestion the user decided to keep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedGift {
    /// Composite id `<batch-local id>-<epoch ms>`.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Reconciled price label, not the raw model string.
    pub price: String,
    pub category: String,
    pub reason: String,
    /// Free-text copy of the recipient name; no referential link.
    pub recipient_name: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedGift {
    /// Batch-local suggestion id encoded before the first `-`.
    pub fn original_id(&self) -> Option<u32> {
        original_id_of(&self.id)
    }
}

/// Recover the batch-local suggestion id from a composite saved-gift id.
pub fn original_id_of(composite_id: &str) -> Option<u32> {
    composite_id
        .split('-')
        .next()
        .and_then(|prefix| prefix.trim().parse().ok())
}

/// Either kind of gift, as shown in a gift list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftItem<'a> {
    Suggestion(&'a GiftSuggestion),
    Saved(&'a SavedGift),
}

impl<'a> GiftItem<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            GiftItem::Suggestion(s) => &s.name,
            GiftItem::Saved(g) => &g.name,
        }
    }

    pub fn description(&self) -> &'a str {
        match self {
            GiftItem::Suggestion(s) => &s.description,
            GiftItem::Saved(g) => &g.description,
        }
    }

    pub fn category(&self) -> &'a str {
        match self {
            GiftItem::Suggestion(s) => &s.category,
            GiftItem::Saved(g) => &g.category,
        }
    }

    pub fn reason(&self) -> &'a str {
        match self {
            GiftItem::Suggestion(s) => &s.reason,
            GiftItem::Saved(g) => &g.reason,
        }
    }

    pub fn recipient_name(&self) -> Option<&'a str> {
        match self {
            GiftItem::Suggestion(_) => None,
            GiftItem::Saved(g) => Some(&g.recipient_name),
        }
    }

    /// Price to display, reconciled against the budget when one is known.
    pub fn price_label(&self, budget: Option<Budget>) -> String {
        match self {
            GiftItem::Suggestion(s) => reconcile_price_label(&s.price, budget),
            GiftItem::Saved(g) => reconcile_price_label(&g.price, budget),
        }
    }
}

// =============================================================================
// Session Models
// =============================================================================

/// The recipient and suggestion batch currently on screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GiftData {
    pub recipient: RecipientProfile,
    pub suggestions: Vec<GiftSuggestion>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sam() -> RecipientProfile {
        RecipientProfile {
            name: "Sam".to_string(),
            relationship: Relationship::Friend,
            age: AgeRange::Adult,
            interests: vec!["music".to_string(), "travel".to_string()],
            budget: Budget::Medium,
            occasion: Occasion::Birthday,
            additional_info: String::new(),
        }
    }

    pub fn suggestion(id: u32, name: &str) -> GiftSuggestion {
        GiftSuggestion {
            id,
            name: name.to_string(),
            description: format!("{name} description"),
            price: "$60-90".to_string(),
            category: "Experiences".to_string(),
            reason: "Fits their interests".to_string(),
        }
    }
}

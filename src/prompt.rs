// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Prompt/response contract with the chat-completion endpoint.
//!
//! Builds the outbound request for a recipient and validates the model's
//! answer into a suggestion batch. A batch is accepted whole or not at all.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::GenerationConfig;
use crate::models::{GiftSuggestion, RecipientProfile};

/// Number of suggestions requested per generation.
pub const SUGGESTION_COUNT: usize = 6;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful gift consultant that provides personalized gift suggestions in JSON format.";

const CATEGORY_HINT: &str = "Category (e.g., Technology, Kitchen & Cooking, Books & Reading, \
Health & Fitness, Arts & Crafts, Office & Professional, Experiences, Personalized)";

// =============================================================================
// Errors
// =============================================================================

/// Why a generation attempt produced no new batch.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Non-2xx from the proxy without a usable error message.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// Error message relayed by the proxy.
    #[error("{0}")]
    Upstream(String),

    /// The proxy could not be reached at all.
    #[error("Failed to reach suggestion service: {0}")]
    Transport(String),

    #[error("No response from AI model")]
    EmptyCompletion,

    #[error("Invalid response format from AI")]
    InvalidFormat,

    #[error("No suggestions received from AI")]
    NoSuggestions,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body POSTed to the generation proxy.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

// =============================================================================
// Request Builder
// =============================================================================

/// User instruction for one generation.
///
/// Interests are listed with their rank; `avoid` names are listed verbatim
/// as a hard constraint.
pub fn build_gift_prompt(profile: &RecipientProfile, avoid: &[String], is_regenerate: bool) -> String {
    let mut prompt = String::new();

    if is_regenerate {
        let _ = writeln!(
            prompt,
            "Generate {SUGGESTION_COUNT} NEW and DIFFERENT personalized gift suggestions for the \
             following person (avoid repeating previous suggestions):"
        );
    } else {
        let _ = writeln!(
            prompt,
            "Generate {SUGGESTION_COUNT} personalized gift suggestions for the following person:"
        );
    }

    let ranked_interests = profile
        .interests
        .iter()
        .enumerate()
        .map(|(i, interest)| format!("{interest} (priority {})", i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    prompt.push('\n');
    let _ = writeln!(prompt, "Recipient: {}", profile.name);
    let _ = writeln!(prompt, "Relationship: {}", profile.relationship);
    let _ = writeln!(prompt, "Age Range: {}", profile.age);
    let _ = writeln!(
        prompt,
        "Interests (ordered by importance, most important first): {ranked_interests}"
    );
    let _ = writeln!(prompt, "Budget: {}", profile.budget);
    let _ = writeln!(prompt, "Occasion: {}", profile.occasion);
    if !profile.additional_info.trim().is_empty() {
        let _ = writeln!(prompt, "Additional Information: {}", profile.additional_info.trim());
    }

    if !avoid.is_empty() {
        prompt.push_str(
            "\nIMPORTANT: Please avoid these gifts that have already been saved for this person:\n",
        );
        for name in avoid {
            let _ = writeln!(prompt, "- {name}");
        }
        prompt.push_str(
            "\nMake sure your new suggestions are completely different from these saved gifts.\n",
        );
    }

    let _ = write!(
        prompt,
        "\nPlease provide {SUGGESTION_COUNT} {}gift suggestions in the following JSON format:\n",
        if is_regenerate { "NEW " } else { "" }
    );
    prompt.push_str(&format!(
        r#"{{
  "suggestions": [
    {{
      "id": 1,
      "name": "Gift Name",
      "description": "Brief description of the gift",
      "price": "Price range (e.g., $50-100)",
      "category": "{CATEGORY_HINT}",
      "reason": "Why this gift is perfect for this person"
    }}
  ]
}}
"#
    ));

    let mut rules = vec![
        "Within the specified budget range",
        "Relevant to their interests and age",
        "Appropriate for the relationship and occasion",
        "Practical and thoughtful",
        "Include a mix of different categories",
    ];
    if is_regenerate {
        rules.push("DIFFERENT from previous suggestions and saved gifts");
    }
    if !avoid.is_empty() {
        rules.push("NOT in the list of already saved gifts provided above");
    }

    prompt.push_str("\nMake sure the suggestions are:\n");
    for (i, rule) in rules.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {rule}", i + 1);
    }

    prompt.push_str("\nRespond only with valid JSON, no additional text.");
    prompt
}

/// Full request body for a generation or regeneration.
pub fn build_request(
    profile: &RecipientProfile,
    avoid: &[String],
    is_regenerate: bool,
    config: &GenerationConfig,
) -> ChatRequest {
    let temperature = if is_regenerate {
        config.regenerate_temperature
    } else {
        config.default_temperature
    };

    ChatRequest {
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_gift_prompt(profile, avoid, is_regenerate)),
        ],
        temperature,
        max_tokens: config.max_tokens,
    }
}

// =============================================================================
// Response Parser
// =============================================================================

/// Validate a chat-completion body into a suggestion batch.
///
/// Only `choices[0].message.content` is read; it must hold strict JSON
/// with a non-empty `suggestions` array of well-formed entries.
pub fn parse_completion(body: &Value) -> Result<Vec<GiftSuggestion>, GenerationError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(GenerationError::EmptyCompletion)?;

    let parsed: Value =
        serde_json::from_str(content).map_err(|_| GenerationError::InvalidFormat)?;

    let entries = parsed
        .get("suggestions")
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())
        .ok_or(GenerationError::NoSuggestions)?;

    let suggestions = entries
        .iter()
        .map(parse_suggestion)
        .collect::<Option<Vec<_>>>()
        .ok_or(GenerationError::InvalidFormat)?;

    let mut ids = HashSet::new();
    if !suggestions.iter().all(|s| ids.insert(s.id)) {
        return Err(GenerationError::InvalidFormat);
    }

    Ok(suggestions)
}

fn parse_suggestion(entry: &Value) -> Option<GiftSuggestion> {
    let id = match entry.get("id")? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let id = u32::try_from(id).ok().filter(|id| *id > 0)?;

    let name = text_field(entry, "name");
    if name.is_empty() {
        return None;
    }

    Some(GiftSuggestion {
        id,
        name,
        description: text_field(entry, "description"),
        price: text_field(entry, "price"),
        category: text_field(entry, "category"),
        reason: text_field(entry, "reason"),
    })
}

/// String or number field as trimmed text; anything else reads empty.
fn text_field(entry: &Value, field: &str) -> String {
    match entry.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sam;
    use serde_json::json;

    fn completion(content: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    fn batch_json(count: u32) -> String {
        let suggestions: Vec<Value> = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("Gift {id}"),
                    "description": "desc",
                    "price": "$50-100",
                    "category": "Experiences",
                    "reason": "because"
                })
            })
            .collect();
        json!({ "suggestions": suggestions }).to_string()
    }

    #[test]
    fn prompt_ranks_interests_in_order() {
        let prompt = build_gift_prompt(&sam(), &[], false);
        assert!(prompt.contains("music (priority 1), travel (priority 2)"));
        assert!(prompt.contains("Recipient: Sam"));
        assert!(prompt.contains("Budget: medium"));
        assert!(!prompt.contains("Additional Information"));
        assert!(!prompt.contains("IMPORTANT"));
        assert!(prompt.ends_with("Respond only with valid JSON, no additional text."));
    }

    #[test]
    fn prompt_lists_avoided_gifts_verbatim() {
        let avoid = vec!["Vinyl Record Player".to_string(), "Travel Pillow".to_string()];
        let prompt = build_gift_prompt(&sam(), &avoid, false);
        assert!(prompt.contains("- Vinyl Record Player\n- Travel Pillow\n"));
        assert!(prompt.contains("6. NOT in the list of already saved gifts provided above"));
    }

    #[test]
    fn regenerate_prompt_demands_novelty() {
        let prompt = build_gift_prompt(&sam(), &["Mug".to_string()], true);
        assert!(prompt.starts_with("Generate 6 NEW and DIFFERENT"));
        assert!(prompt.contains("Please provide 6 NEW gift suggestions"));
        assert!(prompt.contains("6. DIFFERENT from previous suggestions and saved gifts"));
        assert!(prompt.contains("7. NOT in the list"));
    }

    #[test]
    fn additional_info_is_included_when_present() {
        let mut profile = sam();
        profile.additional_info = "Plays bass".to_string();
        assert!(build_gift_prompt(&profile, &[], false).contains("Additional Information: Plays bass"));
    }

    #[test]
    fn request_uses_temperature_for_mode() {
        let config = GenerationConfig::default();
        let first = build_request(&sam(), &[], false, &config);
        let again = build_request(&sam(), &[], true, &config);

        assert_eq!(first.temperature, config.default_temperature);
        assert_eq!(again.temperature, config.regenerate_temperature);
        assert_eq!(first.max_tokens, 1000);
        assert_eq!(first.messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(first.messages[1].role, Role::User);

        let wire = serde_json::to_value(&first).unwrap();
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["messages"][1]["role"], "user");
    }

    #[test]
    fn parses_full_batch() {
        let suggestions = parse_completion(&completion(&batch_json(6))).unwrap();
        assert_eq!(suggestions.len(), 6);
        assert_eq!(suggestions[2].id, 3);
        assert_eq!(suggestions[2].name, "Gift 3");
    }

    #[test]
    fn tolerates_loose_field_types() {
        let content = json!({
            "suggestions": [ { "id": "2", "name": " Kite ", "price": 45 } ]
        })
        .to_string();
        let suggestions = parse_completion(&completion(&content)).unwrap();
        assert_eq!(suggestions[0].id, 2);
        assert_eq!(suggestions[0].name, "Kite");
        assert_eq!(suggestions[0].price, "45");
        assert_eq!(suggestions[0].category, "");

        let content = json!({ "suggestions": [ { "id": 1.0, "name": "A" } ] }).to_string();
        assert_eq!(parse_completion(&completion(&content)).unwrap()[0].id, 1);

        let content = json!({ "suggestions": [ { "id": 1.5, "name": "A" } ] }).to_string();
        assert_eq!(
            parse_completion(&completion(&content)),
            Err(GenerationError::InvalidFormat)
        );
    }

    #[test]
    fn missing_content_is_empty_completion() {
        assert_eq!(
            parse_completion(&json!({ "choices": [] })),
            Err(GenerationError::EmptyCompletion)
        );
        assert_eq!(
            parse_completion(&completion("  ")),
            Err(GenerationError::EmptyCompletion)
        );
        assert_eq!(
            parse_completion(&json!({})),
            Err(GenerationError::EmptyCompletion)
        );
    }

    #[test]
    fn prose_is_invalid_format() {
        let err = parse_completion(&completion("Here are some ideas: ...")).unwrap_err();
        assert_eq!(err, GenerationError::InvalidFormat);
        assert_eq!(err.to_string(), "Invalid response format from AI");
    }

    #[test]
    fn missing_or_empty_suggestions_is_reported() {
        for content in [r#"{"suggestions": []}"#, r#"{"ideas": []}"#, r#"{"suggestions": "none"}"#] {
            let err = parse_completion(&completion(content)).unwrap_err();
            assert_eq!(err, GenerationError::NoSuggestions);
            assert_eq!(err.to_string(), "No suggestions received from AI");
        }
    }

    #[test]
    fn one_bad_entry_rejects_the_batch() {
        let content = json!({
            "suggestions": [
                { "id": 1, "name": "Book" },
                { "id": 0, "name": "Zero" }
            ]
        })
        .to_string();
        assert_eq!(
            parse_completion(&completion(&content)),
            Err(GenerationError::InvalidFormat)
        );

        let duplicate = json!({
            "suggestions": [ { "id": 1, "name": "Book" }, { "id": 1, "name": "Pen" } ]
        })
        .to_string();
        assert_eq!(
            parse_completion(&completion(&duplicate)),
            Err(GenerationError::InvalidFormat)
        );
    }

    #[test]
    fn error_messages_match_user_facing_text() {
        assert_eq!(
            GenerationError::Http { status: 502 }.to_string(),
            "HTTP error! status: 502"
        );
        assert_eq!(
            GenerationError::Upstream("OpenRouter API error: overloaded".to_string()).to_string(),
            "OpenRouter API error: overloaded"
        );
        assert_eq!(
            GenerationError::EmptyCompletion.to_string(),
            "No response from AI model"
        );
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Generation Session
//!
//! Holds the active recipient and suggestion batch and drives generation
//! against a [`SuggestionProvider`].
//!
//! ## Phases
//!
//! ```text
//! Idle ──generate──▶ Generating ──ok──▶ Ready ──regenerate──▶ Generating
//!   ▲                    │ err                                    │
//!   └──── reset ─────────┴──▶ previous phase, error set ◀─────────┘
//! ```
//!
//! A failed call never replaces the batch on screen. The async operations
//! take `&mut self`, so at most one call can be in flight per session.
//!
//! The session also owns the saved-gift and recipient registries: the
//! avoid-list for a prompt comes from the saved gifts of the current
//! recipient, and every successful generation upserts the recipient.

use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::models::{GiftData, GiftSuggestion, RecipientProfile, SavedGift};
use crate::prompt::{build_request, parse_completion, GenerationError};
use crate::providers::SuggestionProvider;
use crate::storage::{
    PersistedStore, RecipientRegistry, SavedGiftRegistry, SessionRepository, StoragePaths,
};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No recipient yet.
    Idle,
    /// A provider call is in flight.
    Generating,
    /// Suggestions are available.
    Ready,
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub data: Option<GiftData>,
    pub is_generating: bool,
    pub error: Option<String>,
}

pub struct GenerationSession {
    provider: Arc<dyn SuggestionProvider>,
    config: GenerationConfig,
    repository: SessionRepository,
    saved_gifts: SavedGiftRegistry,
    recipients: RecipientRegistry,
    state: SessionState,
}

impl GenerationSession {
    /// Restore the last session and both registries from `store`.
    pub fn load(
        store: PersistedStore,
        provider: Arc<dyn SuggestionProvider>,
        config: GenerationConfig,
    ) -> Self {
        let repository = SessionRepository::new(store.clone());
        let state = SessionState {
            data: repository.load(),
            ..SessionState::default()
        };

        Self {
            provider,
            config,
            repository,
            saved_gifts: SavedGiftRegistry::load(store.clone()),
            recipients: RecipientRegistry::load(store),
            state,
        }
    }

    /// Open the session on the redb database under `paths`.
    ///
    /// Runs without persistence when the database cannot be opened.
    pub fn open(
        paths: &StoragePaths,
        provider: Arc<dyn SuggestionProvider>,
        config: GenerationConfig,
    ) -> Self {
        Self::load(PersistedStore::open(paths), provider, config)
    }

    /// [`GenerationSession::open`] on the data directory from `DATA_DIR`.
    pub fn open_default(provider: Arc<dyn SuggestionProvider>, config: GenerationConfig) -> Self {
        Self::open(&StoragePaths::from_env(), provider, config)
    }

    // ========== Accessors ==========

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        if self.state.is_generating {
            SessionPhase::Generating
        } else if self.state.data.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Idle
        }
    }

    pub fn recipient(&self) -> Option<&RecipientProfile> {
        self.state.data.as_ref().map(|d| &d.recipient)
    }

    pub fn suggestions(&self) -> &[GiftSuggestion] {
        self.state
            .data
            .as_ref()
            .map(|d| d.suggestions.as_slice())
            .unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn saved_gifts(&self) -> &SavedGiftRegistry {
        &self.saved_gifts
    }

    pub fn recipients(&self) -> &RecipientRegistry {
        &self.recipients
    }

    // ========== Generation ==========

    /// Generate a fresh batch for `profile`.
    ///
    /// On success the recipient and batch are replaced and the recipient
    /// registry is upserted. On failure only `error` changes.
    pub async fn generate(&mut self, profile: RecipientProfile) {
        let profile = profile.normalized();
        self.begin();

        let avoid = self.saved_gifts.names_for_recipient(&profile.name);
        let request = build_request(&profile, &avoid, false, &self.config);

        match self.request_batch(&request).await {
            Ok(suggestions) => {
                tracing::info!(
                    recipient = %profile.name,
                    suggestions = suggestions.len(),
                    avoided = avoid.len(),
                    "Generated gift suggestions"
                );
                self.recipients.upsert(profile.clone());
                self.state.data = Some(GiftData {
                    recipient: profile,
                    suggestions,
                });
            }
            Err(e) => self.fail("Error generating gifts", e),
        }

        self.finish();
    }

    /// Replace the batch for the current recipient with new suggestions.
    ///
    /// Does nothing when there is no recipient.
    pub async fn regenerate(&mut self) {
        let Some(recipient) = self.recipient().cloned() else {
            return;
        };
        self.begin();

        let avoid = self.saved_gifts.names_for_recipient(&recipient.name);
        let request = build_request(&recipient, &avoid, true, &self.config);

        match self.request_batch(&request).await {
            Ok(suggestions) => {
                tracing::info!(
                    recipient = %recipient.name,
                    suggestions = suggestions.len(),
                    avoided = avoid.len(),
                    "Regenerated gift suggestions"
                );
                if let Some(data) = self.state.data.as_mut() {
                    data.suggestions = suggestions;
                }
            }
            Err(e) => self.fail("Error regenerating gifts", e),
        }

        self.finish();
    }

    /// Drop the recipient, batch and error, and forget the stored session.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.repository.clear();
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    // ========== Saved Gifts & Recipients ==========

    /// Save the suggestion with this batch-local id for the current recipient.
    ///
    /// Returns `None` when there is no such suggestion or it is already saved.
    pub fn save_suggestion(&mut self, suggestion_id: u32) -> Option<&SavedGift> {
        let data = self.state.data.as_ref()?;
        let suggestion = data.suggestions.iter().find(|s| s.id == suggestion_id)?;
        self.saved_gifts.save(
            suggestion,
            &data.recipient.name,
            Some(data.recipient.budget),
        )
    }

    pub fn is_suggestion_saved(&self, suggestion_id: u32) -> bool {
        self.saved_gifts.is_saved(suggestion_id)
    }

    pub fn remove_saved_gift(&mut self, id: &str) -> bool {
        self.saved_gifts.remove(id)
    }

    /// Forget a recipient profile; gifts saved for that name are kept.
    pub fn remove_recipient(&mut self, id: &str) -> bool {
        self.recipients.remove(id)
    }

    // ========== Internals ==========

    async fn request_batch(
        &self,
        request: &crate::prompt::ChatRequest,
    ) -> Result<Vec<GiftSuggestion>, GenerationError> {
        let body = self.provider.complete(request).await?;
        parse_completion(&body)
    }

    fn begin(&mut self) {
        self.state.is_generating = true;
        self.state.error = None;
    }

    fn fail(&mut self, context: &str, error: GenerationError) {
        tracing::warn!(error = %error, "{context}");
        self.state.error = Some(error.to_string());
    }

    fn finish(&mut self) {
        self.state.is_generating = false;
        self.repository.save(self.state.data.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sam;
    use crate::prompt::ChatRequest;
    use crate::storage::{MemoryBackend, StorageKey};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider replaying canned results and recording requests.
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<Value, GenerationError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn push(&self, reply: Result<Value, GenerationError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SuggestionProvider for ScriptedProvider {
        async fn complete(&self, request: &ChatRequest) -> Result<Value, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::Http { status: 500 }))
        }
    }

    fn batch(prefix: &str) -> Value {
        let suggestions: Vec<Value> = (1..=6)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("{prefix} {id}"),
                    "description": "desc",
                    "price": "$300",
                    "category": "Experiences",
                    "reason": "because"
                })
            })
            .collect();
        let content = json!({ "suggestions": suggestions }).to_string();
        json!({ "choices": [ { "message": { "content": content } } ] })
    }

    fn session_with(
        backend: Arc<MemoryBackend>,
    ) -> (GenerationSession, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::default());
        let session = GenerationSession::load(
            PersistedStore::new(backend),
            provider.clone(),
            GenerationConfig::default(),
        );
        (session, provider)
    }

    #[tokio::test]
    async fn full_generation_scenario() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut session, provider) = session_with(backend.clone());
        assert_eq!(session.phase(), SessionPhase::Idle);

        provider.push(Ok(batch("First")));
        session.generate(sam()).await;

        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.suggestions().len(), 6);
        assert_eq!(session.recipients().len(), 1);
        assert_eq!(
            session.recipients().all()[0].profile.signature(),
            sam().signature()
        );
        assert!(session.error().is_none());

        let saved = session.save_suggestion(3).cloned().unwrap();
        assert!(saved.id.starts_with("3-"));
        assert_eq!(saved.price, "$50-150");
        assert_eq!(session.saved_gifts().len(), 1);
        assert!(session.save_suggestion(3).is_none());

        provider.push(Ok(batch("Second")));
        session.regenerate().await;

        assert_eq!(session.suggestions().len(), 6);
        assert_eq!(session.suggestions()[0].name, "Second 1");
        assert_eq!(session.recipient(), Some(&sam()));
        assert!(session.is_suggestion_saved(3));

        let requests = provider.requests();
        assert_eq!(requests[1].temperature, 0.9);
        assert!(requests[1].messages[1].content.contains("- First 3"));
        assert!(requests[1].messages[1].content.contains("NEW and DIFFERENT"));

        assert!(session.remove_saved_gift(&saved.id));
        assert!(!session.is_suggestion_saved(3));
        assert!(backend.raw(StorageKey::CurrentGiftData).is_some());
    }

    #[tokio::test]
    async fn generate_injects_avoid_list_for_recipient() {
        let (mut session, provider) = session_with(Arc::new(MemoryBackend::new()));
        provider.push(Ok(batch("First")));
        session.generate(sam()).await;
        session.save_suggestion(2);

        provider.push(Ok(batch("Again")));
        session.generate(sam()).await;

        let requests = provider.requests();
        assert_eq!(requests[0].temperature, 0.7);
        assert!(!requests[0].messages[1].content.contains("IMPORTANT"));
        assert!(requests[1].messages[1].content.contains("- First 2"));
        assert_eq!(session.recipients().len(), 1);
    }

    #[tokio::test]
    async fn failed_regenerate_keeps_previous_batch() {
        let (mut session, provider) = session_with(Arc::new(MemoryBackend::new()));
        provider.push(Ok(batch("First")));
        session.generate(sam()).await;
        let before = session.suggestions().to_vec();

        provider.push(Ok(json!({ "choices": [ { "message": { "content": "sorry" } } ] })));
        session.regenerate().await;

        assert_eq!(session.suggestions(), before.as_slice());
        assert_eq!(session.error(), Some("Invalid response format from AI"));
        assert!(!session.state().is_generating);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn failed_first_generate_stays_idle() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut session, provider) = session_with(backend.clone());
        provider.push(Err(GenerationError::Upstream(
            "OpenRouter API key is not configured".to_string(),
        )));
        session.generate(sam()).await;

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.error(), Some("OpenRouter API key is not configured"));
        assert!(session.recipients().is_empty());
        assert!(backend.raw(StorageKey::CurrentGiftData).is_none());

        session.clear_error();
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn failed_generate_for_new_recipient_keeps_current_one() {
        let (mut session, provider) = session_with(Arc::new(MemoryBackend::new()));
        provider.push(Ok(batch("First")));
        session.generate(sam()).await;
        let before = session.suggestions().to_vec();

        let mut alex = sam();
        alex.name = "Alex".to_string();
        provider.push(Err(GenerationError::Http { status: 502 }));
        session.generate(alex).await;

        assert_eq!(session.error(), Some("HTTP error! status: 502"));
        assert_eq!(session.recipient(), Some(&sam()));
        assert_eq!(session.suggestions(), before.as_slice());
        assert_eq!(session.recipients().len(), 1);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn opened_session_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path().join("data"));

        {
            let provider = Arc::new(ScriptedProvider::default());
            let mut session =
                GenerationSession::open(&paths, provider.clone(), GenerationConfig::default());
            provider.push(Ok(batch("First")));
            session.generate(sam()).await;
            session.save_suggestion(2);
        }

        let reopened = GenerationSession::open(
            &paths,
            Arc::new(ScriptedProvider::default()),
            GenerationConfig::default(),
        );
        assert!(paths.database().exists());
        assert_eq!(reopened.recipient(), Some(&sam()));
        assert_eq!(reopened.suggestions().len(), 6);
        assert!(reopened.is_suggestion_saved(2));
        assert_eq!(reopened.recipients().len(), 1);
    }

    #[tokio::test]
    async fn regenerate_without_recipient_is_a_no_op() {
        let (mut session, provider) = session_with(Arc::new(MemoryBackend::new()));
        session.regenerate().await;
        assert!(provider.requests().is_empty());
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn session_survives_reload_and_reset_clears_it() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut session, provider) = session_with(backend.clone());
        provider.push(Ok(batch("First")));
        session.generate(sam()).await;
        session.save_suggestion(1);

        let (mut restored, _) = session_with(backend.clone());
        assert_eq!(restored.suggestions(), session.suggestions());
        assert_eq!(restored.recipient(), Some(&sam()));
        assert!(restored.is_suggestion_saved(1));
        assert_eq!(restored.recipients().len(), 1);

        restored.reset();
        assert_eq!(restored.phase(), SessionPhase::Idle);
        assert!(restored.suggestions().is_empty());
        assert!(backend.raw(StorageKey::CurrentGiftData).is_none());
        assert_eq!(restored.saved_gifts().len(), 1);
    }

    #[tokio::test]
    async fn removing_recipient_keeps_saved_gifts() {
        let (mut session, provider) = session_with(Arc::new(MemoryBackend::new()));
        provider.push(Ok(batch("First")));
        session.generate(sam()).await;
        session.save_suggestion(4);

        let id = session.recipients().all()[0].id.clone();
        assert!(session.remove_recipient(&id));
        assert!(session.recipients().is_empty());
        assert_eq!(session.saved_gifts().names_for_recipient("Sam"), vec!["First 4"]);
    }

    #[tokio::test]
    async fn detached_store_still_generates() {
        let provider = Arc::new(ScriptedProvider::default());
        let mut session = GenerationSession::load(
            PersistedStore::detached(),
            provider.clone(),
            GenerationConfig::default(),
        );
        provider.push(Ok(batch("First")));
        session.generate(sam()).await;
        assert_eq!(session.suggestions().len(), 6);
        assert!(session.save_suggestion(5).is_some());
    }
}

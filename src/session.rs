use log::{ debug, error, info, warn };
use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use tokio::sync::{ watch, Mutex };

use crate::config::settings::SettingsService;
use crate::llm::ProviderId;
use crate::llm::chat::ProviderRegistry;
use crate::llm::error::ProviderError;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::store::{ self, KeyValueStore, StoreError, CONVERSATION_KEY };

pub const STATUS_READY: &str = "Ready";
pub const STATUS_RESPONSE_RECEIVED: &str = "Response received";
pub const STATUS_ERROR: &str = "Error occurred";
pub const API_KEY_MISSING: &str = "API key missing";
pub const WELCOME_MESSAGE: &str =
    "Welcome to the Multi-AI Interface! Try asking a question or saying hello!";
pub const CLEARED_MESSAGE: &str = "Conversation cleared. How can I help you today?";

#[derive(Default)]
struct SessionState {
    conversation: Conversation,
    draft: String,
}

/// Releases the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns one transcript and runs the send/reply/persist cycle for it.
///
/// At most one operation that mutates the transcript runs at a time. A send
/// that arrives while another is awaiting its provider is dropped, not queued.
/// The state lock is never held across the provider call, so readers see the
/// user message while the reply is pending.
pub struct ChatSession {
    registry: ProviderRegistry,
    settings: Arc<SettingsService>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
    busy: AtomicBool,
    status: watch::Sender<String>,
}

impl ChatSession {
    pub fn new(
        registry: ProviderRegistry,
        settings: Arc<SettingsService>,
        store: Arc<dyn KeyValueStore>
    ) -> Self {
        let (status, _) = watch::channel(STATUS_READY.to_string());
        Self {
            registry,
            settings,
            store,
            state: Mutex::new(SessionState::default()),
            busy: AtomicBool::new(false),
            status,
        }
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        debug!("Status: {}", status);
        self.status.send_replace(status);
    }

    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> &Arc<SettingsService> {
        &self.settings
    }

    pub async fn conversation(&self) -> Conversation {
        self.state.lock().await.conversation.clone()
    }

    pub async fn set_draft(&self, text: &str) {
        self.state.lock().await.draft = text.to_string();
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft.clone()
    }

    pub async fn submit_draft(&self) -> Result<Option<ChatMessage>, StoreError> {
        let draft = self.draft().await;
        self.submit(&draft).await
    }

    /// Reads the persisted transcript, seeding and saving a welcome message
    /// when there is none. While a send is pending the in-memory transcript
    /// is returned untouched.
    pub async fn load_history(&self) -> Result<Conversation, StoreError> {
        let Some(_guard) = self.try_acquire() else {
            return Ok(self.conversation().await);
        };

        let stored = match store::load::<Conversation>(self.store.as_ref(), CONVERSATION_KEY).await {
            Err(StoreError::Json(e)) => {
                warn!("Stored conversation is unreadable, starting fresh: {}", e);
                None
            }
            other => other?,
        };
        let conversation = match stored {
            Some(conversation) if !conversation.is_empty() => {
                info!("Loaded {} messages from history", conversation.len());
                conversation
            }
            _ => {
                let seeded = Conversation::seeded(ChatMessage::assistant(WELCOME_MESSAGE, None));
                store::save(self.store.as_ref(), CONVERSATION_KEY, &seeded).await?;
                info!("No history found, seeded welcome message");
                seeded
            }
        };

        self.state.lock().await.conversation = conversation.clone();
        Ok(conversation)
    }

    /// Replaces the transcript with a single assistant line and persists it.
    /// Returns `false` without touching anything while a send is pending.
    pub async fn clear(&self) -> Result<bool, StoreError> {
        let Some(_guard) = self.try_acquire() else {
            debug!("Clear ignored, a request is in flight");
            return Ok(false);
        };

        let cleared = Conversation::seeded(ChatMessage::assistant(CLEARED_MESSAGE, None));
        self.state.lock().await.conversation = cleared.clone();
        self.set_status(STATUS_READY);
        self.persist(&cleared).await?;
        Ok(true)
    }

    /// Sends `text` to the selected provider and appends exactly one terminal
    /// message for it.
    ///
    /// Blank input and input arriving while another send is pending are
    /// silent no-ops (`Ok(None)`). Provider failures never surface as `Err`;
    /// they become a system message. `Err` only reports that the transcript
    /// could not be persisted, in which case the in-memory copy is still
    /// updated.
    pub async fn submit(&self, text: &str) -> Result<Option<ChatMessage>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let Some(_guard) = self.try_acquire() else {
            debug!("Submit ignored, a request is in flight");
            return Ok(None);
        };

        let settings = self.settings.settings().await;
        let provider = settings.provider;
        let model = settings.effective_model();

        {
            let mut state = self.state.lock().await;
            state.conversation.push(ChatMessage::user(text));
            state.draft.clear();
        }
        self.set_status(format!("Sending message to {}...", provider.display_name()));

        let terminal = match self.dispatch(provider, text, &model).await {
            Ok(reply) => {
                self.set_status(STATUS_RESPONSE_RECEIVED);
                ChatMessage::assistant(reply, Some(model))
            }
            Err(ProviderError::MissingCredential { provider }) => {
                warn!("No API key configured for {}", provider);
                self.set_status(format!("Error: API key missing for {}", provider.display_name()));
                ChatMessage::system(API_KEY_MISSING)
            }
            Err(e) => {
                warn!("{} request failed: {}", provider, e);
                self.set_status(STATUS_ERROR);
                ChatMessage::system(format!("Error: {}", e))
            }
        };

        let snapshot = {
            let mut state = self.state.lock().await;
            state.conversation.push(terminal.clone());
            state.conversation.clone()
        };
        self.persist(&snapshot).await?;

        Ok(Some(terminal))
    }

    async fn dispatch(
        &self,
        provider: ProviderId,
        text: &str,
        model: &str
    ) -> Result<String, ProviderError> {
        let client = self.registry.get(provider).ok_or_else(|| ProviderError::Transport {
            status: 0,
            body: format!("No adapter registered for {}", provider),
        })?;

        let api_key = match self.settings.api_key(provider).await {
            Some(key) => key,
            None if !client.requires_credential() => String::new(),
            None => {
                return Err(ProviderError::MissingCredential { provider });
            }
        };

        info!("Sending message to {} (model {})", client.display_name(), model);
        client.send(text, &api_key, model).await
    }

    async fn persist(&self, conversation: &Conversation) -> Result<(), StoreError> {
        store::save(self.store.as_ref(), CONVERSATION_KEY, conversation).await.map_err(|e| {
            error!("Failed to persist conversation ({} messages): {}", conversation.len(), e);
            e
        })
    }
}

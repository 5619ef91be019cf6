//! Chat state controller.
//!
//! Holds the ordered message log plus the typing, error and connected flags
//! in a `watch` channel. Dispatcher events mutate the state; the
//! presentation layer reads [`ChatController::snapshot`] or awaits changes on
//! [`ChatController::subscribe`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use wisebot_core::errors::FailureKind;
use wisebot_core::ids::SessionIdentity;
use wisebot_core::messages::Message;
use wisebot_settings::types::ChatSettings;

use super::validation::{collapse_whitespace, validate_message};
use crate::connection::{ConnectionClient, Connector, WsConnector};
use crate::dispatcher::Listener;
use crate::errors::ChatError;
use crate::events::{ClientEvent, EventCategory};

const CATEGORIES: [EventCategory; 5] = [
    EventCategory::ConnectionStatus,
    EventCategory::AssistantReply,
    EventCategory::Typing,
    EventCategory::System,
    EventCategory::Error,
];

/// Controller tunables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatConfig {
    /// Maximum trimmed message length, in characters.
    pub max_message_chars: usize,
    /// System notices containing any of these phrases are dropped.
    pub greeting_filters: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::from_settings(&ChatSettings::default())
    }
}

impl ChatConfig {
    /// Build from the `chat` settings section.
    pub fn from_settings(settings: &ChatSettings) -> Self {
        Self {
            max_message_chars: settings.max_message_chars,
            greeting_filters: settings.greeting_filters.clone(),
        }
    }

    fn is_filtered(&self, notice: &str) -> bool {
        notice.is_empty()
            || self
                .greeting_filters
                .iter()
                .any(|phrase| notice.contains(phrase.as_str()))
    }
}

/// Observable chat state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatSnapshot {
    /// Ordered message log.
    pub messages: Vec<Message>,
    /// Whether the assistant is composing.
    pub typing: bool,
    /// Error to show, if any.
    pub error: Option<String>,
    /// Whether the transport is open.
    pub connected: bool,
}

/// Fold one dispatcher event into the snapshot.
fn apply_event(state: &watch::Sender<ChatSnapshot>, config: &ChatConfig, event: &ClientEvent) {
    match event {
        ClientEvent::AssistantReply { text, .. } => state.send_modify(|s| {
            s.messages.push(Message::assistant(text.as_str()));
            s.typing = false;
        }),
        ClientEvent::Typing { active } => state.send_modify(|s| s.typing = *active),
        ClientEvent::System { text } => {
            if config.is_filtered(text) {
                debug!(notice = %text, "filtered system notice");
            } else {
                state.send_modify(|s| s.messages.push(Message::system(text.as_str())));
            }
        }
        ClientEvent::Error { text } => state.send_modify(|s| s.error = Some(text.clone())),
        ClientEvent::ConnectionStatus { connected } => state.send_modify(|s| {
            s.connected = *connected;
            if *connected {
                s.error = None;
            }
        }),
    }
}

/// Binds one identity's conversation to a connection client.
pub struct ChatController<C: Connector = WsConnector> {
    client: ConnectionClient<C>,
    identity: SessionIdentity,
    config: ChatConfig,
    state: Arc<watch::Sender<ChatSnapshot>>,
    listener: Mutex<Option<Listener>>,
}

impl<C: Connector> ChatController<C> {
    /// Controller for `identity` over `client`. Nothing is subscribed or
    /// connected until [`start`](Self::start).
    pub fn new(client: ConnectionClient<C>, identity: SessionIdentity, config: ChatConfig) -> Self {
        let (state, _) = watch::channel(ChatSnapshot::default());
        Self {
            client,
            identity,
            config,
            state: Arc::new(state),
            listener: Mutex::new(None),
        }
    }

    /// Underlying connection client.
    pub fn client(&self) -> &ConnectionClient<C> {
        &self.client
    }

    /// Identity this conversation is scoped to.
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Subscribe to dispatcher events and connect.
    ///
    /// A connect failure is recorded as the current error and returned;
    /// background reconnects may still succeed later.
    pub async fn start(&self) -> Result<(), ChatError> {
        self.attach();
        match self.client.connect(&self.identity).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.error = None;
                    s.connected = true;
                });
                info!(identity = %self.identity, "chat started");
                Ok(())
            }
            Err(e) => {
                warn!(identity = %self.identity, kind = %e.kind(), error = %e, "chat connect failed");
                let text = e.to_string();
                self.state.send_modify(|s| s.error = Some(text));
                Err(e.into())
            }
        }
    }

    /// Unsubscribe and disconnect. The message log is kept.
    pub fn stop(&self) {
        self.detach();
        self.client.disconnect();
        self.state.send_modify(|s| {
            s.connected = false;
            s.typing = false;
        });
    }

    /// Validate and send `text`.
    ///
    /// Validation failures leave the log and transport untouched. The user
    /// message is appended before forwarding and never duplicated.
    pub fn send(&self, text: &str) -> Result<(), ChatError> {
        let text = match validate_message(text, self.config.max_message_chars) {
            Ok(trimmed) => collapse_whitespace(trimmed),
            Err(e) => {
                debug!(kind = %FailureKind::ValidationFailure, error = %e, "message rejected");
                return Err(e.into());
            }
        };

        if !self.client.is_connected() {
            let err = ChatError::NotConnected;
            self.state.send_modify(|s| s.error = Some(err.to_string()));
            return Err(err);
        }

        self.state
            .send_modify(|s| s.messages.push(Message::user(text.as_str())));

        if self.client.send(&text) {
            self.state.send_modify(|s| {
                s.typing = true;
                s.error = None;
            });
            Ok(())
        } else {
            let err = ChatError::SendFailed;
            self.state.send_modify(|s| s.error = Some(err.to_string()));
            Err(err)
        }
    }

    /// Empty the message log. The connection is untouched.
    pub fn clear(&self) {
        self.state.send_modify(|s| s.messages.clear());
    }

    /// Dismiss the current error.
    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Current state.
    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.state.subscribe()
    }

    /// Register the state listener. A registration dropped by
    /// [`ConnectionClient::disconnect`] is restored.
    fn attach(&self) {
        let mut slot = self.listener.lock();
        let dispatcher = self.client.dispatcher();
        if let Some(listener) = slot.as_ref() {
            if CATEGORIES
                .iter()
                .all(|&category| dispatcher.is_registered(category, listener))
            {
                return;
            }
            for category in CATEGORIES {
                let _ = dispatcher.off(category, listener);
            }
            debug!(identity = %self.identity, "re-registering chat listener");
        }
        let listener = slot.get_or_insert_with(|| self.state_listener());
        for category in CATEGORIES {
            dispatcher.on(category, Arc::clone(listener));
        }
    }

    fn state_listener(&self) -> Listener {
        let state = Arc::clone(&self.state);
        let config = self.config.clone();
        Arc::new(move |event: &ClientEvent| apply_event(&state, &config, event))
    }

    fn detach(&self) {
        let Some(listener) = self.listener.lock().take() else {
            return;
        };
        let dispatcher = self.client.dispatcher();
        for category in CATEGORIES {
            let _ = dispatcher.off(category, &listener);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Events published through the [`Dispatcher`](crate::dispatcher::Dispatcher).

use wisebot_core::frames::InboundEvent;

/// Dispatcher category; every [`ClientEvent`] belongs to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Transport opened or closed.
    ConnectionStatus,
    /// Assistant answer arrived.
    AssistantReply,
    /// Typing indicator changed.
    Typing,
    /// Server notice.
    System,
    /// Server-reported or client-raised error.
    Error,
}

/// Event delivered to dispatcher listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// Transport status changed.
    ConnectionStatus {
        /// Whether the transport is now open.
        connected: bool,
    },
    /// Assistant answer.
    AssistantReply {
        /// Answer text.
        text: String,
        /// Retrieval confidence.
        confidence: Option<f64>,
        /// Knowledge chunks used.
        context_count: Option<u32>,
    },
    /// Typing indicator.
    Typing {
        /// Whether the assistant is composing.
        active: bool,
    },
    /// Server notice.
    System {
        /// Notice text.
        text: String,
    },
    /// Error text for the UI.
    Error {
        /// Error text.
        text: String,
    },
}

impl ClientEvent {
    /// Category this event is dispatched under.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::ConnectionStatus { .. } => EventCategory::ConnectionStatus,
            Self::AssistantReply { .. } => EventCategory::AssistantReply,
            Self::Typing { .. } => EventCategory::Typing,
            Self::System { .. } => EventCategory::System,
            Self::Error { .. } => EventCategory::Error,
        }
    }
}

impl From<InboundEvent> for ClientEvent {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::AssistantReply {
                text,
                confidence,
                context_count,
            } => Self::AssistantReply {
                text,
                confidence,
                context_count,
            },
            InboundEvent::TypingSignal { active } => Self::Typing { active },
            InboundEvent::SystemNotice { text } => Self::System { text },
            InboundEvent::TransportError { text } => Self::Error { text },
        }
    }
}

//! # wisebot-client
//!
//! Realtime chat client for the WiseBot assistant.
//!
//! - [`dispatcher`]: category-keyed publish/subscribe hub
//! - [`identity`]: per-installation session identity
//! - [`connection`]: lifecycle machine, transport seam and the reconnecting
//!   [`ConnectionClient`]
//! - [`chat`]: the [`ChatController`] that owns the message log
//!
//! ```no_run
//! use wisebot_client::{ChatConfig, ChatController, ConnectionClient};
//! use wisebot_client::identity::{FileIdentityStore, IdentityProvider};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let settings = wisebot_settings::get_settings();
//! let provider = IdentityProvider::new(FileIdentityStore::new(
//!     wisebot_settings::identity_path(&settings),
//! ));
//! let client = ConnectionClient::from_settings(&settings);
//! let chat = ChatController::new(
//!     client,
//!     provider.get_or_create_identity()?,
//!     ChatConfig::from_settings(&settings.chat),
//! );
//! chat.start().await?;
//! chat.send("What documents do you know about?")?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod chat;
pub mod connection;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod identity;

#[cfg(test)]
mod testutil;

pub use chat::{ChatConfig, ChatController, ChatSnapshot};
pub use connection::{ConnectionClient, ConnectionConfig, ConnectionState};
pub use dispatcher::{Dispatcher, Listener};
pub use errors::{ChatError, ClientError, IdentityError, TransportError, ValidationError};
pub use events::{ClientEvent, EventCategory};

//! # wisebot-core
//!
//! Foundation types shared by every WiseBot crate.
//!
//! - **Branded IDs**: [`ids::MessageId`] and [`ids::SessionIdentity`] as newtypes
//! - **Messages**: [`messages::Message`] entries of the chat log, tagged by [`messages::Origin`]
//! - **Frames**: [`frames::OutboundFrame`] / [`frames::InboundFrame`] wire shapes and
//!   the classified [`frames::InboundEvent`]
//! - **Failures**: [`errors::FailureKind`] taxonomy used in logs and error types
//! - **Reconnect policy**: [`retry::ReconnectPolicy`] (fixed-delay, bounded)
//! - **Logging**: [`logging::init_subscriber`] and the log-capture test helpers
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other wisebot crates.

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod frames;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod retry;

//! Chat state controller: the message log and UI flags, fed by dispatcher
//! events and driving the connection client.

pub mod controller;
pub mod validation;

pub use controller::{ChatConfig, ChatController, ChatSnapshot};

//! Realtime connection: lifecycle machine, transport seam and the
//! reconnecting client built on them.

pub mod client;
pub mod lifecycle;
pub mod transport;

pub use client::{ConnectionClient, ConnectionConfig, GIVE_UP_TEXT};
pub use lifecycle::ConnectionState;
pub use transport::{Connector, WsConnector};

//! Package-level and protocol constants.

/// Current version of the WiseBot client (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "wisebot";

/// Close code sent on an intentional disconnect ("normal closure").
///
/// Any other close code is treated as an abnormal close and is eligible
/// for automatic reconnection.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when the peer closed without a status code.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when the transport dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close reason attached to an intentional disconnect.
pub const DISCONNECT_REASON: &str = "User disconnected";

/// Path prefix of the realtime chat endpoint (`<base>/ws/<identity>`).
pub const WS_PATH_PREFIX: &str = "/ws/";

/// Maximum length of a user message, in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 1000;

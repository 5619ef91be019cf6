//! Reconnecting connection client.
//!
//! Owns at most one transport at a time and drives it through the
//! [`Lifecycle`] machine. Inbound frames are classified and republished on
//! the [`Dispatcher`]; abnormal closes are retried at a fixed delay until the
//! policy's budget is spent.
//!
//! Every open attempt carries an epoch. `disconnect()` and identity changes
//! bump the epoch, so a late open result, reader close or retry timer from a
//! superseded attempt is recognized and discarded.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wisebot_core::constants::{DISCONNECT_REASON, NORMAL_CLOSURE, WS_PATH_PREFIX};
use wisebot_core::errors::FailureKind;
use wisebot_core::frames::{InboundFrame, OutboundFrame};
use wisebot_core::ids::SessionIdentity;
use wisebot_core::retry::ReconnectPolicy;
use wisebot_settings::WisebotSettings;

use super::lifecycle::{ConnectionState, Directive, Lifecycle, LifecycleEvent};
use super::transport::{CloseInfo, Connector, Outgoing, TransportEvent, WsConnector};
use crate::dispatcher::Dispatcher;
use crate::errors::{ClientError, TransportError};
use crate::events::ClientEvent;

/// Error text published when the retry budget is spent.
pub const GIVE_UP_TEXT: &str = "Failed to connect after maximum attempts";

/// Connection parameters.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Realtime base URL, e.g. `ws://localhost:8000`.
    pub base_url: String,
    /// Reconnect budget and delay.
    pub policy: ReconnectPolicy,
    /// Upper bound on one open attempt.
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from_settings(&WisebotSettings::default())
    }
}

impl ConnectionConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &WisebotSettings) -> Self {
        Self {
            base_url: settings.server.ws_url.clone(),
            policy: settings.connection.reconnect_policy(),
            connect_timeout: settings.connection.connect_timeout(),
        }
    }

    /// Endpoint for `identity`: `<base>/ws/<identity>`.
    pub fn endpoint(&self, identity: &SessionIdentity) -> String {
        format!(
            "{}{WS_PATH_PREFIX}{identity}",
            self.base_url.trim_end_matches('/')
        )
    }
}

struct Shared {
    lifecycle: Lifecycle,
    link: Option<mpsc::Sender<Outgoing>>,
    epoch: u64,
    identity: Option<SessionIdentity>,
    retry: Option<CancellationToken>,
}

struct Inner<C> {
    connector: C,
    config: ConnectionConfig,
    dispatcher: Arc<Dispatcher>,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<ConnectionState>,
}

/// Realtime connection client. Cheap to clone; clones share one connection.
pub struct ConnectionClient<C: Connector = WsConnector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ConnectionClient<WsConnector> {
    /// WebSocket client configured from settings.
    pub fn from_settings(settings: &WisebotSettings) -> Self {
        Self::new(
            WsConnector::new(settings.connection.channel_capacity),
            ConnectionConfig::from_settings(settings),
        )
    }
}

impl<C: Connector> ConnectionClient<C> {
    /// Client with its own dispatcher.
    pub fn new(connector: C, config: ConnectionConfig) -> Self {
        Self::with_dispatcher(connector, config, Arc::new(Dispatcher::new()))
    }

    /// Client publishing on a shared dispatcher.
    pub fn with_dispatcher(
        connector: C,
        config: ConnectionConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                connector,
                shared: Mutex::new(Shared {
                    lifecycle: Lifecycle::new(config.policy),
                    link: None,
                    epoch: 0,
                    identity: None,
                    retry: None,
                }),
                config,
                dispatcher,
                state_tx,
            }),
        }
    }

    /// Dispatcher events are published on.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().lifecycle.state()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Whether the transport is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Reconnect attempts made in the current chain.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.shared.lock().lifecycle.attempts()
    }

    /// Identity of the current or last connection.
    pub fn identity(&self) -> Option<SessionIdentity> {
        self.inner.shared.lock().identity.clone()
    }

    /// Connect as `identity`.
    ///
    /// Resolves immediately when already connected, and joins an in-flight
    /// attempt instead of opening a second transport. Connecting as a
    /// different identity first closes the current transport. A failed open
    /// is reported here while automatic retries continue in the background.
    pub async fn connect(&self, identity: &SessionIdentity) -> Result<(), ClientError> {
        let mut events = Vec::new();
        let (directive, epoch) = {
            let mut shared = self.inner.shared.lock();
            if shared.identity.as_ref() != Some(identity) {
                if shared.identity.is_some() {
                    if let Some(link) = self.inner.supersede(&mut shared) {
                        close_link(&link);
                        events.push(ClientEvent::ConnectionStatus { connected: false });
                    }
                }
                shared.identity = Some(identity.clone());
            }

            let directive = shared.lifecycle.apply(LifecycleEvent::ConnectRequested);
            if directive == Directive::Open {
                if let Some(token) = shared.retry.take() {
                    token.cancel();
                }
                shared.epoch += 1;
            }
            self.inner.publish_state(&shared);
            (directive, shared.epoch)
        };
        for event in &events {
            let _ = self.inner.dispatcher.emit(event);
        }

        match directive {
            Directive::Open => self.inner.open_and_settle(epoch, identity).await,
            Directive::AwaitInFlight => self.await_in_flight().await,
            _ => Ok(()),
        }
    }

    /// Close intentionally with code 1000, cancel any pending reconnect and
    /// drop every dispatcher subscription. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let (link, was_connected) = {
            let mut shared = self.inner.shared.lock();
            let was_connected = shared.lifecycle.state() == ConnectionState::Connected;
            let link = self.inner.supersede(&mut shared);
            (link, was_connected)
        };

        if let Some(link) = link {
            close_link(&link);
            info!("disconnected");
        }
        if was_connected {
            let _ = self
                .inner
                .dispatcher
                .emit(&ClientEvent::ConnectionStatus { connected: false });
        }
        self.inner.dispatcher.clear();
    }

    /// Send a user message. Returns `false` when not connected or the
    /// transport refuses the frame; never errors.
    pub fn send(&self, text: &str) -> bool {
        let frame = match OutboundFrame::user(text).to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound frame");
                return false;
            }
        };

        let shared = self.inner.shared.lock();
        let link = match (shared.lifecycle.state(), shared.link.as_ref()) {
            (ConnectionState::Connected, Some(link)) => link,
            (state, _) => {
                debug!(kind = %FailureKind::SendWhileDisconnected, ?state, "send rejected");
                return false;
            }
        };
        match link.try_send(Outgoing::Frame(frame)) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "outgoing channel rejected frame");
                false
            }
        }
    }

    async fn await_in_flight(&self) -> Result<(), ClientError> {
        let mut rx = self.inner.state_tx.subscribe();
        let settled = match rx.wait_for(|s| *s != ConnectionState::Connecting).await {
            Ok(state) => *state,
            Err(_) => ConnectionState::Disconnected,
        };
        if settled == ConnectionState::Connected {
            return Ok(());
        }
        let shared = self.inner.shared.lock();
        if shared.lifecycle.is_exhausted() {
            Err(ClientError::RetriesExhausted {
                attempts: shared.lifecycle.attempts(),
            })
        } else {
            Err(ClientError::ConnectionFailed)
        }
    }
}

impl<C: Connector> Inner<C> {
    fn publish_state(&self, shared: &Shared) {
        let _ = self.state_tx.send_replace(shared.lifecycle.state());
    }

    /// Invalidate the current attempt chain and take the live link, if any.
    fn supersede(&self, shared: &mut Shared) -> Option<mpsc::Sender<Outgoing>> {
        shared.epoch += 1;
        if let Some(token) = shared.retry.take() {
            token.cancel();
        }
        let _ = shared.lifecycle.apply(LifecycleEvent::DisconnectRequested);
        self.publish_state(shared);
        shared.link.take()
    }

    async fn open_and_settle(
        self: &Arc<Self>,
        epoch: u64,
        identity: &SessionIdentity,
    ) -> Result<(), ClientError> {
        let url = self.config.endpoint(identity);
        info!(%url, epoch, "opening transport");

        let timeout = self.config.connect_timeout;
        let result = match tokio::time::timeout(timeout, self.connector.open(&url)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        let mut events = Vec::new();
        let outcome = {
            let mut shared = self.shared.lock();
            if shared.epoch != epoch {
                drop(shared);
                if let Ok(link) = result {
                    close_link(&link.outgoing);
                }
                debug!(epoch, "discarding superseded open");
                return Err(ClientError::Cancelled);
            }

            match result {
                Ok(link) => {
                    let _ = shared.lifecycle.apply(LifecycleEvent::Opened);
                    shared.link = Some(link.outgoing);
                    self.publish_state(&shared);
                    spawn_reader(Arc::downgrade(self), epoch, link.incoming);
                    info!(%url, "connected");
                    events.push(ClientEvent::ConnectionStatus { connected: true });
                    Ok(())
                }
                Err(e) => {
                    let directive = shared.lifecycle.apply(LifecycleEvent::OpenFailed);
                    self.publish_state(&shared);
                    warn!(
                        kind = %FailureKind::TransportOpenFailure,
                        %url,
                        error = %e,
                        "transport open failed"
                    );
                    events.push(ClientEvent::ConnectionStatus { connected: false });
                    match directive {
                        Directive::ScheduleRetry { delay, attempt } => {
                            self.schedule_retry(&mut shared, delay, attempt);
                            Err(ClientError::TransportOpen {
                                url,
                                message: e.to_string(),
                            })
                        }
                        Directive::GiveUp => {
                            warn!(attempts = shared.lifecycle.attempts(), "giving up reconnecting");
                            events.push(ClientEvent::Error {
                                text: GIVE_UP_TEXT.to_owned(),
                            });
                            Err(ClientError::RetriesExhausted {
                                attempts: shared.lifecycle.attempts(),
                            })
                        }
                        _ => Err(ClientError::TransportOpen {
                            url,
                            message: e.to_string(),
                        }),
                    }
                }
            }
        };

        for event in &events {
            let _ = self.dispatcher.emit(event);
        }
        outcome
    }

    fn handle_frame(&self, epoch: u64, raw: &str) {
        if self.shared.lock().epoch != epoch {
            return;
        }
        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    kind = %FailureKind::MalformedInboundFrame,
                    error = %e,
                    len = raw.len(),
                    "dropping malformed frame"
                );
                return;
            }
        };
        match frame.into_event() {
            Some(event) => {
                let _ = self.dispatcher.emit(&ClientEvent::from(event));
            }
            None => debug!(frame = raw, "ignoring unhandled frame type"),
        }
    }

    fn handle_close(self: &Arc<Self>, epoch: u64, close: CloseInfo) {
        let mut events = Vec::new();
        {
            let mut shared = self.shared.lock();
            if shared.epoch != epoch {
                debug!(epoch, code = close.code, "ignoring close of superseded transport");
                return;
            }
            shared.link = None;
            let directive = shared
                .lifecycle
                .apply(LifecycleEvent::Closed { code: close.code });
            self.publish_state(&shared);

            if close.code == NORMAL_CLOSURE {
                info!(reason = %close.reason, "transport closed by server");
            } else {
                warn!(
                    kind = %FailureKind::AbnormalClose,
                    code = close.code,
                    reason = %close.reason,
                    "transport closed abnormally"
                );
            }
            events.push(ClientEvent::ConnectionStatus { connected: false });

            match directive {
                Directive::ScheduleRetry { delay, attempt } => {
                    self.schedule_retry(&mut shared, delay, attempt);
                }
                Directive::GiveUp => {
                    warn!(attempts = shared.lifecycle.attempts(), "giving up reconnecting");
                    events.push(ClientEvent::Error {
                        text: GIVE_UP_TEXT.to_owned(),
                    });
                }
                _ => {}
            }
        }
        for event in &events {
            let _ = self.dispatcher.emit(event);
        }
    }

    fn schedule_retry(self: &Arc<Self>, shared: &mut Shared, delay: Duration, attempt: u32) {
        let token = CancellationToken::new();
        if let Some(previous) = shared.retry.replace(token.clone()) {
            previous.cancel();
        }
        let epoch = shared.epoch;
        let weak = Arc::downgrade(self);
        info!(
            attempt,
            max_attempts = shared.lifecycle.policy().max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduling reconnect"
        );

        let _ = tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(attempt, "reconnect cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.retry_fired(epoch).await;
                    }
                }
            }
        });
    }

    async fn retry_fired(self: &Arc<Self>, epoch: u64) {
        let (epoch, identity) = {
            let mut shared = self.shared.lock();
            if shared.epoch != epoch {
                return;
            }
            shared.retry = None;
            let Some(identity) = shared.identity.clone() else {
                return;
            };
            if shared.lifecycle.apply(LifecycleEvent::RetryFired) != Directive::Open {
                return;
            }
            shared.epoch += 1;
            self.publish_state(&shared);
            (shared.epoch, identity)
        };
        let _ = self.open_and_settle(epoch, &identity).await;
    }
}

fn spawn_reader<C: Connector>(
    inner: Weak<Inner<C>>,
    epoch: u64,
    mut incoming: mpsc::Receiver<TransportEvent>,
) {
    let _ = tokio::spawn(async move {
        let close = loop {
            match incoming.recv().await {
                Some(TransportEvent::Frame(text)) => {
                    let Some(inner) = inner.upgrade() else {
                        return;
                    };
                    inner.handle_frame(epoch, &text);
                }
                Some(TransportEvent::Closed(info)) => break info,
                None => break CloseInfo::abnormal("transport dropped"),
            }
        };
        if let Some(inner) = inner.upgrade() {
            inner.handle_close(epoch, close);
        }
    });
}

fn close_link(link: &mpsc::Sender<Outgoing>) {
    let _ = link.try_send(Outgoing::Close {
        code: NORMAL_CLOSURE,
        reason: DISCONNECT_REASON.to_owned(),
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use tracing::Level;
    use wisebot_core::constants::ABNORMAL_CLOSURE;
    use wisebot_core::logging::capture_logs;

    use crate::events::EventCategory;
    use crate::testutil::{EventLog, Script, ScriptedConnector};

    fn config(max_attempts: u32) -> ConnectionConfig {
        ConnectionConfig {
            base_url: "ws://test.local/".into(),
            policy: ReconnectPolicy::new(max_attempts, Duration::from_millis(1000)),
            connect_timeout: Duration::from_secs(10),
        }
    }

    fn identity(raw: &str) -> SessionIdentity {
        SessionIdentity::parse(raw).unwrap()
    }

    fn client(
        script: Vec<Script>,
        max_attempts: u32,
    ) -> (ConnectionClient<ScriptedConnector>, ScriptedConnector) {
        let connector = ScriptedConnector::new(script);
        let client = ConnectionClient::new(connector.clone(), config(max_attempts));
        (client, connector)
    }

    #[test]
    fn endpoint_joins_base_and_identity() {
        let cfg = config(5);
        assert_eq!(
            cfg.endpoint(&identity("user_abc")),
            "ws://test.local/ws/user_abc"
        );
        let cfg = ConnectionConfig {
            base_url: "ws://localhost:8000".into(),
            ..cfg
        };
        assert_eq!(
            cfg.endpoint(&identity("user_abc")),
            "ws://localhost:8000/ws/user_abc"
        );
    }

    #[test]
    fn default_config_uses_settings_defaults() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.base_url, "ws://localhost:8000");
        assert_eq!(cfg.policy, ReconnectPolicy::default());
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn connect_publishes_status_and_state() {
        let (client, connector) = client(vec![Script::Accept], 5);
        let log = EventLog::attach(client.dispatcher(), EventCategory::ConnectionStatus);

        client.connect(&identity("user_abc")).await.unwrap();

        assert_eq!(client.state(), ConnectionState::Connected);
        assert!(client.is_connected());
        assert_eq!(client.reconnect_attempts(), 0);
        assert_eq!(connector.urls(), vec!["ws://test.local/ws/user_abc"]);
        assert_eq!(
            log.events(),
            vec![ClientEvent::ConnectionStatus { connected: true }]
        );
    }

    #[tokio::test]
    async fn connect_when_connected_is_noop() {
        let (client, connector) = client(vec![Script::Accept], 5);
        let id = identity("user_abc");
        client.connect(&id).await.unwrap();
        client.connect(&id).await.unwrap();
        assert_eq!(connector.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_connects_share_one_open() {
        let (client, connector) =
            client(vec![Script::AcceptAfter(Duration::from_millis(200))], 5);
        let id = identity("user_abc");

        let (a, b) = tokio::join!(client.connect(&id), client.connect(&id));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(connector.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_fails_when_in_flight_open_fails() {
        let (client, _connector) = client(vec![Script::FailAfter(Duration::from_millis(200))], 0);
        let id = identity("user_abc");

        let (a, b) = tokio::join!(client.connect(&id), client.connect(&id));
        assert_matches!(a, Err(ClientError::RetriesExhausted { .. }));
        assert_matches!(b, Err(ClientError::RetriesExhausted { .. }));
    }

    #[tokio::test]
    async fn send_when_disconnected_returns_false() {
        let (client, _connector) = client(vec![], 5);
        assert!(!client.send("hello"));
    }

    #[tokio::test]
    async fn send_serializes_user_frame() {
        let (client, connector) = client(vec![Script::Accept], 5);
        client.connect(&identity("user_abc")).await.unwrap();
        let mut server = connector.next_server().await;

        assert!(client.send("hello"));
        let sent = server.recv_frame().await;
        let value: serde_json::Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(value, json!({"type": "user", "message": "hello"}));
    }

    #[tokio::test]
    async fn send_fails_when_transport_refuses() {
        let (client, connector) = client(vec![Script::Accept], 5);
        client.connect(&identity("user_abc")).await.unwrap();
        drop(connector.next_server().await);
        // writer gone: channel closed
        assert!(!client.send("hello"));
    }

    #[tokio::test]
    async fn inbound_frames_are_dispatched_by_category() {
        let (client, connector) = client(vec![Script::Accept], 5);
        let typing = EventLog::attach(client.dispatcher(), EventCategory::Typing);
        let replies = EventLog::attach(client.dispatcher(), EventCategory::AssistantReply);
        client.connect(&identity("user_abc")).await.unwrap();
        let server = connector.next_server().await;

        server.push(json!({"type": "typing"})).await;
        server
            .push(json!({"type": "assistant", "message": "Hello", "confidence": 0.9, "context_count": 3}))
            .await;
        replies.wait_for(1).await;

        assert_eq!(typing.events(), vec![ClientEvent::Typing { active: true }]);
        assert_eq!(
            replies.events(),
            vec![ClientEvent::AssistantReply {
                text: "Hello".into(),
                confidence: Some(0.9),
                context_count: Some(3),
            }]
        );
    }

    #[tokio::test]
    async fn malformed_and_unknown_frames_are_dropped() {
        let (logs, _guard) = capture_logs();
        let (client, connector) = client(vec![Script::Accept], 5);
        let system = EventLog::attach(client.dispatcher(), EventCategory::System);
        client.connect(&identity("user_abc")).await.unwrap();
        let server = connector.next_server().await;

        server.push_raw("{not json").await;
        server.push(json!({"type": "user", "message": "echo"})).await;
        server.push(json!({"type": "system", "message": "after"})).await;
        system.wait_for(1).await;

        assert_eq!(system.events(), vec![ClientEvent::System { text: "after".into() }]);
        assert!(logs.has_event(Level::WARN, "dropping malformed frame"));
        assert!(logs.has_field("kind", "malformed_inbound_frame"));
        assert!(logs.has_event(Level::DEBUG, "ignoring unhandled frame type"));
        assert!(client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn abnormal_close_reconnects() {
        let (client, connector) = client(vec![Script::Accept, Script::Accept], 5);
        let status = EventLog::attach(client.dispatcher(), EventCategory::ConnectionStatus);
        let mut state = client.watch_state();
        client.connect(&identity("user_abc")).await.unwrap();

        connector.next_server().await.close(ABNORMAL_CLOSURE).await;
        let _ = state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        let _ = state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        assert_eq!(connector.opens(), 2);
        assert_eq!(client.reconnect_attempts(), 0);
        assert_eq!(
            status.events(),
            vec![
                ClientEvent::ConnectionStatus { connected: true },
                ClientEvent::ConnectionStatus { connected: false },
                ClientEvent::ConnectionStatus { connected: true },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn normal_close_from_server_does_not_reconnect() {
        let (client, connector) = client(vec![Script::Accept, Script::Accept], 5);
        let mut state = client.watch_state();
        client.connect(&identity("user_abc")).await.unwrap();

        connector.next_server().await.close(NORMAL_CLOSURE).await;
        let _ = state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(connector.opens(), 1);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_stop_after_budget() {
        // one drop, then every reconnect fails
        let (client, connector) = client(vec![Script::Accept], 5);
        let errors = EventLog::attach(client.dispatcher(), EventCategory::Error);
        client.connect(&identity("user_abc")).await.unwrap();

        connector.next_server().await.close(ABNORMAL_CLOSURE).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(connector.opens(), 1 + 5);
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(
            errors.events(),
            vec![ClientEvent::Error {
                text: GIVE_UP_TEXT.into()
            }]
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.opens(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_failure_reports_then_retries_in_background() {
        let (client, connector) = client(vec![Script::Fail, Script::Fail, Script::Accept], 5);
        let mut state = client.watch_state();

        let result = client.connect(&identity("user_abc")).await;
        assert_matches!(result, Err(ClientError::TransportOpen { .. }));
        assert_eq!(client.reconnect_attempts(), 1);

        let _ = state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();
        assert_eq!(connector.opens(), 3);
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_failure_with_no_budget_is_terminal() {
        let (client, connector) = client(vec![Script::Fail], 0);
        let result = client.connect(&identity("user_abc")).await;
        assert_matches!(result, Err(ClientError::RetriesExhausted { attempts: 0 }));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(connector.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_connect_after_give_up_starts_fresh() {
        let (client, connector) = client(vec![Script::Fail, Script::Accept], 0);
        let id = identity("user_abc");
        assert!(client.connect(&id).await.is_err());
        client.connect(&id).await.unwrap();
        assert!(client.is_connected());
        assert_eq!(connector.opens(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn open_timeout_is_a_failure() {
        let (client, _connector) = client(vec![Script::Hang], 0);
        let result = client.connect(&identity("user_abc")).await;
        assert_matches!(result, Err(ClientError::RetriesExhausted { .. }));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_sends_normal_close_once() {
        let (client, connector) = client(vec![Script::Accept], 5);
        let status = EventLog::attach(client.dispatcher(), EventCategory::ConnectionStatus);
        client.connect(&identity("user_abc")).await.unwrap();
        let mut server = connector.next_server().await;

        client.disconnect();
        client.disconnect();

        assert_eq!(
            server.recv().await,
            Some(Outgoing::Close {
                code: NORMAL_CLOSURE,
                reason: DISCONNECT_REASON.into()
            })
        );
        assert_eq!(server.recv().await, None);
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(
            status.events(),
            vec![
                ClientEvent::ConnectionStatus { connected: true },
                ClientEvent::ConnectionStatus { connected: false },
            ]
        );
        assert_eq!(
            client.dispatcher().listener_count(EventCategory::ConnectionStatus),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_pending_reconnect() {
        let (client, connector) = client(vec![Script::Accept, Script::Accept], 5);
        let mut state = client.watch_state();
        client.connect(&identity("user_abc")).await.unwrap();

        connector.next_server().await.close(ABNORMAL_CLOSURE).await;
        let _ = state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        client.disconnect();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(connector.opens(), 1);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_open_discards_late_transport() {
        let (client, connector) =
            client(vec![Script::AcceptAfter(Duration::from_millis(500))], 5);
        let id = identity("user_abc");

        let connecting = client.clone();
        let handle = tokio::spawn(async move { connecting.connect(&id).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.disconnect();

        assert_matches!(handle.await.unwrap(), Err(ClientError::Cancelled));
        assert_eq!(client.state(), ConnectionState::Disconnected);
        let mut server = connector.next_server().await;
        assert_matches!(server.recv().await, Some(Outgoing::Close { code: 1000, .. }));
    }

    #[tokio::test]
    async fn new_identity_replaces_connection() {
        let (client, connector) = client(vec![Script::Accept, Script::Accept], 5);
        client.connect(&identity("user_a")).await.unwrap();
        let mut first = connector.next_server().await;

        client.connect(&identity("user_b")).await.unwrap();
        assert_matches!(first.recv().await, Some(Outgoing::Close { code: 1000, .. }));
        assert_eq!(
            connector.urls(),
            vec!["ws://test.local/ws/user_a", "ws://test.local/ws/user_b"]
        );
        assert_eq!(client.identity(), Some(identity("user_b")));
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn frames_from_superseded_transport_are_ignored() {
        let (client, connector) = client(vec![Script::Accept, Script::Accept], 5);
        let system = EventLog::attach(client.dispatcher(), EventCategory::System);
        client.connect(&identity("user_a")).await.unwrap();
        let old = connector.next_server().await;
        client.connect(&identity("user_b")).await.unwrap();
        let current = connector.next_server().await;

        old.push(json!({"type": "system", "message": "stale"})).await;
        current.push(json!({"type": "system", "message": "fresh"})).await;
        system.wait_for(1).await;
        tokio::task::yield_now().await;

        assert_eq!(system.events(), vec![ClientEvent::System { text: "fresh".into() }]);
    }
}

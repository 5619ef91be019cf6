//! Connection lifecycle as a pure state machine.
//!
//! [`Lifecycle::apply`] is the only way state changes. It returns a
//! [`Directive`] telling the caller what I/O to perform next; the machine
//! itself never touches a socket or a timer.

use std::time::Duration;

use wisebot_core::constants::NORMAL_CLOSURE;
use wisebot_core::retry::ReconnectPolicy;

/// Observable transport status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, none being opened.
    #[default]
    Disconnected,
    /// An open is in flight.
    Connecting,
    /// Transport open.
    Connected,
}

/// Input to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A caller asked to connect.
    ConnectRequested,
    /// A scheduled reconnect timer fired.
    RetryFired,
    /// The transport opened.
    Opened,
    /// The open attempt failed.
    OpenFailed,
    /// An open transport closed.
    Closed {
        /// Close code reported by the transport.
        code: u16,
    },
    /// A caller asked to disconnect.
    DisconnectRequested,
}

/// What the caller must do after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Open a transport now.
    Open,
    /// Another open is in flight; wait for its outcome.
    AwaitInFlight,
    /// Already connected; nothing to do.
    AlreadyConnected,
    /// Nothing to do.
    Idle,
    /// Schedule a reconnect after `delay`.
    ScheduleRetry {
        /// Delay before the attempt.
        delay: Duration,
        /// 1-based number of this attempt in the current chain.
        attempt: u32,
    },
    /// Retry budget spent; stay disconnected.
    GiveUp,
}

/// Lifecycle state plus reconnect bookkeeping.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    state: ConnectionState,
    attempts: u32,
    retry_pending: bool,
    exhausted: bool,
    policy: ReconnectPolicy,
}

impl Lifecycle {
    /// Disconnected machine with the given policy.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            retry_pending: false,
            exhausted: false,
            policy,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts made in the current chain.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether a reconnect timer is outstanding.
    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Whether the last chain ended in [`Directive::GiveUp`].
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Policy in effect.
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Apply one event and return the follow-up directive.
    pub fn apply(&mut self, event: LifecycleEvent) -> Directive {
        use ConnectionState::{Connected, Connecting, Disconnected};

        match (self.state, event) {
            (Connected, LifecycleEvent::ConnectRequested) => Directive::AlreadyConnected,
            (Connecting, LifecycleEvent::ConnectRequested) => Directive::AwaitInFlight,
            (Disconnected, LifecycleEvent::ConnectRequested) => {
                self.attempts = 0;
                self.retry_pending = false;
                self.exhausted = false;
                self.state = Connecting;
                Directive::Open
            }

            (Disconnected, LifecycleEvent::RetryFired) if self.retry_pending => {
                self.retry_pending = false;
                self.state = Connecting;
                Directive::Open
            }

            (Connecting, LifecycleEvent::Opened) => {
                self.state = Connected;
                self.attempts = 0;
                self.exhausted = false;
                Directive::Idle
            }

            (Connecting, LifecycleEvent::OpenFailed) => {
                self.state = Disconnected;
                self.on_failure()
            }

            (Connected, LifecycleEvent::Closed { code }) => {
                self.state = Disconnected;
                if code == NORMAL_CLOSURE {
                    Directive::Idle
                } else {
                    self.on_failure()
                }
            }

            (_, LifecycleEvent::DisconnectRequested) => {
                self.state = Disconnected;
                self.retry_pending = false;
                Directive::Idle
            }

            _ => Directive::Idle,
        }
    }

    fn on_failure(&mut self) -> Directive {
        if self.policy.allows(self.attempts) {
            self.attempts += 1;
            self.retry_pending = true;
            Directive::ScheduleRetry {
                delay: self.policy.delay(),
                attempt: self.attempts,
            }
        } else {
            self.retry_pending = false;
            self.exhausted = true;
            Directive::GiveUp
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wisebot_core::constants::ABNORMAL_CLOSURE;

    fn machine() -> Lifecycle {
        Lifecycle::new(ReconnectPolicy::default())
    }

    fn connected() -> Lifecycle {
        let mut m = machine();
        assert_eq!(m.apply(LifecycleEvent::ConnectRequested), Directive::Open);
        assert_eq!(m.apply(LifecycleEvent::Opened), Directive::Idle);
        m
    }

    #[test]
    fn connect_from_disconnected_opens() {
        let mut m = machine();
        assert_eq!(m.apply(LifecycleEvent::ConnectRequested), Directive::Open);
        assert_eq!(m.state(), ConnectionState::Connecting);
    }

    #[test]
    fn connect_while_connecting_waits() {
        let mut m = machine();
        let _ = m.apply(LifecycleEvent::ConnectRequested);
        assert_eq!(
            m.apply(LifecycleEvent::ConnectRequested),
            Directive::AwaitInFlight
        );
    }

    #[test]
    fn connect_while_connected_is_noop() {
        let mut m = connected();
        assert_eq!(
            m.apply(LifecycleEvent::ConnectRequested),
            Directive::AlreadyConnected
        );
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn normal_close_does_not_retry() {
        let mut m = connected();
        assert_eq!(
            m.apply(LifecycleEvent::Closed { code: NORMAL_CLOSURE }),
            Directive::Idle
        );
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(!m.retry_pending());
    }

    #[test]
    fn abnormal_close_schedules_retry() {
        let mut m = connected();
        assert_eq!(
            m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE }),
            Directive::ScheduleRetry {
                delay: Duration::from_millis(1000),
                attempt: 1
            }
        );
        assert!(m.retry_pending());
        assert_eq!(m.attempts(), 1);
    }

    #[test]
    fn retry_cap_then_give_up() {
        let mut m = connected();
        let _ = m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE });
        for attempt in 2..=5 {
            assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Open);
            assert_eq!(
                m.apply(LifecycleEvent::OpenFailed),
                Directive::ScheduleRetry {
                    delay: Duration::from_millis(1000),
                    attempt
                }
            );
        }
        assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Open);
        assert_eq!(m.apply(LifecycleEvent::OpenFailed), Directive::GiveUp);
        assert!(m.is_exhausted());
        assert!(!m.retry_pending());
        assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Idle);
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn explicit_connect_resets_exhausted_chain() {
        let mut m = Lifecycle::new(ReconnectPolicy::new(0, Duration::from_millis(10)));
        let _ = m.apply(LifecycleEvent::ConnectRequested);
        assert_eq!(m.apply(LifecycleEvent::OpenFailed), Directive::GiveUp);
        assert!(m.is_exhausted());

        assert_eq!(m.apply(LifecycleEvent::ConnectRequested), Directive::Open);
        assert!(!m.is_exhausted());
        assert_eq!(m.attempts(), 0);
    }

    #[test]
    fn successful_open_resets_attempts() {
        let mut m = connected();
        let _ = m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE });
        let _ = m.apply(LifecycleEvent::RetryFired);
        let _ = m.apply(LifecycleEvent::OpenFailed);
        assert_eq!(m.attempts(), 2);
        let _ = m.apply(LifecycleEvent::RetryFired);
        let _ = m.apply(LifecycleEvent::Opened);
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn disconnect_drops_pending_retry() {
        let mut m = connected();
        let _ = m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE });
        assert_eq!(m.apply(LifecycleEvent::DisconnectRequested), Directive::Idle);
        assert!(!m.retry_pending());
        assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Idle);
    }

    #[test]
    fn explicit_connect_drops_pending_retry() {
        let mut m = connected();
        let _ = m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE });
        assert_eq!(m.apply(LifecycleEvent::ConnectRequested), Directive::Open);
        assert!(!m.retry_pending());
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Idle);
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut m = machine();
        assert_eq!(m.apply(LifecycleEvent::Opened), Directive::Idle);
        assert_eq!(m.apply(LifecycleEvent::OpenFailed), Directive::Idle);
        assert_eq!(
            m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE }),
            Directive::Idle
        );
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.attempts(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn event() -> impl Strategy<Value = LifecycleEvent> {
            prop_oneof![
                Just(LifecycleEvent::ConnectRequested),
                Just(LifecycleEvent::RetryFired),
                Just(LifecycleEvent::Opened),
                Just(LifecycleEvent::OpenFailed),
                Just(LifecycleEvent::Closed { code: NORMAL_CLOSURE }),
                Just(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE }),
                Just(LifecycleEvent::DisconnectRequested),
            ]
        }

        proptest! {
            #[test]
            fn attempts_never_exceed_cap(
                max in 0u32..8,
                events in proptest::collection::vec(event(), 0..200),
            ) {
                let mut m = Lifecycle::new(ReconnectPolicy::new(max, Duration::from_millis(5)));
                for e in events {
                    let directive = m.apply(e);
                    prop_assert!(m.attempts() <= max);
                    if let Directive::ScheduleRetry { attempt, .. } = directive {
                        prop_assert!(attempt >= 1 && attempt <= max);
                        prop_assert!(m.retry_pending());
                    }
                    if m.state() == ConnectionState::Connected {
                        prop_assert_eq!(m.attempts(), 0);
                        prop_assert!(!m.retry_pending());
                    }
                }
            }

            #[test]
            fn connected_only_after_opened(
                events in proptest::collection::vec(event(), 0..200),
            ) {
                let mut m = Lifecycle::new(ReconnectPolicy::default());
                let mut prev = m.state();
                for e in events {
                    let _ = m.apply(e);
                    if m.state() == ConnectionState::Connected && prev != ConnectionState::Connected {
                        prop_assert_eq!(e, LifecycleEvent::Opened);
                    }
                    prev = m.state();
                }
            }

            #[test]
            fn failures_below_cap_always_reschedule(
                failures in 1u32..5,
            ) {
                let mut m = Lifecycle::new(ReconnectPolicy::default());
                let _ = m.apply(LifecycleEvent::ConnectRequested);
                let _ = m.apply(LifecycleEvent::Opened);
                let _ = m.apply(LifecycleEvent::Closed { code: ABNORMAL_CLOSURE });
                for _ in 1..failures {
                    prop_assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Open);
                    let is_retry = matches!(m.apply(LifecycleEvent::OpenFailed), Directive::ScheduleRetry { .. });
                    prop_assert!(is_retry);
                }
                prop_assert_eq!(m.apply(LifecycleEvent::RetryFired), Directive::Open);
                prop_assert_eq!(m.apply(LifecycleEvent::Opened), Directive::Idle);
                prop_assert_eq!(m.state(), ConnectionState::Connected);
            }
        }
    }
}

//! In-process transport doubles for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};

use crate::connection::transport::{
    CloseInfo, Connector, Outgoing, TransportEvent, TransportLink,
};
use crate::dispatcher::Dispatcher;
use crate::errors::TransportError;
use crate::events::{ClientEvent, EventCategory};

/// Outcome of one scripted open.
#[derive(Clone, Copy, Debug)]
pub enum Script {
    Accept,
    AcceptAfter(Duration),
    Fail,
    FailAfter(Duration),
    /// Never completes; the client's open timeout must fire.
    Hang,
}

/// Server half of an accepted link.
pub struct ServerEnd {
    outgoing: mpsc::Receiver<Outgoing>,
    incoming: mpsc::Sender<TransportEvent>,
}

impl ServerEnd {
    pub async fn recv(&mut self) -> Option<Outgoing> {
        self.outgoing.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Outgoing> {
        self.outgoing.try_recv().ok()
    }

    pub async fn recv_frame(&mut self) -> String {
        match self.recv().await {
            Some(Outgoing::Frame(text)) => text,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    pub async fn push(&self, value: serde_json::Value) {
        self.push_raw(&value.to_string()).await;
    }

    pub async fn push_raw(&self, raw: &str) {
        self.incoming
            .send(TransportEvent::Frame(raw.to_owned()))
            .await
            .unwrap();
    }

    pub async fn close(&self, code: u16) {
        self.incoming
            .send(TransportEvent::Closed(CloseInfo {
                code,
                reason: String::new(),
            }))
            .await
            .unwrap();
    }
}

struct ScriptState {
    script: Mutex<VecDeque<Script>>,
    urls: Mutex<Vec<String>>,
    opens: AtomicUsize,
    servers_tx: mpsc::UnboundedSender<ServerEnd>,
    servers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ServerEnd>>,
}

/// Connector that follows a script, then fails every further open.
#[derive(Clone)]
pub struct ScriptedConnector {
    state: Arc<ScriptState>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Script>) -> Self {
        let (servers_tx, servers_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(ScriptState {
                script: Mutex::new(script.into()),
                urls: Mutex::new(Vec::new()),
                opens: AtomicUsize::new(0),
                servers_tx,
                servers_rx: tokio::sync::Mutex::new(servers_rx),
            }),
        }
    }

    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.urls.lock().clone()
    }

    /// Server end of the next accepted link, in accept order.
    pub async fn next_server(&self) -> ServerEnd {
        self.state.servers_rx.lock().await.recv().await.unwrap()
    }

    fn accept(&self) -> TransportLink {
        let (out_tx, out_rx) = mpsc::channel(16);
        let (in_tx, in_rx) = mpsc::channel(16);
        self.state
            .servers_tx
            .send(ServerEnd {
                outgoing: out_rx,
                incoming: in_tx,
            })
            .unwrap();
        TransportLink {
            outgoing: out_tx,
            incoming: in_rx,
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self, url: &str) -> Result<TransportLink, TransportError> {
        let _ = self.state.opens.fetch_add(1, Ordering::SeqCst);
        self.state.urls.lock().push(url.to_owned());
        let step = self.state.script.lock().pop_front().unwrap_or(Script::Fail);
        match step {
            Script::Accept => Ok(self.accept()),
            Script::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.accept())
            }
            Script::Fail => Err(TransportError::Other("connection refused".into())),
            Script::FailAfter(delay) => {
                tokio::time::sleep(delay).await;
                Err(TransportError::Other("connection refused".into()))
            }
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Records every event of one category.
#[derive(Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ClientEvent>>>,
    notify: Arc<Notify>,
}

impl EventLog {
    pub fn attach(dispatcher: &Dispatcher, category: EventCategory) -> Self {
        let log = Self {
            events: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        };
        let sink = log.clone();
        let _ = dispatcher.listen(category, move |event| {
            sink.events.lock().push(event.clone());
            sink.notify.notify_one();
        });
        log
    }

    pub fn events(&self) -> Vec<ClientEvent> {
        self.events.lock().clone()
    }

    /// Wait until at least `count` events were recorded.
    pub async fn wait_for(&self, count: usize) {
        loop {
            if self.events.lock().len() >= count {
                return;
            }
            self.notify.notified().await;
        }
    }
}

//! Interactive terminal chat.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use wisebot_client::chat::ChatSnapshot;
use wisebot_client::connection::WsConnector;
use wisebot_client::{ChatConfig, ChatController, ConnectionClient, ConnectionConfig};
use wisebot_core::ids::{MessageId, SessionIdentity};
use wisebot_core::messages::Origin;
use wisebot_settings::WisebotSettings;

use crate::identity_provider;

const CLEAR: &str = ":clear";
const QUIT: &str = ":quit";

pub async fn run(
    settings: &WisebotSettings,
    url: Option<String>,
    identity: Option<String>,
) -> Result<()> {
    let identity = match identity {
        Some(raw) => SessionIdentity::parse(&raw)
            .with_context(|| format!("Invalid identity {raw:?}"))?,
        None => identity_provider(settings)
            .get_or_create_identity()
            .context("Failed to load identity")?,
    };

    let mut config = ConnectionConfig::from_settings(settings);
    if let Some(url) = url {
        config.base_url = url;
    }
    println!("Connecting to {} as {identity}", config.endpoint(&identity));

    let client = ConnectionClient::new(
        WsConnector::new(settings.connection.channel_capacity),
        config,
    );
    let chat = ChatController::new(client, identity, ChatConfig::from_settings(&settings.chat));

    let printer = tokio::spawn(print_updates(chat.subscribe()));
    if let Err(e) = chat.start().await {
        tracing::warn!(error = %e, "initial connect failed");
    }
    println!("Type a message, {CLEAR} to clear the log, {QUIT} to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        match line.trim() {
            QUIT => break,
            CLEAR => chat.clear(),
            _ => {
                // errors are rendered from the snapshot
                let _ = chat.send(&line);
            }
        }
    }

    chat.stop();
    printer.abort();
    Ok(())
}

async fn print_updates(mut rx: watch::Receiver<ChatSnapshot>) {
    let mut renderer = Renderer::default();
    loop {
        let lines = renderer.render(&rx.borrow_and_update());
        for line in lines {
            println!("{line}");
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Turns successive snapshots into the lines to print.
#[derive(Default)]
struct Renderer {
    last_message: Option<MessageId>,
    connected: Option<bool>,
    typing: bool,
    error: Option<String>,
}

impl Renderer {
    fn render(&mut self, snapshot: &ChatSnapshot) -> Vec<String> {
        let mut out = Vec::new();

        if self.connected != Some(snapshot.connected) {
            out.push(if snapshot.connected {
                "* connected".to_owned()
            } else {
                "* disconnected".to_owned()
            });
            self.connected = Some(snapshot.connected);
        }

        let start = self
            .last_message
            .as_ref()
            .and_then(|id| snapshot.messages.iter().position(|m| &m.id == id))
            .map_or(0, |pos| pos + 1);
        for message in &snapshot.messages[start..] {
            match message.origin {
                Origin::User => {}
                Origin::Assistant => out.push(format!("bot> {}", message.content)),
                Origin::System => out.push(format!("[system] {}", message.content)),
            }
        }
        self.last_message = snapshot.messages.last().map(|m| m.id.clone());

        if snapshot.typing && !self.typing {
            out.push("bot is typing...".to_owned());
        }
        self.typing = snapshot.typing;

        if snapshot.error != self.error {
            if let Some(error) = &snapshot.error {
                out.push(format!("! {error}"));
            }
            self.error.clone_from(&snapshot.error);
        }
        out
    }
}

//! `wisebot admin ...` subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tokio_util::sync::CancellationToken;
use wisebot_admin::{AdminClient, FileEntry, PollPolicy, format_file_size};
use wisebot_settings::WisebotSettings;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Check the backend is up.
    Health,

    /// Store a document without indexing it.
    Upload {
        /// PDF, DOC, DOCX or TXT file.
        file: PathBuf,
    },

    /// Store and index a document.
    Process {
        /// PDF, DOC, DOCX or TXT file.
        file: PathBuf,

        /// Process in the background and print the processing ID.
        #[arg(long = "async")]
        background: bool,

        /// With `--async`, poll until processing finishes.
        #[arg(long, requires = "background")]
        wait: bool,
    },

    /// Index raw text.
    Text {
        /// Document title.
        #[arg(long)]
        title: Option<String>,

        /// Text to index.
        text: String,
    },

    /// Show background processing status.
    Status {
        /// Processing ID from `process --async`.
        id: String,
    },

    /// List stored documents.
    List,
}

pub async fn run(settings: &WisebotSettings, url: Option<String>, command: AdminCommand) -> Result<()> {
    let base_url = url.unwrap_or_else(|| settings.server.http_url.clone());
    let client = AdminClient::new(base_url, settings.admin.clone())
        .context("Failed to build HTTP client")?;

    match command {
        AdminCommand::Health => {
            let body = client.health().await.context("Health check failed")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        AdminCommand::Upload { file } => {
            let result = client.upload_file(&file).await.context("Upload failed")?;
            println!("{}", result.message);
        }
        AdminCommand::Process {
            file,
            background: false,
            ..
        } => {
            let result = client
                .process_document(&file)
                .await
                .context("Processing failed")?;
            println!(
                "Successfully processed \"{}\". Created {} knowledge chunks.",
                file.display(),
                result.chunks_created
            );
        }
        AdminCommand::Process {
            file,
            background: true,
            wait,
        } => {
            let ticket = client
                .process_document_async(&file)
                .await
                .context("Upload failed")?;
            println!("{} ({:?})", ticket.processing_id, ticket.status);
            if wait {
                wait_for(&client, &ticket.processing_id).await?;
            }
        }
        AdminCommand::Text { title, text } => {
            let result = client
                .process_text(&text, title.as_deref())
                .await
                .context("Text processing failed")?;
            println!("Created {} knowledge chunks.", result.chunks_created);
        }
        AdminCommand::Status { id } => {
            let status = client
                .processing_status(&id)
                .await
                .context("Status request failed")?;
            println!(
                "{:?}{}",
                status.status,
                status
                    .message
                    .map(|m| format!(": {m}"))
                    .unwrap_or_default()
            );
        }
        AdminCommand::List => {
            let files = client.list_files().await.context("Listing failed")?;
            if files.is_empty() {
                println!("No files uploaded yet.");
            }
            for file in &files {
                println!("{}", describe(file));
            }
        }
    }
    Ok(())
}

async fn wait_for(client: &AdminClient, id: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = client
        .wait_for_processing(id, PollPolicy::from_settings(client.settings()), &cancel)
        .await;
    interrupt.abort();

    let status = result.context("Processing did not complete")?;
    println!(
        "Completed. Created {} knowledge chunks.",
        status.chunks_created.unwrap_or_default()
    );
    Ok(())
}

fn describe(file: &FileEntry) -> String {
    let uploaded = file
        .modified_at()
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_owned());
    format!(
        "{}  {}  uploaded {uploaded}",
        file.filename,
        format_file_size(file.size)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_file() {
        let file = FileEntry {
            filename: "a.pdf".into(),
            size: 1536,
            modified: 1_700_000_000.0,
        };
        assert_eq!(describe(&file), "a.pdf  1.5 KB  uploaded 2023-11-14");
    }

    #[test]
    fn describe_file_bad_timestamp() {
        let file = FileEntry {
            filename: "b.txt".into(),
            size: 0,
            modified: f64::INFINITY,
        };
        assert_eq!(describe(&file), "b.txt  0 Bytes  uploaded unknown");
    }
}

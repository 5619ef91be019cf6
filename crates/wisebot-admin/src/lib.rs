//! # wisebot-admin
//!
//! Client for the WiseBot document-ingestion HTTP surface: document upload
//! and processing, manual text indexing, the stored-file listing, the HTTP
//! chat fallback and a cancellable processing-status poller.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod poll;
pub mod types;
pub mod validation;

pub use client::AdminClient;
pub use errors::{AdminError, Result};
pub use poll::PollPolicy;
pub use types::{
    FileEntry, ProcessResponse, ProcessingState, ProcessingStatus, ProcessingTicket,
    UploadResponse, format_file_size,
};

//! Bounded, cancellable processing-status polling.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use wisebot_settings::AdminSettings;

use crate::client::AdminClient;
use crate::errors::{AdminError, Result};
use crate::types::{ProcessingState, ProcessingStatus};

/// How often and how many times to poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between polls.
    pub interval: Duration,
    /// Maximum status requests.
    pub max_polls: u32,
}

impl PollPolicy {
    /// Policy from the `admin` settings section.
    pub fn from_settings(settings: &AdminSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_polls: settings.max_polls,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_settings(&AdminSettings::default())
    }
}

impl AdminClient {
    /// Poll `id` until it completes, fails, the budget runs out or `cancel`
    /// fires.
    pub async fn wait_for_processing(
        &self,
        id: &str,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<ProcessingStatus> {
        for poll in 1..=policy.max_polls {
            let status = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AdminError::Cancelled),
                status = self.processing_status(id) => status?,
            };

            match status.status {
                ProcessingState::Completed => {
                    info!(id, poll, chunks = ?status.chunks_created, "processing completed");
                    return Ok(status);
                }
                ProcessingState::Error => {
                    return Err(AdminError::ProcessingFailed {
                        id: id.to_owned(),
                        message: status.message.unwrap_or_default(),
                    });
                }
                state => debug!(id, poll, ?state, "processing not finished"),
            }

            if poll < policy.max_polls {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(AdminError::Cancelled),
                    () = tokio::time::sleep(policy.interval) => {}
                }
            }
        }

        Err(AdminError::PollTimeout {
            id: id.to_owned(),
            polls: policy.max_polls,
        })
    }
}

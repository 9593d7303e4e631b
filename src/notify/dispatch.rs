use anyhow::{Result, bail};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use super::gateway::SmsGateway;
use super::log::{DispatchEntry, DispatchLog};

/// A message ready to go to one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    /// Idempotency token checked against the [`DispatchLog`].
    pub token: String,
    pub recipient: String,
    /// Normalized number, `None` when the stored one was unusable.
    pub number: Option<String>,
    pub chunks: Vec<String>,
}

/// Counts from one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    /// Recipients without a usable number.
    pub skipped: usize,
    /// Recipients whose token was already in the log.
    pub already_sent: usize,
    /// Chunks delivered across all successful recipients.
    pub chunks: usize,
}

async fn deliver<G: SmsGateway>(gateway: &G, number: &str, chunks: &[String]) -> Result<usize> {
    let numbers = [number.to_string()];
    for (idx, chunk) in chunks.iter().enumerate() {
        let receipt = gateway.send(&numbers, chunk).await?;
        if !receipt.is_complete() {
            let reason = receipt
                .rejected
                .first()
                .map_or("no recipient accepted", |(_, status)| status.as_str());
            bail!("chunk {} of {} rejected: {reason}", idx + 1, chunks.len());
        }
    }
    Ok(chunks.len())
}

/// Sends every message, at most `concurrency` recipients at a time.
///
/// A failure for one recipient is logged and counted; it never stops the
/// others. Successful sends are written to `log` so a rerun skips them.
#[tracing::instrument(skip_all, fields(messages = messages.len(), concurrency = concurrency))]
pub async fn dispatch<G>(
    gateway: Arc<G>,
    log: &mut DispatchLog,
    messages: Vec<Outgoing>,
    concurrency: usize,
) -> Result<DispatchSummary>
where
    G: SmsGateway + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut summary = DispatchSummary::default();
    let mut tasks = vec![];

    for message in messages {
        if log.contains(&message.token) {
            debug!(token = %message.token, "Already sent, skipping");
            summary.already_sent += 1;
            continue;
        }
        let Some(number) = message.number.clone() else {
            warn!(recipient = %message.recipient, "No valid phone number, skipping");
            summary.skipped += 1;
            continue;
        };
        if message.chunks.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let sem = semaphore.clone();
        let gateway = gateway.clone();
        let span = tracing::info_span!("send_sms", recipient = %message.recipient, number = %number);

        let task = tokio::spawn(
            async move {
                let result: Result<usize> = async {
                    let _permit = sem.acquire().await?;
                    deliver(gateway.as_ref(), &number, &message.chunks).await
                }
                .await;
                (message, number, result)
            }
            .instrument(span),
        );
        tasks.push(task);
    }

    for task in tasks {
        let (message, number, result) = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Dispatch task panicked");
                summary.failed += 1;
                continue;
            }
        };

        match result {
            Ok(chunks) => {
                summary.sent += 1;
                summary.chunks += chunks;
                let entry = DispatchEntry {
                    token: message.token,
                    recipient: message.recipient,
                    number,
                    chunks,
                    sent_at: Utc::now(),
                };
                if let Err(e) = log.record(&entry) {
                    error!(token = %entry.token, error = %e, "Failed to record dispatch");
                }
            }
            Err(e) => {
                error!(recipient = %message.recipient, number = %number, error = %e, "SMS delivery failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        already_sent = summary.already_sent,
        chunks = summary.chunks,
        "Dispatch complete"
    );
    Ok(summary)
}

//! Change event source: one long-lived subscription to the recent-changes
//! feed, decoded into typed events and pushed over a bounded channel.
//!
//! All stream I/O runs in a spawned task. Transport failures never reach the
//! consumer; the task retries forever with exponential backoff and only exits
//! when the receiver is dropped.

use std::time::Instant;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wikirelay_common::types::{ChangeEvent, RecentChange};

use crate::connection::ReconnectPolicy;
use crate::sse::SseDecoder;

/// Default Wikimedia EventStreams endpoint.
pub const DEFAULT_STREAM_URL: &str = "https://stream.wikimedia.org/v2/stream/recentchange";

/// Events buffered between the stream reader and the dispatcher. A full
/// buffer blocks the reader, so slow deliveries backpressure the socket
/// instead of dropping changes.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    /// Only changes from this wiki domain are forwarded.
    pub domain: String,
}

impl StreamConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            domain: domain.into(),
        }
    }
}

pub struct ChangeStream;

impl ChangeStream {
    /// Subscribe to the feed. The reader task runs until the returned
    /// receiver is dropped; connection failures surface as log lines and
    /// retries, never as errors to the caller.
    pub fn connect(config: StreamConfig) -> mpsc::Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run(config, tx));
        rx
    }
}

async fn run(config: StreamConfig, tx: mpsc::Sender<ChangeEvent>) {
    let client = reqwest::Client::new();
    let mut policy = ReconnectPolicy::new();

    loop {
        info!(url = %config.url, domain = %config.domain, "Connecting to change stream");

        let connected_at = Instant::now();
        match read_stream(&client, &config, &tx).await {
            Ok(()) => {
                info!("Change stream consumer gone, reader stopping");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Change stream failed");
            }
        }
        policy.connection_closed(connected_at.elapsed());

        let delay = policy.next_delay();
        info!(delay_secs = delay.as_secs(), "Reconnecting after backoff");
        tokio::time::sleep(delay).await;

        if tx.is_closed() {
            return;
        }
    }
}

/// Read one connection's worth of events. Returns `Ok(())` only when the
/// receiver has been dropped; every transport failure, including a clean EOF
/// the feed never sends on purpose, is an error so the caller reconnects.
async fn read_stream(
    client: &reqwest::Client,
    config: &StreamConfig,
    tx: &mpsc::Sender<ChangeEvent>,
) -> anyhow::Result<()> {
    let response = client
        .get(&config.url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    if !response.status().is_success() {
        anyhow::bail!("stream endpoint returned {}", response.status());
    }

    info!("Change stream ready");

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for frame in decoder.feed(&chunk) {
            let Some(event) = decode_change(&frame.data) else {
                continue;
            };
            if event.server_name != config.domain {
                continue;
            }
            if tx.send(event).await.is_err() {
                return Ok(());
            }
        }
    }

    anyhow::bail!("stream ended")
}

fn decode_change(data: &str) -> Option<ChangeEvent> {
    match serde_json::from_str::<RecentChange>(data) {
        Ok(change) => Some(change.into()),
        Err(e) => {
            debug!(error = %e, "Skipping undecodable change frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDIT_FRAME: &str = r#"{
        "type": "edit",
        "namespace": 0,
        "title": "Earth",
        "comment": "/* History */ fix typo",
        "timestamp": 1712345678,
        "user": "203.0.113.7",
        "bot": false,
        "minor": false,
        "length": {"old": 1000, "new": 1120},
        "revision": {"old": 55, "new": 56},
        "server_name": "en.wikipedia.org"
    }"#;

    #[test]
    fn decodes_edit_frames() {
        let event = decode_change(EDIT_FRAME).unwrap();
        assert_eq!(event.title, "Earth");
        assert_eq!(event.delta(), 120);
        assert_eq!(event.server_name, "en.wikipedia.org");
    }

    #[test]
    fn undecodable_frames_are_skipped() {
        assert!(decode_change("not json").is_none());
        assert!(decode_change("{\"title\": 42}").is_none());
    }

    #[tokio::test]
    async fn channel_fills_before_blocking_never_drops() {
        let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
        for _ in 0..CHANNEL_CAPACITY {
            tx.try_send(decode_change(EDIT_FRAME).unwrap()).unwrap();
        }
        // One past capacity: the reader would await here, not discard.
        assert!(tx.try_send(decode_change(EDIT_FRAME).unwrap()).is_err());

        // Draining one slot makes room again.
        assert!(rx.recv().await.is_some());
        assert!(tx.try_send(decode_change(EDIT_FRAME).unwrap()).is_ok());
    }
}

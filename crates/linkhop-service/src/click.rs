use jiff::Timestamp;
use linkhop_core::ShortCode;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

/// One successful redirect, handed to click accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub code: ShortCode,
    pub at: Timestamp,
    /// Identity the request was rate limited under.
    pub client: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Receives click events from the redirect path.
///
/// `record` is called inline on every redirect, so implementations must not
/// block and must not fail.
pub trait ClickSink: Send + Sync + 'static {
    fn record(&self, event: ClickEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClickSink;

impl ClickSink for NoopClickSink {
    fn record(&self, _event: ClickEvent) {}
}

/// Forwards events into a bounded channel. A full channel drops the event.
#[derive(Debug, Clone)]
pub struct ChannelClickSink {
    tx: Sender<ClickEvent>,
}

impl ChannelClickSink {
    /// Creates a sink and the receiver its events arrive on.
    pub fn new(capacity: usize) -> (Self, Receiver<ClickEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ClickSink for ChannelClickSink {
    fn record(&self, event: ClickEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(code = %event.code, "click channel full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                debug!(code = %event.code, "click channel closed, dropping event");
            }
        }
    }
}

/// Consumes click events until every sender is gone.
///
/// Aggregation happens elsewhere; this only logs each event.
pub async fn drain_clicks(mut rx: Receiver<ClickEvent>) {
    while let Some(event) = rx.recv().await {
        info!(
            code = %event.code,
            at = %event.at,
            client = %event.client,
            user_agent = event.user_agent.as_deref().unwrap_or("-"),
            referer = event.referer.as_deref().unwrap_or("-"),
            "click"
        );
    }
    debug!("click channel drained");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(code: &str) -> ClickEvent {
        ClickEvent {
            code: ShortCode::new_unchecked(code),
            at: Timestamp::from_second(0).unwrap(),
            client: "127.0.0.1".to_string(),
            user_agent: None,
            referer: None,
        }
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (sink, mut rx) = ChannelClickSink::new(4);
        sink.record(event("a"));
        sink.record(event("b"));

        assert_eq!(rx.recv().await.unwrap().code.as_str(), "a");
        assert_eq!(rx.recv().await.unwrap().code.as_str(), "b");
    }

    #[tokio::test]
    async fn full_channel_drops_without_blocking() {
        let (sink, mut rx) = ChannelClickSink::new(1);
        sink.record(event("kept"));
        sink.record(event("dropped"));

        assert_eq!(rx.recv().await.unwrap().code.as_str(), "kept");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_channel_is_ignored() {
        let (sink, rx) = ChannelClickSink::new(1);
        drop(rx);
        sink.record(event("nobody"));
    }

    #[tokio::test]
    async fn drain_returns_once_senders_are_gone() {
        let (sink, rx) = ChannelClickSink::new(8);
        sink.record(event("a"));
        drop(sink);
        drain_clicks(rx).await;
    }
}

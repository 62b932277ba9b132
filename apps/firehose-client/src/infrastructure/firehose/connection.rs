//! Connection Supervisor
//!
//! Owns the streaming connection lifecycle. A single task serializes every
//! state transition: filter mutations arrive as commands, bursts of
//! mutations are debounced into one reconnect, transport failures are
//! retried with backoff, and decoded records are delivered to the consumer
//! over an event channel.
//!
//! At most one live byte stream exists at a time; a replacement attempt
//! drops the previous stream (releasing its transport handle) before the
//! new open is even issued, and resets the decoder so no partial record
//! leaks across connections.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Sleep};
use tokio_util::sync::CancellationToken;

use super::codec::LineDecoder;
use super::reconnect::ReconnectPolicy;
use crate::application::ports::{ByteStream, StreamTransport, TransportError};
use crate::domain::filter::FilterSet;
use crate::infrastructure::config::StreamSettings;

// =============================================================================
// Events and Commands
// =============================================================================

/// Events delivered to the consumer.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A streaming connection was opened.
    Connected,
    /// One decoded JSON record from the feed.
    Record(serde_json::Value),
    /// A malformed record segment was dropped; decoding continued and the
    /// connection stayed up.
    DecodeFailure {
        /// The raw segment that failed to parse.
        segment: String,
        /// Parse error description.
        reason: String,
    },
    /// The connection was lost; a retry is scheduled.
    Reconnecting {
        /// Retry attempt number since the last successful connection.
        attempt: u32,
        /// The failure that triggered the reconnect.
        error: TransportError,
    },
    /// The configured retry cap was exhausted. The supervisor stays alive
    /// and the next filter mutation starts a fresh connection cycle.
    RetriesExhausted,
    /// The connection was deliberately torn down (explicit close or all
    /// filters removed).
    Disconnected,
}

/// Commands from the client facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// The filter set changed; reconcile the connection with it.
    Refresh,
    /// Tear down the connection and any pending timer. Not terminal: a
    /// later mutation with non-empty filters re-opens.
    Close,
}

// =============================================================================
// Connection Supervisor
// =============================================================================

/// Supervisor task for the streaming connection.
///
/// Runs until cancelled. All filter-driven reconnect decisions, the
/// debounce window, the read loop, and failure retries happen here, so the
/// connection state machine is single-owner by construction.
pub(crate) struct ConnectionSupervisor {
    filters: Arc<FilterSet>,
    transport: Arc<dyn StreamTransport>,
    settings: StreamSettings,
    event_tx: mpsc::Sender<StreamEvent>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
}

impl ConnectionSupervisor {
    pub(crate) fn new(
        filters: Arc<FilterSet>,
        transport: Arc<dyn StreamTransport>,
        settings: StreamSettings,
        event_tx: mpsc::Sender<StreamEvent>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            filters,
            transport,
            settings,
            event_tx,
            cmd_rx,
            cancel,
        }
    }

    /// Run the supervisor loop until cancellation.
    pub(crate) async fn run(mut self) {
        let mut decoder = LineDecoder::new();
        let mut policy = ReconnectPolicy::new(self.settings.reconnect.clone());
        let mut active: Option<ByteStream> = None;
        // One slot for both the debounce window and backoff retries:
        // arming while a timer is pending is a no-op, which is exactly the
        // coalescing the debounce needs.
        let mut pending: Option<Pin<Box<Sleep>>> = None;
        let mut stall_deadline = Instant::now() + self.settings.stall_timeout;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("connection supervisor cancelled");
                    break;
                }

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Refresh) => {
                        if self.filters.is_empty() {
                            // Nothing to coalesce into: tear down now.
                            pending = None;
                            policy.reset();
                            if active.take().is_some() {
                                decoder.reset();
                                tracing::info!("all filters removed, closing stream");
                                let _ = self.event_tx.send(StreamEvent::Disconnected).await;
                            }
                        } else if pending.is_none() {
                            pending =
                                Some(Box::pin(time::sleep(self.settings.debounce_window)));
                        }
                    }
                    Some(Command::Close) => {
                        pending = None;
                        policy.reset();
                        if active.take().is_some() {
                            decoder.reset();
                            let _ = self.event_tx.send(StreamEvent::Disconnected).await;
                        }
                        tracing::info!("stream closed by caller");
                    }
                    None => break,
                },

                () = wait_timer(&mut pending), if pending.is_some() => {
                    pending = None;

                    if self.filters.is_empty() {
                        continue;
                    }

                    // A new attempt supersedes the prior connection: drop
                    // its stream before the open so at most one transport
                    // handle is live at any point.
                    if active.take().is_some() {
                        decoder.reset();
                    }

                    let params = self.filters.params();
                    tracing::info!(
                        track = %params.track,
                        locations = %params.locations,
                        follow = %params.follow,
                        "opening streaming connection"
                    );

                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        result = self.transport.open(&params) => match result {
                            Ok(stream) => {
                                active = Some(stream);
                                policy.reset();
                                stall_deadline =
                                    Instant::now() + self.settings.stall_timeout;
                                let _ =
                                    self.event_tx.send(StreamEvent::Connected).await;
                            }
                            Err(error) => {
                                self.handle_failure(&mut policy, &mut pending, error)
                                    .await;
                            }
                        }
                    }
                }

                chunk = next_chunk(&mut active), if active.is_some() => match chunk {
                    Some(Ok(bytes)) => {
                        stall_deadline = Instant::now() + self.settings.stall_timeout;

                        for decoded in decoder.feed(&bytes) {
                            let event = match decoded {
                                Ok(value) => {
                                    tracing::trace!("decoded record");
                                    StreamEvent::Record(value)
                                }
                                Err(err) => {
                                    tracing::warn!(
                                        segment = %err.segment,
                                        error = %err.source,
                                        "dropping malformed record segment"
                                    );
                                    StreamEvent::DecodeFailure {
                                        segment: err.segment,
                                        reason: err.source.to_string(),
                                    }
                                }
                            };
                            let _ = self.event_tx.send(event).await;
                        }
                    }
                    Some(Err(error)) => {
                        active = None;
                        decoder.reset();
                        self.handle_failure(&mut policy, &mut pending, error).await;
                    }
                    None => {
                        active = None;
                        decoder.reset();
                        self.handle_failure(
                            &mut policy,
                            &mut pending,
                            TransportError::StreamEnded,
                        )
                        .await;
                    }
                },

                () = time::sleep_until(stall_deadline), if active.is_some() => {
                    active = None;
                    decoder.reset();
                    self.handle_failure(
                        &mut policy,
                        &mut pending,
                        TransportError::Stalled(self.settings.stall_timeout),
                    )
                    .await;
                }
            }
        }
    }

    /// Report a transport failure and schedule the retry.
    async fn handle_failure(
        &self,
        policy: &mut ReconnectPolicy,
        pending: &mut Option<Pin<Box<Sleep>>>,
        error: TransportError,
    ) {
        match policy.next_delay() {
            Some(delay) => {
                let attempt = policy.attempt_count();
                tracing::warn!(
                    %error,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "stream failed, scheduling reconnect"
                );
                let _ = self
                    .event_tx
                    .send(StreamEvent::Reconnecting { attempt, error })
                    .await;
                *pending = Some(Box::pin(time::sleep(delay)));
            }
            None => {
                tracing::error!(%error, "stream failed and retry attempts are exhausted");
                let _ = self.event_tx.send(StreamEvent::RetriesExhausted).await;
                // Next mutation starts a fresh cycle
                policy.reset();
            }
        }
    }
}

/// Await a pending timer, or never resolve when none is armed.
async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Await the next chunk of the active stream, or never resolve when idle.
async fn next_chunk(stream: &mut Option<ByteStream>) -> Option<Result<Bytes, TransportError>> {
    match stream.as_mut() {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

//! Client Facade
//!
//! Public entry point for the filtered streaming client. Validates
//! credentials once at construction, owns the shared filter set, and
//! drives the connection supervisor task through commands. Mutation calls
//! return immediately; all connection work happens asynchronously and
//! results arrive on the event channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::StreamTransport;
use crate::domain::filter::{FilterCategory, FilterSet};
use crate::infrastructure::config::{ClientConfig, CredentialError};
use crate::infrastructure::firehose::connection::{Command, ConnectionSupervisor, StreamEvent};

/// Filtered streaming feed client.
///
/// Subscriptions are refcounted per category: subscribing the same term
/// twice requires two unsubscribes before it leaves the request
/// parameters. Bursts of mutations coalesce into a single reconnect.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use firehose_client::{
///     ClientConfig, Credentials, FilterCategory, FirehoseClient, StreamEvent, StreamTransport,
/// };
///
/// # async fn run(transport: Arc<dyn StreamTransport>) {
/// let credentials = Credentials::new("key", "secret", "token", "tokenSecret").unwrap();
/// let (client, mut events) =
///     FirehoseClient::new(ClientConfig::new(credentials), transport).unwrap();
///
/// client.subscribe(FilterCategory::Track, "tacos");
///
/// while let Some(event) = events.recv().await {
///     if let StreamEvent::Record(record) = event {
///         println!("{record}");
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct FirehoseClient {
    filters: Arc<FilterSet>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl FirehoseClient {
    /// Create a client and spawn its connection supervisor.
    ///
    /// Must be called from within a tokio runtime. Returns the client and
    /// the receiver for [`StreamEvent`] notifications. No connection is
    /// opened until the first subscription.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if any of the four credential fields is
    /// missing or empty. This is the only synchronous failure; everything
    /// on the streaming path is delivered as an event.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn StreamTransport>,
    ) -> Result<(Self, mpsc::Receiver<StreamEvent>), CredentialError> {
        config.credentials.validate()?;

        let filters = Arc::new(FilterSet::new());
        let (event_tx, event_rx) = mpsc::channel(config.stream.event_capacity);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let supervisor = ConnectionSupervisor::new(
            Arc::clone(&filters),
            transport,
            config.stream,
            event_tx,
            cmd_rx,
            cancel.clone(),
        );
        tokio::spawn(supervisor.run());

        Ok((
            Self {
                filters,
                cmd_tx,
                cancel,
            },
            event_rx,
        ))
    }

    /// Subscribe to a term, scheduling a debounced reconnect.
    pub fn subscribe(&self, category: FilterCategory, term: &str) {
        self.subscribe_with(category, term, true);
    }

    /// Subscribe to a term, optionally suppressing the reconnect.
    ///
    /// With `reconnect = false` the filter state is updated but the
    /// connection is left untouched — useful for bulk setup where the
    /// caller triggers one reconnect at the end.
    pub fn subscribe_with(&self, category: FilterCategory, term: &str, reconnect: bool) {
        let count = self.filters.add(category, term);
        tracing::debug!(category = category.as_str(), term, count, "filter added");
        if reconnect {
            let _ = self.cmd_tx.send(Command::Refresh);
        }
    }

    /// Unsubscribe from a term.
    ///
    /// Drops the term from the request parameters once its refcount
    /// reaches zero; removing the last active term across all categories
    /// closes the connection immediately. Unsubscribing a term that was
    /// never subscribed is a no-op.
    pub fn unsubscribe(&self, category: FilterCategory, term: &str) {
        let count = self.filters.remove(category, term);
        tracing::debug!(category = category.as_str(), term, count, "filter removed");
        let _ = self.cmd_tx.send(Command::Refresh);
    }

    /// Get the active terms for a category, in first-insertion order.
    #[must_use]
    pub fn active_members(&self, category: FilterCategory) -> Vec<String> {
        self.filters.active_members(category)
    }

    /// Get the active keyword filters.
    #[must_use]
    pub fn tracking(&self) -> Vec<String> {
        self.active_members(FilterCategory::Track)
    }

    /// Get the active bounding-box filters.
    #[must_use]
    pub fn locations(&self) -> Vec<String> {
        self.active_members(FilterCategory::Location)
    }

    /// Get the active followed entity IDs.
    #[must_use]
    pub fn following(&self) -> Vec<String> {
        self.active_members(FilterCategory::Follow)
    }

    /// Tear down the connection and any pending reconnect.
    ///
    /// Not terminal: a later subscription re-opens the stream.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
    }

    /// Stop the supervisor task permanently.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FirehoseClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

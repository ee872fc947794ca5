use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use crate::ChangeEvent;
use crate::EngineEvent;
use crate::EngineSettings;
use crate::FetchFailure;

pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(FetchFailure) + Send + Sync>;

/// Immutable parameters of one engine instance.
///
/// Both callbacks run on whatever tokio worker executes the sampling cycle.
/// Consumers that need another execution context marshal inside the
/// callback, or use [`EngineConfig::channel`].
#[derive(Clone)]
pub struct EngineConfig {
    /// Time between two scheduler ticks
    pub interval: Duration,
    pub on_change: ChangeCallback,
    pub on_error: ErrorCallback,
    /// Per-fetch upper bound; `None` trusts the source's own latency bound
    pub fetch_timeout: Option<Duration>,
    /// Label for logs and metrics
    pub name: Option<String>,
}

impl EngineConfig {
    pub fn new(
        interval: Duration,
        on_change: impl Fn(ChangeEvent) + Send + Sync + 'static,
        on_error: impl Fn(FetchFailure) + Send + Sync + 'static,
    ) -> Self {
        Self {
            interval,
            on_change: Arc::new(on_change),
            on_error: Arc::new(on_error),
            fetch_timeout: None,
            name: None,
        }
    }

    /// Config whose callbacks forward every event into an unbounded channel.
    ///
    /// Events sent after the receiver is dropped are discarded.
    pub fn channel(interval: Duration) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let error_tx = tx.clone();

        let config = Self::new(
            interval,
            move |event| {
                if tx.send(EngineEvent::Changed(event)).is_err() {
                    trace!("event receiver dropped, change discarded");
                }
            },
            move |failure| {
                if error_tx.send(EngineEvent::Failed(failure)).is_err() {
                    trace!("event receiver dropped, failure discarded");
                }
            },
        );
        (config, rx)
    }

    pub fn with_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fetch_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Overlays interval, timeout and name from file/env settings.
    pub fn with_settings(
        mut self,
        settings: &EngineSettings,
    ) -> Self {
        self.interval = settings.interval();
        if let Some(timeout) = settings.fetch_timeout() {
            self.fetch_timeout = Some(timeout);
        }
        if let Some(name) = &settings.name {
            self.name = Some(name.clone());
        }
        self
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("interval", &self.interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

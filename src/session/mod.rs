//! A session is one bounded run of the samplers followed by finalization.
//!
//! [SessionController] walks through `Idle -> Running -> Stopping -> Done`. The session ends
//! either when its duration elapses or when the external cancellation token fires; both paths
//! share the same stop and finalize sequence.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    collection::{keys::KeyCaptureSampler, poller::ActivityPoller},
    events::{EventKind, EventStore},
    utils::{clock::Clock, dir::ensure_dir},
    window_api::{clipboard::ClipboardReader, keyboard::KeySource, WindowManager},
};

use finalizer::Finalizer;

pub mod finalizer;
pub mod shutdown;

pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(25 * 60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_duration: Duration,
    pub poll_interval: Duration,
    pub output_directory: PathBuf,
}

impl SessionConfig {
    pub fn new(output_directory: PathBuf) -> Self {
        Self {
            session_duration: DEFAULT_SESSION_DURATION,
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_directory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Done,
}

impl SessionState {
    pub fn can_advance_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Idle, SessionState::Running)
                | (SessionState::Running, SessionState::Stopping)
                | (SessionState::Stopping, SessionState::Done)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Elapsed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub started_at: DateTime<Local>,
    pub ended_by: EndReason,
    pub log_path: PathBuf,
    pub analysis_url: String,
    pub event_count: usize,
}

/// Platform access a session needs. Each one is consumed by the session that runs.
pub struct Collaborators {
    pub windows: Box<dyn WindowManager>,
    pub clipboard: Box<dyn ClipboardReader>,
    pub keys: Box<dyn KeySource>,
}

pub struct SessionController {
    config: SessionConfig,
    state: SessionState,
    store: Arc<EventStore>,
    collaborators: Option<Collaborators>,
    cancel: CancellationToken,
    time_provider: Arc<dyn Clock>,
}

async fn wait_for_end(
    clock: Arc<dyn Clock>,
    duration: Duration,
    cancel: CancellationToken,
) -> EndReason {
    tokio::select! {
        _ = cancel.cancelled() => EndReason::Cancelled,
        _ = clock.sleep(duration) => EndReason::Elapsed,
    }
}

impl SessionController {
    /// `cancel` ends the session early. Cancelling it after the session has finished has no
    /// effect.
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        cancel: CancellationToken,
        time_provider: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            store: Arc::new(EventStore::new(time_provider.clone())),
            collaborators: Some(collaborators),
            cancel,
            time_provider,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            bail!("Session can't move from {:?} to {:?}", self.state, next);
        }
        info!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the whole session and returns once the log has been written.
    pub async fn run(&mut self) -> Result<SessionReport> {
        if self.state != SessionState::Idle {
            bail!("Session has already been started");
        }
        // Fail before capturing anything rather than after a whole session.
        ensure_dir(&self.config.output_directory)?;
        let Collaborators {
            windows,
            clipboard,
            mut keys,
        } = self
            .collaborators
            .take()
            .ok_or_else(|| anyhow!("Session collaborators are missing"))?;

        self.advance(SessionState::Running)?;
        let started_at = self.time_provider.time();
        info!(
            "Session started for {:?}, polling every {:?}",
            self.config.session_duration, self.config.poll_interval
        );

        let subscription = match KeyCaptureSampler::start(self.store.clone(), keys.as_mut()) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!("Keyboard capture is unavailable {e:?}");
                self.store.append(
                    EventKind::SystemError,
                    format!("Keyboard capture unavailable: {e}"),
                );
                None
            }
        };

        let running = self.cancel.child_token();
        let poller = ActivityPoller::new(
            self.store.clone(),
            clipboard,
            windows,
            running.clone(),
            self.config.poll_interval,
            self.time_provider.clone(),
        );
        let wait = wait_for_end(
            self.time_provider.clone(),
            self.config.session_duration,
            self.cancel.clone(),
        );

        let (ended_by, ()) = tokio::join!(
            async {
                let ended_by = wait.await;
                running.cancel();
                ended_by
            },
            poller.run(),
        );

        self.advance(SessionState::Stopping)?;
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            info!("Key capture stopped");
        }

        let finalized = Finalizer::new(
            self.config.output_directory.clone(),
            self.time_provider.clone(),
        )
        .finalize(&self.store)
        .await?;
        self.advance(SessionState::Done)?;

        Ok(SessionReport {
            started_at,
            ended_by,
            log_path: finalized.path,
            analysis_url: finalized.analysis_url,
            event_count: finalized.event_count,
        })
    }
}

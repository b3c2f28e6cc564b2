use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::{
    events::{EventKind, EventStore},
    utils::clock::Clock,
    window_api::{clipboard::ClipboardReader, WindowManager},
};

/// Clipboard payloads longer than this many characters are cut and marked with
/// [TRUNCATION_MARKER].
pub const CLIPBOARD_PREVIEW_CHARS: usize = 100;
pub const TRUNCATION_MARKER: &str = "...";

pub fn clipboard_preview(text: &str) -> String {
    match text.char_indices().nth(CLIPBOARD_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Polls the clipboard and the foreground window on a fixed interval and records changes.
pub struct ActivityPoller {
    store: Arc<EventStore>,
    clipboard: Box<dyn ClipboardReader>,
    windows: Box<dyn WindowManager>,
    stop: CancellationToken,
    poll_interval: Duration,
    time_provider: Arc<dyn Clock>,
    // Full last seen values, only used for change detection.
    last_clipboard: String,
    last_window_title: String,
}

impl ActivityPoller {
    pub fn new(
        store: Arc<EventStore>,
        clipboard: Box<dyn ClipboardReader>,
        windows: Box<dyn WindowManager>,
        stop: CancellationToken,
        poll_interval: Duration,
        time_provider: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clipboard,
            windows,
            stop,
            poll_interval,
            time_provider,
            last_clipboard: String::new(),
            last_window_title: String::new(),
        }
    }

    fn poll_clipboard(&mut self) {
        match self.clipboard.read_text() {
            Ok(text) => {
                if text != self.last_clipboard && !text.trim().is_empty() {
                    debug!("Clipboard changed");
                    self.store
                        .append(EventKind::ClipboardCopy, clipboard_preview(&text));
                    self.last_clipboard = text;
                }
            }
            Err(e) => {
                self.store
                    .append(EventKind::SystemError, format!("Monitoring error: {e}"));
            }
        }
    }

    fn poll_window(&mut self) {
        match self.windows.get_active_window_title() {
            Ok(Some(title)) => {
                if title != self.last_window_title && !title.trim().is_empty() {
                    debug!("Active window changed to {title:?}");
                    self.store.append(EventKind::WindowChange, title.clone());
                    self.last_window_title = title;
                }
            }
            Ok(None) => debug!("No active window"),
            // Missing or unreadable windows are normal while switching desktops or locking the
            // screen.
            Err(e) => debug!("Couldn't read active window {e:?}"),
        }
    }

    /// Executes the polling loop until the stop token is cancelled.
    pub async fn run(mut self) {
        info!("Activity polling started every {:?}", self.poll_interval);
        let mut collection_point = Some(self.time_provider.instant());
        loop {
            collection_point = collection_point.and_then(|v| v.checked_add(self.poll_interval));

            {
                let _span = info_span!("Polling clipboard and window").entered();
                self.poll_clipboard();
                self.poll_window();
            }

            // An interval too large to schedule means there is no next poll.
            let Some(next_poll) = collection_point else {
                self.stop.cancelled().await;
                info!("Activity polling stopped");
                return;
            };

            tokio::select! {
                _ = self.stop.cancelled() => {
                    info!("Activity polling stopped");
                    return;
                }
                _ = self.time_provider.sleep_until(next_poll) => ()
            }
        }
    }
}

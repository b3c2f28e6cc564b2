use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    events::{EventKind, EventStore},
    window_api::keyboard::{KeyPress, KeySource, KeySubscription},
};

/// Text that gets logged for a key press: the produced character when it is printable, the key
/// name otherwise.
pub fn describe_key(press: &KeyPress) -> String {
    match press.text.as_deref() {
        Some(text) if !text.is_empty() && !text.chars().any(char::is_control) => text.to_string(),
        _ => press.key.clone(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown failure".to_string()
    }
}

/// Appends one keystroke. A failure while working out the payload is recorded as a placeholder
/// instead of unwinding into the platform hook.
pub fn record_keystroke(store: &EventStore, describe: impl FnOnce() -> String) {
    let payload = match panic::catch_unwind(AssertUnwindSafe(describe)) {
        Ok(payload) => payload,
        Err(e) => {
            let message = panic_message(e.as_ref());
            warn!("Failed to read key press {message}");
            format!("[ERROR: {message}]")
        }
    };
    store.append(EventKind::Keystroke, payload);
}

/// Feeds key presses from a [KeySource] into the [EventStore].
pub struct KeyCaptureSampler;

impl KeyCaptureSampler {
    /// Subscribes to `source`. Capture lasts until the returned subscription is unsubscribed or
    /// dropped.
    pub fn start(store: Arc<EventStore>, source: &mut dyn KeySource) -> Result<KeySubscription> {
        let subscription = source.subscribe(Box::new(move |press: KeyPress| {
            record_keystroke(&store, || describe_key(&press));
        }))?;
        info!("Key capture started");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;

    use crate::{
        events::{EventKind, EventStore},
        utils::clock::test_clock::TestClock,
        window_api::keyboard::{KeyCallback, KeyDispatcher, KeyPress, KeySource, KeySubscription},
    };

    use super::{describe_key, record_keystroke, KeyCaptureSampler};

    struct FakeKeySource {
        dispatcher: KeyDispatcher,
    }

    impl KeySource for FakeKeySource {
        fn subscribe(&mut self, on_press: KeyCallback) -> Result<KeySubscription> {
            Ok(self.dispatcher.install(on_press))
        }
    }

    fn payloads(store: &EventStore) -> Vec<String> {
        store.snapshot().into_iter().map(|v| v.payload).collect()
    }

    #[test]
    fn printable_text_wins_over_key_name() {
        assert_eq!(describe_key(&KeyPress::with_text("KeyA", "a")), "a");
        assert_eq!(describe_key(&KeyPress::with_text("Space", " ")), " ");
        assert_eq!(describe_key(&KeyPress::with_text("Return", "\r")), "Return");
        assert_eq!(describe_key(&KeyPress::with_text("Backspace", "")), "Backspace");
        assert_eq!(describe_key(&KeyPress::named("LeftArrow")), "LeftArrow");
    }

    #[tokio::test]
    async fn panicking_key_is_logged_as_placeholder() {
        let store = EventStore::new(Arc::new(TestClock::new()));

        record_keystroke(&store, || panic!("bad key"));
        record_keystroke(&store, || "b".to_string());

        assert_eq!(payloads(&store), vec!["[ERROR: bad key]", "b"]);
    }

    #[tokio::test]
    async fn captures_until_unsubscribed() -> Result<()> {
        let store = Arc::new(EventStore::new(Arc::new(TestClock::new())));
        let dispatcher = KeyDispatcher::new();
        let mut source = FakeKeySource {
            dispatcher: dispatcher.clone(),
        };

        let subscription = KeyCaptureSampler::start(store.clone(), &mut source)?;
        dispatcher.deliver(KeyPress::with_text("KeyH", "h"));
        dispatcher.deliver(KeyPress::named("F5"));
        subscription.unsubscribe();
        dispatcher.deliver(KeyPress::with_text("KeyI", "i"));

        let snapshot = store.snapshot();
        assert!(snapshot.iter().all(|v| v.kind == EventKind::Keystroke));
        assert_eq!(payloads(&store), vec!["h", "F5"]);
        Ok(())
    }
}

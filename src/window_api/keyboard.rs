//! Global key press subscription.
//!
//! A [KeySource] hands out a [KeySubscription] for a callback. Delivery goes through a
//! [KeyDispatcher] which holds the callback slot behind a mutex: delivering a press locks the
//! slot for the duration of the callback and unsubscribing clears it under the same lock, so once
//! [KeySubscription::unsubscribe] returns the callback is never invoked again.
//!
//! The rdev backend can't stop its OS hook, so the hook itself stays installed until the process
//! exits. Only delivery ends with the subscription.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

/// One key press as reported by the platform hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// Name of the physical key, for example `KeyA`, `Return` or `F5`.
    pub key: String,
    /// Text the key produced, if any.
    pub text: Option<String>,
}

impl KeyPress {
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: None,
        }
    }

    pub fn with_text(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: Some(text.into()),
        }
    }
}

pub type KeyCallback = Box<dyn FnMut(KeyPress) + Send>;

struct Subscriber {
    id: u64,
    callback: KeyCallback,
}

#[derive(Default)]
struct SlotState {
    next_id: u64,
    current: Option<Subscriber>,
}

type Slot = Arc<Mutex<SlotState>>;

fn lock(slot: &Slot) -> MutexGuard<'_, SlotState> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Routes presses from a platform hook to at most one subscriber.
#[derive(Clone, Default)]
pub struct KeyDispatcher {
    slot: Slot,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `callback`, replacing whatever was subscribed before.
    pub fn install(&self, callback: KeyCallback) -> KeySubscription {
        let mut state = lock(&self.slot);
        let id = state.next_id;
        state.next_id += 1;
        state.current = Some(Subscriber { id, callback });
        KeySubscription {
            id,
            slot: self.slot.clone(),
        }
    }

    /// Hands `press` to the current subscriber. Returns false when nobody is subscribed.
    pub fn deliver(&self, press: KeyPress) -> bool {
        match lock(&self.slot).current.as_mut() {
            Some(subscriber) => {
                (subscriber.callback)(press);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.slot).current.is_some()
    }
}

/// Live subscription. Dropping it has the same effect as [KeySubscription::unsubscribe], which
/// keeps the global hook from outliving the session on every exit path.
pub struct KeySubscription {
    id: u64,
    slot: Slot,
}

impl KeySubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        let mut state = lock(&self.slot);
        // A newer subscription may have replaced this one already.
        if state.current.as_ref().is_some_and(|v| v.id == self.id) {
            state.current = None;
        }
    }
}

/// Source of global key presses.
pub trait KeySource {
    fn subscribe(&mut self, on_press: KeyCallback) -> Result<KeySubscription>;
}

/// Serves as a cross-compatible KeySource implementation.
pub struct GenericKeySource {
    inner: Box<dyn KeySource>,
}

impl GenericKeySource {
    pub fn new() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "hook")] {
                Self {
                    inner: Box::new(rdev_hook::RdevKeySource),
                }
            } else {
                Self {
                    inner: Box::new(UnsupportedKeySource),
                }
            }
        }
    }
}

impl Default for GenericKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for GenericKeySource {
    fn subscribe(&mut self, on_press: KeyCallback) -> Result<KeySubscription> {
        self.inner.subscribe(on_press)
    }
}

pub struct UnsupportedKeySource;

impl KeySource for UnsupportedKeySource {
    fn subscribe(&mut self, _on_press: KeyCallback) -> Result<KeySubscription> {
        anyhow::bail!("keyboard hook support was not compiled in")
    }
}

#[cfg(feature = "hook")]
mod rdev_hook {
    use std::sync::OnceLock;

    use anyhow::Result;
    use rdev::{Event, EventType};
    use tracing::{error, info};

    use super::{KeyCallback, KeyDispatcher, KeyPress, KeySource, KeySubscription};

    // rdev::listen never returns, so the hook thread is started once and lives for the whole
    // process. Subscriptions only swap the callback it forwards to.
    static DISPATCHER: OnceLock<KeyDispatcher> = OnceLock::new();

    fn dispatcher() -> &'static KeyDispatcher {
        DISPATCHER.get_or_init(|| {
            let dispatcher = KeyDispatcher::new();
            let hook = dispatcher.clone();
            std::thread::spawn(move || {
                info!("Starting global keyboard hook");
                if let Err(e) = rdev::listen(move |event: Event| {
                    if let EventType::KeyPress(key) = event.event_type {
                        hook.deliver(KeyPress {
                            key: format!("{key:?}"),
                            text: event.name,
                        });
                    }
                }) {
                    error!("Keyboard hook stopped {e:?}");
                }
            });
            dispatcher
        })
    }

    pub struct RdevKeySource;

    impl KeySource for RdevKeySource {
        fn subscribe(&mut self, on_press: KeyCallback) -> Result<KeySubscription> {
            Ok(dispatcher().install(on_press))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{KeyDispatcher, KeyPress};

    #[test]
    fn nothing_is_delivered_after_unsubscribe() {
        let dispatcher = KeyDispatcher::new();
        let seen = Arc::new(Mutex::new(vec![]));

        let sink = seen.clone();
        let subscription = dispatcher.install(Box::new(move |press: KeyPress| {
            sink.lock().unwrap().push(press.key)
        }));

        assert!(dispatcher.deliver(KeyPress::with_text("KeyA", "a")));
        subscription.unsubscribe();
        assert!(!dispatcher.deliver(KeyPress::named("Return")));

        assert_eq!(*seen.lock().unwrap(), vec!["KeyA".to_string()]);
        assert!(!dispatcher.is_subscribed());
    }

    #[test]
    fn stale_subscription_does_not_remove_newer_one() {
        let dispatcher = KeyDispatcher::new();
        let old = dispatcher.install(Box::new(|_: KeyPress| {}));
        let _new = dispatcher.install(Box::new(|_: KeyPress| {}));

        drop(old);

        assert!(dispatcher.is_subscribed());
    }

    #[test]
    fn dropping_the_subscription_unsubscribes() {
        let dispatcher = KeyDispatcher::new();
        {
            let _subscription = dispatcher.install(Box::new(|_: KeyPress| {}));
            assert!(dispatcher.is_subscribed());
        }
        assert!(!dispatcher.is_subscribed());
    }
}

//! Contains the operating system collaborators the samplers read from.
//! [GenericWindowManager], [clipboard::GenericClipboard] and [keyboard::GenericKeySource] are
//! the main artifacts of this module and pick the platform implementation at compile time.

pub mod clipboard;
pub mod keyboard;
#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::{anyhow, Result};
#[cfg(test)]
use mockall::automock;
use tracing::warn;

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, automock)]
pub trait WindowManager {
    /// Title of the foreground window, for example 'Vibing in YouTube - Chrome'. `None` when no
    /// window currently has focus.
    fn get_active_window_title(&mut self) -> Result<Option<String>>;
}

/// Serves as a cross-compatible WindowManager implementation.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    /// Picks the platform implementation. A platform that can't be reached (no X display, for
    /// example) degrades to [UnsupportedWindowManager] so the other samplers keep running.
    pub fn new() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowManager;
                Self::or_unsupported(Ok(Box::new(WindowsWindowManager::new())))
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowManager;
                Self::or_unsupported(
                    LinuxWindowManager::new().map(|v| Box::new(v) as Box<dyn WindowManager>),
                )
            }
            else {
                Self::or_unsupported(Err(anyhow!("No window manager was compiled in")))
            }
        }
    }

    pub fn or_unsupported(manager: Result<Box<dyn WindowManager>>) -> Self {
        let inner = manager.unwrap_or_else(|e| {
            warn!("Window changes won't be recorded {e:?}");
            Box::new(UnsupportedWindowManager)
        });
        Self { inner }
    }
}

impl Default for GenericWindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager for GenericWindowManager {
    fn get_active_window_title(&mut self) -> Result<Option<String>> {
        self.inner.get_active_window_title()
    }
}

/// Used when no platform window manager is available. Every read fails, which samplers treat as
/// "nothing changed".
pub struct UnsupportedWindowManager;

impl WindowManager for UnsupportedWindowManager {
    fn get_active_window_title(&mut self) -> Result<Option<String>> {
        Err(anyhow!("No window manager is available"))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{GenericWindowManager, MockWindowManager, WindowManager};

    #[test]
    fn unreachable_platform_falls_back_to_failing_reads() {
        let mut manager = GenericWindowManager::or_unsupported(Err(anyhow!("no display")));

        assert!(manager.get_active_window_title().is_err());
        assert!(manager.get_active_window_title().is_err());
    }

    #[test]
    fn reachable_platform_is_used() {
        let mut mock = MockWindowManager::new();
        mock.expect_get_active_window_title()
            .returning(|| Ok(Some("Editor".to_string())));

        let mut manager = GenericWindowManager::or_unsupported(Ok(Box::new(mock)));

        assert_eq!(manager.get_active_window_title().unwrap(), Some("Editor".to_string()));
    }
}

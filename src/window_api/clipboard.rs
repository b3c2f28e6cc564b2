use anyhow::Result;
#[cfg(test)]
use mockall::automock;
use tracing::instrument;

/// Read access to the system clipboard.
#[cfg_attr(test, automock)]
pub trait ClipboardReader {
    /// Current text content. A clipboard holding nothing, or nothing textual, reads as an empty
    /// string.
    fn read_text(&mut self) -> Result<String>;
}

/// [ClipboardReader] backed by [arboard]. The underlying handle is opened lazily and reopened
/// after a failure, so one broken read doesn't poison the rest of the session.
pub struct GenericClipboard {
    inner: Option<arboard::Clipboard>,
}

impl GenericClipboard {
    pub fn new() -> Self {
        Self { inner: None }
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard> {
        let clipboard = match self.inner.take() {
            Some(v) => v,
            None => arboard::Clipboard::new()?,
        };
        Ok(self.inner.insert(clipboard))
    }
}

impl Default for GenericClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardReader for GenericClipboard {
    #[instrument(skip(self))]
    fn read_text(&mut self) -> Result<String> {
        let result = self.clipboard()?.get_text();
        match result {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => {
                self.inner = None;
                Err(e.into())
            }
        }
    }
}

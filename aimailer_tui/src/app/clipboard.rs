use arboard::Clipboard;

enum Backend {
    System(Clipboard),
    #[cfg(test)]
    Memory(Vec<String>),
    Unavailable,
}

/// Best-effort system clipboard. Failures are logged, never surfaced.
pub struct ClipboardService {
    backend: Backend,
}

impl ClipboardService {
    pub fn new() -> Self {
        let backend = match Clipboard::new() {
            Ok(clipboard) => Backend::System(clipboard),
            Err(err) => {
                tracing::warn!(error = %err, "clipboard unavailable");
                Backend::Unavailable
            }
        };
        Self { backend }
    }

    #[cfg(test)]
    pub fn unavailable() -> Self {
        Self {
            backend: Backend::Unavailable,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Vec::new()),
        }
    }

    #[cfg(test)]
    pub fn last_copied(&self) -> Option<&str> {
        match &self.backend {
            Backend::Memory(items) => items.last().map(String::as_str),
            _ => None,
        }
    }

    /// Returns true when the text reached the clipboard.
    pub fn copy(&mut self, text: &str) -> bool {
        match &mut self.backend {
            Backend::System(clipboard) => match clipboard.set_text(text.to_string()) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "clipboard write failed");
                    false
                }
            },
            #[cfg(test)]
            Backend::Memory(items) => {
                items.push(text.to_string());
                true
            }
            Backend::Unavailable => {
                tracing::warn!("clipboard write skipped: no clipboard available");
                false
            }
        }
    }
}

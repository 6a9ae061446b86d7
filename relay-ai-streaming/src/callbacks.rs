//! Lifecycle callbacks.
//!
//! [`StreamCallbacks`] holds the observer hooks a caller registers;
//! [`CallbackDriver`] fires them with the once-only guarantees the
//! aggregator relies on.

use std::fmt;

type StartFn = Box<dyn FnMut() + Send>;
type TextFn = Box<dyn FnMut(&str) + Send>;

/// Observer hooks for one output stream.
#[derive(Default)]
pub struct StreamCallbacks {
    on_start: Option<StartFn>,
    on_token: Option<TextFn>,
    on_completion: Option<TextFn>,
    on_final: Option<TextFn>,
}

impl fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_token", &self.on_token.is_some())
            .field("on_completion", &self.on_completion.is_some())
            .field("on_final", &self.on_final.is_some())
            .finish()
    }
}

impl StreamCallbacks {
    /// Create an empty set of callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once when the top-level stream starts. Not called for
    /// continuations.
    #[must_use]
    pub fn with_on_start(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called for every extracted text fragment.
    #[must_use]
    pub fn with_on_token(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_token = Some(Box::new(f));
        self
    }

    /// Called with the full text of each upstream stream when it ends.
    #[must_use]
    pub fn with_on_completion(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_completion = Some(Box::new(f));
        self
    }

    /// Called exactly once at the very end, on every exit path.
    #[must_use]
    pub fn with_on_final(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_final = Some(Box::new(f));
        self
    }
}

/// Fires [`StreamCallbacks`] for one output stream.
#[derive(Debug)]
pub struct CallbackDriver {
    callbacks: StreamCallbacks,
    started: bool,
    finalized: bool,
}

impl CallbackDriver {
    /// Create a driver.
    #[must_use]
    pub fn new(callbacks: StreamCallbacks) -> Self {
        Self {
            callbacks,
            started: false,
            finalized: false,
        }
    }

    /// Fire `on_start` if it has not fired yet.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(on_start) = self.callbacks.on_start.as_mut() {
            on_start();
        }
    }

    /// Fire `on_token`.
    pub fn token(&mut self, text: &str) {
        if let Some(on_token) = self.callbacks.on_token.as_mut() {
            on_token(text);
        }
    }

    /// Fire `on_completion`.
    pub fn completion(&mut self, text: &str) {
        if let Some(on_completion) = self.callbacks.on_completion.as_mut() {
            on_completion(text);
        }
    }

    /// Fire `on_final` if it has not fired yet.
    pub fn finish(&mut self, text: &str) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if let Some(on_final) = self.callbacks.on_final.as_mut() {
            on_final(text);
        }
    }

    /// Whether `on_final` has fired.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

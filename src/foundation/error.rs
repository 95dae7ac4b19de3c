/// Convenience result type used across voxreel.
pub type NarrationResult<T> = Result<T, NarrationError>;

/// Top-level error taxonomy for a narration run.
///
/// Only [`NarrationError::RateLimit`] is recovered locally (by the synthesizer's retry loop).
/// Every other kind aborts the run after resources are released.
#[derive(thiserror::Error, Debug)]
pub enum NarrationError {
    /// Empty or invalid text, or an unsupported voice id.
    #[error("input error: {0}")]
    Input(String),

    /// The speech service asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Non rate-limit failure reported by (or while talking to) the speech service.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Rate-limit retries were used up.
    #[error("synthesis retries exhausted after {attempts} attempts")]
    RetryExhausted {
        /// Total number of attempts made, including the first one.
        attempts: u32,
    },

    /// The background video is missing, unreadable or unusable.
    #[error("background load error: {0}")]
    BackgroundLoad(String),

    /// Internal accounting mismatch; always a defect.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Compositing or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid configuration or an unusable caption font.
    #[error("configuration error: {0}")]
    Config(String),

    /// The run was cancelled between stages.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Discriminant of [`NarrationError`], used by retry loops and callers that branch on kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`NarrationError::Input`].
    Input,
    /// See [`NarrationError::RateLimit`].
    RateLimit,
    /// See [`NarrationError::Synthesis`].
    Synthesis,
    /// See [`NarrationError::RetryExhausted`].
    RetryExhausted,
    /// See [`NarrationError::BackgroundLoad`].
    BackgroundLoad,
    /// See [`NarrationError::InvariantViolation`].
    InvariantViolation,
    /// See [`NarrationError::Render`].
    Render,
    /// See [`NarrationError::Config`].
    Config,
    /// See [`NarrationError::Cancelled`].
    Cancelled,
    /// See [`NarrationError::Other`].
    Other,
}

impl NarrationError {
    /// Build a [`NarrationError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`NarrationError::RateLimit`] value.
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::RateLimit(msg.into())
    }

    /// Build a [`NarrationError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`NarrationError::BackgroundLoad`] value.
    pub fn background(msg: impl Into<String>) -> Self {
        Self::BackgroundLoad(msg.into())
    }

    /// Build a [`NarrationError::InvariantViolation`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Build a [`NarrationError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`NarrationError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`NarrationError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::RateLimit(_) => ErrorKind::RateLimit,
            Self::Synthesis(_) => ErrorKind::Synthesis,
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Self::BackgroundLoad(_) => ErrorKind::BackgroundLoad,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::Render(_) => ErrorKind::Render,
            Self::Config(_) => ErrorKind::Config,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Return `true` for the only locally recoverable kind (rate limiting).
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RateLimit
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

use std::sync::Mutex;

/// Operator-facing message produced while serving a request.
///
/// Library code records these instead of printing; the CLI decides how to
/// show them. Every recorded message is also emitted through `tracing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Info(String),
    /// The request was served, but not the way it was asked for (e.g. from
    /// the mock dataset).
    Warning(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) => msg,
        }
    }

    fn trace(&self) {
        match self {
            Self::Info(msg) => tracing::info!("{msg}"),
            Self::Warning(msg) => tracing::warn!("{msg}"),
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
        }
    }
}

/// Shared buffer of feedback messages, drained by the caller.
#[derive(Debug, Default)]
pub struct FeedbackLog {
    entries: Mutex<Vec<Feedback>>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, feedback: Feedback) {
        feedback.trace();
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(feedback);
        }
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Feedback> {
        self.entries
            .lock()
            .map(|mut entries| std::mem::take(&mut *entries))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_severity() {
        assert_eq!(Feedback::info("msg").to_string(), "msg");
        assert_eq!(Feedback::warning("msg").to_string(), "warning: msg");
    }

    #[test]
    fn log_drains_in_order() {
        let log = FeedbackLog::new();
        log.record(Feedback::warning("first"));
        log.record(Feedback::info("second"));
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained[0].is_warning());
        assert_eq!(drained[1].message(), "second");
        assert!(log.is_empty());
    }
}

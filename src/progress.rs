//! Progress reporting sink for early-startup status lines.

use log::info;

/// Receives short status strings at pipeline checkpoints. Implementations
/// must be cheap; the pipeline calls this on its hot path.
pub trait ProgressSink: Send + Sync {
    fn update(&self, message: &str);
}

/// Discards all progress updates.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn update(&self, _message: &str) {}
}

/// Forwards progress updates to the log.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, message: &str) {
        info!("{message}");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::ProgressSink;
    use std::sync::Mutex;

    /// Records every update for assertions.
    #[derive(Default)]
    pub struct RecordingProgress {
        pub messages: Mutex<Vec<String>>,
    }

    impl ProgressSink for RecordingProgress {
        fn update(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }
}

#![forbid(unsafe_code)]

//! Level-tagged value logging.

use std::fmt::Debug;
use std::rc::Rc;

use crate::stream::Stream;

/// Level a [`Stream::debug`] tap logs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Error,
}

impl LogLevel {
    fn emit(self, label: &str, value: &dyn Debug) {
        match self {
            Self::Trace => tracing::trace!(label, ?value, "stream value"),
            Self::Debug => tracing::debug!(label, ?value, "stream value"),
            Self::Info => tracing::info!(label, ?value, "stream value"),
            Self::Error => tracing::error!(label, ?value, "stream value"),
        }
    }
}

impl<T: Debug + 'static, E: 'static> Stream<T, E> {
    /// Log every value at `level`, tagged with `label`.
    pub fn debug(self, level: LogLevel, label: impl Into<String>) -> Self {
        let label: Rc<str> = Rc::from(label.into());
        self.tap(move |value| level.emit(&label, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn debug_passes_values_through() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());
        let recorder = Recorder::new();
        recorder.record(&Stream::<u8, ()>::from_values([1, 2]).debug(LogLevel::Info, "numbers"));
        assert_eq!(recorder.values(), vec![1, 2]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn default_level_is_debug() {
        assert_eq!(LogLevel::default(), LogLevel::Debug);
    }
}

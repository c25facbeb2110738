use log::{LevelFilter, Log};

/// Fans every log record out to a set of loggers, each with its own level.
pub struct MultiLogger {
    loggers: Vec<(Box<dyn Log>, LevelFilter)>,
}

impl Default for MultiLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiLogger {
    pub fn new() -> Self {
        Self {
            loggers: Vec::new(),
        }
    }

    /// Adds a logger that receives records up to `level`.
    pub fn with_logger(mut self, logger: Box<dyn Log>, level: LevelFilter) -> Self {
        self.add_logger(logger, level);
        self
    }

    pub fn add_logger(&mut self, logger: Box<dyn Log>, level: LevelFilter) {
        self.loggers.push((logger, level));
    }

    /// Returns the most verbose level of all loggers.
    pub fn max_level(&self) -> LevelFilter {
        self.loggers
            .iter()
            .map(|(_, level)| *level)
            .max()
            .unwrap_or(LevelFilter::Off)
    }

    /// Installs the logger as the global logger.
    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(self.max_level());
        log::set_boxed_logger(Box::new(self))
    }

    fn accepting<'a>(
        &'a self,
        metadata: &'a log::Metadata,
    ) -> impl Iterator<Item = &'a dyn Log> + 'a {
        self.loggers
            .iter()
            .filter(move |(logger, level)| metadata.level() <= *level && logger.enabled(metadata))
            .map(|(logger, _)| logger.as_ref())
    }
}

impl Log for MultiLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.accepting(metadata).next().is_some()
    }

    fn log(&self, record: &log::Record) {
        self.accepting(record.metadata())
            .for_each(|logger| logger.log(record));
    }

    fn flush(&self) {
        self.loggers.iter().for_each(|(logger, _)| logger.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use log::Level;

    #[derive(Default)]
    struct CountingLogger {
        records: Arc<AtomicUsize>,
    }

    impl Log for CountingLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, _: &log::Record) {
            self.records.fetch_add(1, Ordering::Relaxed);
        }

        fn flush(&self) {}
    }

    #[test]
    fn test_max_level() {
        assert_eq!(MultiLogger::new().max_level(), LevelFilter::Off);

        let multi_logger = MultiLogger::new()
            .with_logger(Box::<CountingLogger>::default(), LevelFilter::Info)
            .with_logger(Box::<CountingLogger>::default(), LevelFilter::Trace);
        assert_eq!(multi_logger.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_levels() {
        let console = CountingLogger::default();
        let console_records = console.records.clone();
        let file = CountingLogger::default();
        let file_records = file.records.clone();

        let multi_logger = MultiLogger::new()
            .with_logger(Box::new(console), LevelFilter::Info)
            .with_logger(Box::new(file), LevelFilter::Trace);

        multi_logger.log(&log::Record::builder().level(Level::Info).build());
        multi_logger.log(&log::Record::builder().level(Level::Trace).build());

        assert_eq!(console_records.load(Ordering::Relaxed), 1);
        assert_eq!(file_records.load(Ordering::Relaxed), 2);

        assert!(multi_logger.enabled(&log::Metadata::builder().level(Level::Debug).build()));
        let multi_logger = MultiLogger::new().with_logger(
            Box::<CountingLogger>::default(),
            LevelFilter::Warn,
        );
        assert!(!multi_logger.enabled(&log::Metadata::builder().level(Level::Info).build()));
    }
}

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Error};
use log::{Log, Record};

use super::LogEntry;

/// Writes every log record to a file as a JSON line.
pub struct FileLog {
    target: Mutex<BufWriter<File>>,
}

impl FileLog {
    /// Creates the log file, truncating it if it exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::create(path.as_ref()).with_context(|| {
            format!("Failed to create log file '{}'", path.as_ref().display())
        })?;

        Ok(Self {
            target: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn into_logger(self) -> Box<dyn Log> {
        Box::new(self)
    }

    /// Best effort attempt to write the log entry to the file
    fn write_entry(&self, record: &Record) -> Result<(), Box<dyn std::error::Error + '_>> {
        let mut serialized = serde_json::to_string(&LogEntry::from(record))?;
        serialized.push('\n');

        let mut writer = self.target.lock()?;
        writer.write_all(serialized.as_bytes())?;
        Ok(())
    }
}

impl Log for FileLog {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let _ = self.write_entry(record);
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.target.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use log::Level;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_write_entries() {
        let test_dir = tempdir().unwrap();
        let target = test_dir.path().join("imagecustomizer.log");
        fs::write(&target, "stale content").unwrap();

        let logger = FileLog::new(&target).unwrap().into_logger();
        logger.log(
            &log::Record::builder()
                .args(format_args!("first"))
                .level(Level::Info)
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .args(format_args!("second"))
                .level(Level::Trace)
                .build(),
        );
        logger.flush();

        let contents = fs::read_to_string(&target).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert!(!contents.contains("stale content"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "first");
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[1]["level"], "trace");
    }

    #[test]
    fn test_create_failure() {
        let test_dir = tempdir().unwrap();
        // A directory cannot be opened as a log file.
        assert!(FileLog::new(test_dir.path()).is_err());
    }
}

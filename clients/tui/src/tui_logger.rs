use log::{Level, Log, Metadata, Record};
use std::sync::{Arc, Mutex};

const MAX_BUFFERED: usize = 100;

/// Routes `log` records into a buffer the log pane drains every frame.
pub struct TuiLogger {
    log_buffer: Arc<Mutex<Vec<String>>>,
    level: Level,
}

impl TuiLogger {
    pub fn new(level: Level) -> (Self, Arc<Mutex<Vec<String>>>) {
        let log_buffer = Arc::new(Mutex::new(Vec::new()));
        (
            TuiLogger {
                log_buffer: log_buffer.clone(),
                level,
            },
            log_buffer,
        )
    }
}

impl Log for TuiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let msg = match record.level() {
                Level::Warn | Level::Error => format!("{}: {}", record.level(), record.args()),
                _ => format!("{}", record.args()),
            };
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg);
                if buffer.len() > MAX_BUFFERED {
                    buffer.remove(0);
                }
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_bounded_and_filtered() {
        let (logger, buffer) = TuiLogger::new(Level::Info);
        for i in 0..150 {
            logger.log(
                &Record::builder()
                    .args(format_args!("line {i}"))
                    .level(Level::Info)
                    .build(),
            );
        }
        logger.log(
            &Record::builder()
                .args(format_args!("hidden"))
                .level(Level::Debug)
                .build(),
        );
        let buffer = buffer.lock().unwrap();
        assert_eq!(buffer.len(), MAX_BUFFERED);
        assert_eq!(buffer[0], "line 50");
        assert_eq!(buffer.last().unwrap(), "line 149");
    }

    #[test]
    fn test_warnings_are_prefixed() {
        let (logger, buffer) = TuiLogger::new(Level::Info);
        logger.log(
            &Record::builder()
                .args(format_args!("engine down"))
                .level(Level::Warn)
                .build(),
        );
        assert_eq!(buffer.lock().unwrap()[0], "WARN: engine down");
    }
}

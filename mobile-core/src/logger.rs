use std::fs::{File, OpenOptions};
use std::io::{self, Stdout};
use std::path::Path;

use anyhow::anyhow;
use slog::{b, o, Drain};

use crate::conf::logging::{Log, To};
use crate::Result;

pub use slog::Logger;

/// Routes the `log` facade used by the extensions into the slog root logger.
pub fn logger_init(logger: Logger, level: log::LevelFilter) -> Result<()> {
    log::set_boxed_logger(Box::new(LoggerEx(logger))).map_err(|e| anyhow!("logger init failed, {:?}", e))?;
    log::set_max_level(level);
    Ok(())
}

struct LoggerEx(Logger);

impl log::Log for LoggerEx {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, r: &log::Record) {
        let level = log_to_slog_level(r.metadata().level());
        let args = r.args();
        let target = r.target();
        let location = &record_as_location(r);
        let s = slog::RecordStatic { location, level, tag: target };

        self.0.log(&slog::Record::new(&s, args, b!()))
    }

    fn flush(&self) {}
}

fn log_to_slog_level(level: log::Level) -> slog::Level {
    match level {
        log::Level::Trace => slog::Level::Trace,
        log::Level::Debug => slog::Level::Debug,
        log::Level::Info => slog::Level::Info,
        log::Level::Warn => slog::Level::Warning,
        log::Level::Error => slog::Level::Error,
    }
}

fn record_as_location(r: &log::Record) -> slog::RecordLocation {
    let module = r.module_path_static().unwrap_or("<unknown>");
    let file = r.file_static().unwrap_or("<unknown>");
    let line = r.line().unwrap_or_default();

    slog::RecordLocation { file, line, column: 0, function: "", module }
}

/// Builds the root logger described by the `[log]` settings section.
///
/// Pending records are flushed when the returned guard is dropped.
pub fn config_logger(cfg: &Log) -> Result<(Logger, Option<slog_async::AsyncGuard>)> {
    if cfg.to.off() {
        return Ok((Logger::root(slog::Discard, o!()), None));
    }

    let file = if cfg.to.file() {
        let filename = cfg.filename().ok_or_else(|| anyhow!("logger file config error, file name is empty"))?;
        Some(open_file(&filename)?)
    } else {
        None
    };

    let decorator = slog_term::PlainSyncDecorator::new(WriteFilter::new(cfg.to, file));
    let drain = slog_term::FullFormat::new(decorator)
        .use_custom_timestamp(|io: &mut dyn io::Write| {
            write!(io, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        })
        .build()
        .fuse();

    let drain = slog::LevelFilter::new(drain, cfg.level.inner()).ignore_res();

    let (drain, guard) = slog_async::Async::new(drain)
        .chan_size(4096)
        .overflow_strategy(slog_async::OverflowStrategy::DropAndReport)
        .build_with_guard();

    Ok((Logger::root(drain.ignore_res(), o!()), Some(guard)))
}

struct WriteFilter {
    to: To,
    file: Option<File>,
    console: Stdout,
}

impl WriteFilter {
    fn new(to: To, file: Option<File>) -> Self {
        Self { to, file, console: io::stdout() }
    }
}

impl io::Write for WriteFilter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.to.console() {
            self.console.write_all(buf)?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.to.console() {
            self.console.flush()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_file(filename: &Path) -> Result<File> {
    if let Some(dir) = filename.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(filename).map_err(|e| {
        anyhow!("logger file config error, filename: {}, {:?}", filename.display(), e).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_logger() {
        let cfg = Log { to: To::Off, ..Default::default() };
        let (logger, guard) = config_logger(&cfg).unwrap();
        slog::info!(logger, "discarded");
        assert!(guard.is_none());
    }

    #[test]
    fn test_file_logger() {
        let dir = std::env::temp_dir().join(format!("mobile-logger-{}", uuid::Uuid::new_v4()));
        let cfg = Log {
            to: To::File,
            dir: dir.to_string_lossy().into_owned(),
            file: "test.log".into(),
            ..Default::default()
        };
        let (logger, guard) = config_logger(&cfg).unwrap();
        slog::info!(logger, "hello");
        drop(guard);
        let content = std::fs::read_to_string(dir.join("test.log")).unwrap();
        assert!(content.contains("hello"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(log_to_slog_level(log::Level::Warn), slog::Level::Warning);
        assert_eq!(log_to_slog_level(log::Level::Trace), slog::Level::Trace);
    }
}

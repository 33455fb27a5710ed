//! Process-wide logger.
//!
//! `Logger::init` installs a `tracing` subscriber once per process: a plain
//! text file layer, an optional colored console layer, and a reloadable
//! level filter. Later calls return the logger that is already installed.

use crate::error::CasicsError;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

static LOGGER: OnceLock<Logger> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

const LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub name: Option<String>,
    pub file: Option<PathBuf>,
    pub console: bool,
    pub level: String,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            name: None,
            file: None,
            console: false,
            level: "info".to_string(),
        }
    }
}

pub struct Logger {
    log_file: PathBuf,
    filter: reload::Handle<EnvFilter, Registry>,
}

impl Logger {
    pub fn init(opts: LoggerOptions) -> Result<&'static Logger, CasicsError> {
        let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(logger) = LOGGER.get() {
            return Ok(logger);
        }

        let name = opts.name.unwrap_or_else(default_name);
        let log_file = opts
            .file
            .unwrap_or_else(|| PathBuf::from(format!("{name}.log")));
        rotate_existing(&log_file)?;
        let sink = File::create(&log_file)?;

        let level = if LEVELS.contains(&opts.level.as_str()) {
            opts.level.as_str()
        } else {
            "info"
        };
        let (filter, handle) = reload::Layer::new(EnvFilter::new(level));

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(sink))
            .with_ansi(false)
            .event_format(LineFormat);
        let console_layer = opts.console.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(color_enabled())
                .event_format(LineFormat)
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()
            .map_err(|e| CasicsError::Logging(e.to_string()))?;

        Ok(LOGGER.get_or_init(|| Logger {
            log_file,
            filter: handle,
        }))
    }

    /// The logger installed by `init`, if any.
    pub fn get() -> Option<&'static Logger> {
        LOGGER.get()
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Change the active level. Unknown names are logged and ignored.
    pub fn set_level(&self, level: &str) -> Result<(), CasicsError> {
        if !LEVELS.contains(&level) {
            error!("Ignoring unrecognized level: {}", level);
            return Ok(());
        }
        self.filter
            .reload(EnvFilter::new(level))
            .map_err(|e| CasicsError::Logging(e.to_string()))?;
        info!("Logging level set to {}", level);
        Ok(())
    }

    /// Record an unrecoverable error and hand it back for the caller to return.
    pub fn fail(&self, msg: impl Into<String>) -> CasicsError {
        let msg = msg.into();
        error!("{}", msg);
        error!("Exiting.");
        CasicsError::Fatal(msg)
    }
}

/// `2012-07-20 01:19:13,042 [INFO] message`, local time.
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        write!(
            writer,
            "{} ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f")
        )?;
        if writer.has_ansi_escapes() {
            write!(writer, "[{}{}\x1b[0m] ", level_color(level), level)?;
        } else {
            write!(writer, "[{}] ", level)?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[36m",
        Level::TRACE => "\x1b[35m",
    }
}

fn default_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("log")
        .to_string()
}

/// Move an existing log aside to `<file>.old`.
fn rotate_existing(file: &Path) -> Result<(), CasicsError> {
    if file.is_file() {
        let mut old = file.as_os_str().to_owned();
        old.push(".old");
        fs::rename(file, PathBuf::from(old))?;
    }
    Ok(())
}

fn color_enabled() -> bool {
    std::env::var("TERM").map(|t| t != "dumb").unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_moves_previous_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("run.log");
        fs::write(&file, "previous run").expect("write log");

        rotate_existing(&file).expect("rotate");

        assert!(!file.exists());
        let old = dir.path().join("run.log.old");
        assert_eq!(fs::read_to_string(old).expect("read old"), "previous run");
    }

    #[test]
    fn rotate_without_previous_log_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        rotate_existing(&dir.path().join("fresh.log")).expect("rotate");
        assert!(!dir.path().join("fresh.log.old").exists());
    }

    #[test]
    fn lines_carry_time_and_bracketed_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("format.log");
        let sink = File::create(&path).expect("create log");
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(sink))
            .with_ansi(false)
            .event_format(LineFormat)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            info!("Accessing existing database \"github\"");
            tracing::warn!(count = 3, "retrying");
        });

        let contents = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        // "YYYY-MM-DD HH:MM:SS,mmm " is 24 bytes
        let (stamp, rest) = lines[0].split_at(24);
        assert!(
            chrono::NaiveDateTime::parse_from_str(stamp.trim_end(), "%Y-%m-%d %H:%M:%S,%3f")
                .is_ok(),
            "bad timestamp in {:?}",
            lines[0]
        );
        assert_eq!(rest, "[INFO] Accessing existing database \"github\"");
        assert!(lines[1].ends_with("[WARN] retrying count=3"));
    }

    #[test]
    fn init_writes_file_and_changes_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("casics-test.log");
        let logger = Logger::init(LoggerOptions {
            name: Some("casics-test".to_string()),
            file: Some(file.clone()),
            console: false,
            level: "info".to_string(),
        })
        .expect("init logger");

        assert_eq!(logger.log_file(), file.as_path());
        assert!(Logger::get().is_some());

        logger.set_level("debug").expect("set level");
        logger.set_level("verbose").expect("unknown level is ignored");
        let err = logger.fail("cannot continue");
        assert!(matches!(err, CasicsError::Fatal(ref m) if m == "cannot continue"));

        let contents = fs::read_to_string(&file).expect("read log");
        assert!(contents.contains("[INFO] Logging level set to debug"));
        assert!(contents.contains("[ERROR] Ignoring unrecognized level: verbose"));
        assert!(contents.contains("[ERROR] Exiting."));

        let again = Logger::init(LoggerOptions::default()).expect("second init");
        assert_eq!(again.log_file(), file.as_path());
    }
}

use std::{
    io::{self, IsTerminal, Write},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    EnvFilter, Layer,
};

use crate::cli::ColorChoice;

/// Compressed logs older than this many days are deleted.
const KEEP_COMPRESSED_DAYS: u64 = 7;

const SECONDS_PER_DAY: u64 = 86400;

/// Keeps the file log writer alive. Hold it until the process exits or
/// buffered lines may be lost.
pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Installs the global logger: a console layer on stderr and, when
/// `log_dir` is given, a daily rotated file layer inside it.
///
/// `log` records from this crate and its dependencies are forwarded through
/// `tracing-log`.
pub fn init_logging(
    verbosity: u8,
    color: ColorChoice,
    log_dir: Option<&Path>,
    command_name: &str,
) -> LogGuard {
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Warning: could not forward log records: {err}");
    }

    let console_filter = match verbosity {
        0 => "info",
        1 => "info,librecall=debug,dirwatch=debug",
        2 => "info,librecall=trace,dirwatch=trace",
        _ => "trace",
    };

    let console_env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_filter));

    let use_ansi = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stderr().is_terminal(),
    };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(use_ansi)
        .without_time()
        .with_target(false)
        .with_thread_names(false)
        .with_level(true)
        .with_filter(console_env_filter);

    let mut file_guard = None;

    let file_layer = log_dir.and_then(|log_dir| {
        if let Err(err) = fs_err::create_dir_all(log_dir) {
            eprintln!("Warning: could not create log directory: {err}");
            return None;
        }

        compress_old_logs(log_dir, command_name);

        let file_appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(command_name)
            .filename_suffix("log")
            .build(log_dir);

        let file_appender = match file_appender {
            Ok(appender) => appender,
            Err(err) => {
                eprintln!(
                    "Warning: could not log to {}: {err}",
                    log_dir.display()
                );
                return None;
            }
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guard = Some(guard);

        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_target(true)
            .with_thread_names(true)
            .with_level(true)
            .with_filter(EnvFilter::new("debug"));

        Some(layer)
    });

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer);

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {err}");
    }

    LogGuard {
        _file_guard: file_guard,
    }
}

/// Gzips this command's logs from before today and deletes compressed logs
/// past their retention.
fn compress_old_logs(log_dir: &Path, command_name: &str) {
    let today = days_since_epoch(SystemTime::now());

    let entries = match fs_err::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        let modified_day = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .map(days_since_epoch)
            .ok();

        if file_name.ends_with(".log.gz") {
            let expired = modified_day
                .is_some_and(|day| today.saturating_sub(day) > KEEP_COMPRESSED_DAYS);
            if expired {
                let _ = fs_err::remove_file(&path);
            }
            continue;
        }

        if !file_name.starts_with(command_name) || !file_name.ends_with(".log") {
            continue;
        }

        // The file for today is still being written to.
        if modified_day.map_or(true, |day| day >= today) {
            continue;
        }

        if let Err(err) = compress_log(&path) {
            eprintln!("Warning: could not compress {}: {err}", path.display());
        }
    }
}

fn compress_log(path: &Path) -> io::Result<()> {
    let gz_path = path.with_extension("log.gz");
    let input = fs_err::read(path)?;

    let written = fs_err::File::create(&gz_path).and_then(|gz_file| {
        let mut encoder = flate2::write::GzEncoder::new(gz_file, flate2::Compression::default());
        encoder.write_all(&input)?;
        encoder.finish()?;
        Ok(())
    });

    match written {
        Ok(()) => fs_err::remove_file(path),
        Err(err) => {
            let _ = fs_err::remove_file(&gz_path);
            Err(err)
        }
    }
}

fn days_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs() / SECONDS_PER_DAY)
        .unwrap_or(0)
}

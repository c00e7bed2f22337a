use std::fs;
use std::path::Path;

use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, Output};
use log::LevelFilter;

const LOG_FILE: &str = "simulation.log";

/// Dependencies that only log at warn and above.
const QUIET_TARGETS: [&str; 2] = ["serde", "csv"];

/// Initializes the global logger.
///
/// Should be called once by the process driving the simulation, before the first
/// network is built. Output goes to stderr (coloured) and to `<log_dir>/simulation.log`.
/// A second call only reports the failure to replace the logger on stderr.
pub fn init(log_dir: &str, level: LevelFilter) {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create log directory at '{}': {}", log_dir, e);
    }

    let log_file_path = Path::new(log_dir).join(LOG_FILE);

    let console_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let root = QUIET_TARGETS.iter().fold(Dispatch::new().level(level), |dispatch, target| dispatch.level_for(*target, LevelFilter::Warn));

    let applied = root
        .chain(sink(Some(console_colors)).chain(std::io::stderr()))
        .chain(sink(None).chain(file_output(&log_file_path)))
        .apply();

    if let Err(e) = applied {
        eprintln!("Failed to apply logger configuration: {}", e);
    }

    log::info!("Logger initialized. Logging to console and '{}'.", log_file_path.display());
}

/// One `[time level target] message` line; the level is coloured when a colour table is given.
fn sink(colors: Option<ColoredLevelConfig>) -> Dispatch {
    Dispatch::new().format(move |out, message, record| {
        let level = match colors {
            Some(colors) => colors.color(record.level()).to_string(),
            None => record.level().to_string(),
        };

        out.finish(format_args!("[{} {} {}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), level, record.target(), message))
    })
}

/// Falls back to stderr if the file cannot be opened.
fn file_output(path: &Path) -> Output {
    match fern::log_file(path) {
        Ok(file) => file.into(),
        Err(e) => {
            eprintln!("Failed to open log file '{}': {}", path.display(), e);
            std::io::stderr().into()
        }
    }
}

//! Logger initialization (console + optional file)

use anyhow::Result;
use simplelog::*;
use std::fs::OpenOptions;

/// Initialize logger for console output and, when a path is given, a log file
///
/// # Arguments
/// * `log_file_path` - Optional path to the log file (appended to, created if missing)
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to open the log file or a logger is already set
pub fn init_logger(log_file_path: Option<&str>) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file_path {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path, e))?;
        loggers.push(WriteLogger::new(LevelFilter::Info, Config::default(), log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

use std::fs::File;

use anyhow::Context;
use time::{
    format_description::{self, parse},
    OffsetDateTime,
};
use tracing::{dispatcher, subscriber::set_global_default, Level};
use tracing_subscriber::{
    fmt::{time::OffsetTime, writer::BoxMakeWriter},
    FmtSubscriber,
};

/// Installs the global tracing subscriber.
///
/// With `to_file`, events are written (without colors) to `<timestamp>_league_log.txt` in the
/// working directory, otherwise to stderr.
pub fn init_logger(to_file: bool, max_level: Level) -> anyhow::Result<()> {
    let writer = if to_file {
        let file_name = get_log_file_name()?;
        let file = File::create(&file_name)
            .with_context(|| format!("could not create log file {file_name}"))?;
        BoxMakeWriter::new(file)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(
        local_offset,
        format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
            .context("invalid timer format")?,
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber).context(
        "could not set global default tracing subscriber, one is probably already installed",
    )
}

/// Like [`init_logger`], but keeps a global subscriber that is already installed.
///
/// Returns `false` when nothing was installed.
pub fn init_logger_once(to_file: bool, max_level: Level) -> anyhow::Result<bool> {
    if dispatcher::has_been_set() {
        return Ok(false);
    }
    match init_logger(to_file, max_level) {
        Ok(()) => Ok(true),
        // lost a race against another installer
        Err(_) if dispatcher::has_been_set() => Ok(false),
        Err(e) => Err(e),
    }
}

fn get_log_file_name() -> anyhow::Result<String> {
    let format = parse("[year]-[month]-[day]_[hour]-[minute]-[second]_league_log.txt")
        .context("invalid log file name format")?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).context("could not format log file name")
}

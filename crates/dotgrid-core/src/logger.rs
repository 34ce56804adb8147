//! Stderr logging for the `log` facade.
//!
//! Each record becomes one line, `+   12.345ms DEBUG marker: message`. The
//! elapsed time is in milliseconds since the logger was installed, so per-frame
//! stage timings can be read straight off the log. The `dotgrid_` crate prefix
//! and module path are dropped from the target.

use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Workspace crates at `info`, everything else at `warn`.
#[cfg(feature = "tracing")]
const DEFAULT_FILTER: &str = "warn,dotgrid=info,dotgrid_core=info,dotgrid_marker=info";

struct FrameLogger {
    level: LevelFilter,
    started: Instant,
}

/// `dotgrid_marker::grid` -> `marker`, `dotgrid` -> `dotgrid`.
fn short_target(target: &str) -> &str {
    let krate = target.split("::").next().unwrap_or(target);
    krate
        .strip_prefix("dotgrid_")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(krate)
}

fn format_line(elapsed_ms: f64, level: Level, target: &str, args: &Arguments<'_>) -> String {
    format!(
        "+{:>10.3}ms {:<5} {}: {}",
        elapsed_ms,
        level,
        short_target(target),
        args
    )
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1e3;
        let line = format_line(elapsed_ms, record.level(), record.target(), record.args());
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<FrameLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| FrameLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Route `log` records and pipeline spans through `tracing-subscriber`.
///
/// `RUST_LOG` overrides the default filter, which keeps the dotgrid crates at
/// `info` and everything else at `warn`. Closing a span prints its busy time,
/// so `detect`, `classify_frame` and `infer_grid` report their cost per frame.
/// With `json`, every event is one flat JSON object per line.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .with_target(false)
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_lose_crate_prefix_and_path() {
        assert_eq!(short_target("dotgrid_marker::detector::pipeline"), "marker");
        assert_eq!(short_target("dotgrid_core"), "core");
        assert_eq!(short_target("dotgrid"), "dotgrid");
        assert_eq!(short_target("image::codecs"), "image");
    }

    #[test]
    fn line_layout() {
        let line = format_line(
            12.3456,
            Level::Debug,
            "dotgrid_marker::grid",
            &format_args!("3 markers"),
        );
        assert_eq!(line, "+    12.346ms DEBUG marker: 3 markers");
    }
}

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

/// Route `tracing` output to a daily-rolling file under `dir` so it never mixes with command output.
///
/// The filter comes from `YD_LOG` (e.g. `YD_LOG=yd=debug`) and defaults to `info`.
/// Keep the returned guard alive for the whole run, or buffered lines are lost.
pub fn init(dir: &Path) -> WorkerGuard {
  let appender = tracing_appender::rolling::daily(dir, "yd.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("YD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  guard
}

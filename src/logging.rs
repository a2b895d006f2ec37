use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{Compact, Format, Full, Pretty, Writer};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{Logging, LoggingStyle};

#[derive(Debug, Error)]
#[error("Could not initialize logging")]
pub struct InitError;

const DEFAULT_TARGETS: &str = "info";

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `logging.targets` when both are set.
pub fn init(cfg: &Logging) -> Result<(), InitError> {
  let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
    Ok(directives) => EnvFilter::try_new(directives),
    Err(..) => EnvFilter::try_new(cfg.targets.as_deref().unwrap_or(DEFAULT_TARGETS)),
  }
  .change_context(InitError)
  .attach_printable("invalid logging targets")?;

  let ansi = std::env::var_os("NO_COLOR").is_none();
  let format_layer = match Formatter::from_style(cfg.style, ansi) {
    Some(formatter) => fmt::layer().event_format(formatter).boxed(),
    None => fmt::layer().json().with_current_span(true).boxed(),
  };

  tracing_subscriber::registry()
    .with(format_layer.with_filter(filter))
    .with(tracing_error::ErrorLayer::default())
    .try_init()
    .change_context(InitError)
}

enum Formatter {
  Full(Format<Full, ChronoUtc>),
  Pretty(Format<Pretty, ChronoUtc>),
  Compact(Format<Compact, ChronoUtc>),
}

impl Formatter {
  fn from_style(style: LoggingStyle, ansi: bool) -> Option<Self> {
    let default = fmt::format().with_timer(ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string()));
    match style {
      LoggingStyle::Compact => Some(Self::Compact(default.compact().with_ansi(ansi))),
      LoggingStyle::Full => Some(Self::Full(default.with_ansi(ansi))),
      LoggingStyle::Pretty => Some(Self::Pretty(default.pretty().with_ansi(ansi))),
      LoggingStyle::JSON => None,
    }
  }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
  S: Subscriber + for<'a> LookupSpan<'a>,
  N: for<'a> FormatFields<'a> + 'static,
{
  fn format_event(
    &self,
    ctx: &FmtContext<'_, S, N>,
    writer: Writer<'_>,
    event: &Event<'_>,
  ) -> std::fmt::Result {
    match self {
      Formatter::Full(fmt) => fmt.format_event(ctx, writer, event),
      Formatter::Pretty(fmt) => fmt.format_event(ctx, writer, event),
      Formatter::Compact(fmt) => fmt.format_event(ctx, writer, event),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_has_no_custom_formatter() {
    assert!(Formatter::from_style(LoggingStyle::JSON, false).is_none());
    assert!(Formatter::from_style(LoggingStyle::Pretty, false).is_some());
  }
}

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::Layer, registry::LookupSpan};

use crate::logging::config::{LogFormat, LoggingConfig};

/// Файловый слой с ежедневной ротацией. `WorkerGuard` должен жить, пока
/// нужен вывод: при его drop буфер сбрасывается на диск.
pub fn layer_with_config<S>(config: &LoggingConfig) -> (Box<dyn Layer<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = rolling::daily(&config.log_dir, &config.file_name);
    let (writer, guard) = non_blocking(appender);

    let base = fmt::layer().with_ansi(false).with_writer(writer);
    let layer: Box<dyn Layer<S> + Send + Sync> = match config.format {
        LogFormat::Json => Box::new(base.json()),
        LogFormat::Pretty | LogFormat::Compact => Box::new(base.with_target(true)),
    };
    (layer, guard)
}
